//! Common types and utilities shared across skydaily crates.
//!
//! This crate defines the error taxonomy for a daily run and the tracing
//! initialisation used by the binary and the integration tests. It stays
//! small so every other crate can depend on it.
//!
//! # Overview
//!
//! - [`SkydailyError`] and [`Result`]: shared error handling
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! Deciding whether a failure should abort the run:
//!
//! ```rust
//! use skydaily_common::SkydailyError;
//!
//! let err = SkydailyError::Post("rate limited".into());
//! assert!(!err.is_fatal());
//! assert!(SkydailyError::Fetch("connection refused".into()).is_fatal());
//! ```
use std::path::PathBuf;

pub mod observability;

/// Error types used across a skydaily run.
///
/// Fetch, write and configuration failures abort the run. Everything the
/// publishing stage produces is isolated to that stage.
#[derive(thiserror::Error, Debug)]
pub enum SkydailyError {
    /// The stats endpoint could not be reached, answered with a non-success
    /// status, or returned a body that is not a usable stats document.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The archive entry could not be written.
    #[error("archive write failed for {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An existing archive entry could not be read back.
    #[error("archive read failed for {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    /// Credentials were missing or rejected by the social network.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The social network refused the post, or the request never made it.
    #[error("post failed: {0}")]
    Post(String),

    /// Configuration was incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SkydailyError {
    /// Whether this error must end the run with a non-zero exit status.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Fetch(_) | Self::Write { .. } | Self::Config(_) => true,
            Self::Read { .. } | Self::Auth(_) | Self::Post(_) => false,
        }
    }
}

/// Convenient alias for results that use [`SkydailyError`].
pub type Result<T> = std::result::Result<T, SkydailyError>;
