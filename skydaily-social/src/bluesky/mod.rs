//! Bluesky (AT Protocol) publishing over XRPC.
//!
//! A run creates a session with the handle and app password, then writes a
//! single `app.bsky.feed.post` record to the account's repo.
pub mod client;
pub mod types;

pub use client::{BlueskyClient, BlueskyCredentials, MAX_POST_CHARS};
