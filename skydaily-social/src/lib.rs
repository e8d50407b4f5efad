//! Social network clients used to publish the daily summary.
//!
//! Only Bluesky is implemented. Callers depend on [`SocialPoster`] so tests
//! can substitute a fake transport.
use async_trait::async_trait;
use skydaily_common::Result;

pub mod bluesky;

pub use bluesky::{BlueskyClient, BlueskyCredentials};

/// Identifiers of a created post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReceipt {
    pub uri: String,
    pub cid: String,
}

#[async_trait]
pub trait SocialPoster: Send + Sync {
    /// Authenticate and publish one plain-text post.
    ///
    /// Missing or rejected credentials are `SkydailyError::Auth`; anything
    /// that goes wrong after that is `SkydailyError::Post`.
    async fn post(&self, text: &str) -> Result<PostReceipt>;

    /// Account the posts are attributed to, for logs.
    fn account(&self) -> &str;
}
