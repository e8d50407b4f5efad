use chrono::{DateTime, Utc};
use skydaily_common::SkydailyError;
use skydaily_social::{PostReceipt, SocialPoster};
use skydaily_stats::{Delta, Snapshot, compose_summary};

/// Outcome of the publishing stage. Never fatal to the run.
#[derive(Debug)]
pub enum PostResult {
    Posted(PostReceipt),
    /// Publishing disabled (`--dry-run` or `publish.enabled: false`).
    Skipped,
    Failed(SkydailyError),
}

#[derive(Debug)]
pub struct Publication {
    pub text: String,
    pub result: PostResult,
}

pub struct Publisher<P> {
    poster: Option<P>,
    source_url: String,
}

impl<P: SocialPoster> Publisher<P> {
    pub fn new(poster: Option<P>, source_url: impl Into<String>) -> Self {
        Self {
            poster,
            source_url: source_url.into(),
        }
    }

    /// Format the summary and post it. Errors are captured in the result.
    pub async fn publish(
        &self,
        now: DateTime<Utc>,
        snapshot: &Snapshot,
        delta: Option<&Delta>,
    ) -> Publication {
        let text = compose_summary(now, snapshot, delta, &self.source_url);

        let result = match &self.poster {
            None => {
                tracing::info!("publish.skipped");
                PostResult::Skipped
            }
            Some(poster) => match poster.post(&text).await {
                Ok(receipt) => PostResult::Posted(receipt),
                Err(e) => {
                    tracing::warn!(account=%poster.account(), error=%e, "publish.failed");
                    PostResult::Failed(e)
                }
            },
        };

        Publication { text, result }
    }
}
