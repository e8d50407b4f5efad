use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use serde_json::Value;
use skydaily_common::{Result, SkydailyError};
use skydaily_http::{HttpClient, RequestOpts};
use std::time::Duration;

/// One GET against the stats endpoint, no retries.
#[derive(Clone)]
pub struct StatsFetcher {
    http: HttpClient,
    url: String,
}

impl StatsFetcher {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let http = HttpClient::new(url)
            .map_err(|e| SkydailyError::Config(format!("stats url {url:?}: {e}")))?
            .with_timeout(timeout);
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> Result<Snapshot> {
        self.fetch_at(Utc::now()).await
    }

    /// Fetch with an explicit wall-clock time, used when the document has no
    /// usable `last_update_time`.
    pub async fn fetch_at(&self, now: DateTime<Utc>) -> Result<Snapshot> {
        let body: Value = self
            .http
            .get_json("", RequestOpts::default())
            .await
            .map_err(|e| SkydailyError::Fetch(e.to_string()))?;

        let snapshot = Snapshot::from_document(body, now)
            .map_err(|e| SkydailyError::Fetch(format!("invalid stats document: {e}")))?;

        tracing::info!(
            url=%self.url,
            users=snapshot.users(),
            likes=snapshot.likes(),
            captured_at=%snapshot.captured_at(),
            "stats.fetched"
        );
        Ok(snapshot)
    }
}
