use crate::publish::{Publication, Publisher};
use chrono::{DateTime, Utc};
use skydaily_common::Result;
use skydaily_config::SkydailyConfig;
use skydaily_social::{BlueskyClient, BlueskyCredentials, SocialPoster};
use skydaily_stats::{ArchiveOutcome, Archiver, Delta, StatsFetcher, compute_delta};
use std::time::Duration;

pub struct Pipeline<P> {
    fetcher: StatsFetcher,
    archiver: Archiver,
    publisher: Publisher<P>,
}

#[derive(Debug)]
pub struct RunReport {
    pub archive: ArchiveOutcome,
    pub delta: Option<Delta>,
    pub publication: Publication,
}

/// Wire the stages from configuration. Publishing is left out entirely when
/// disabled; missing credentials only surface when a post is attempted.
pub fn from_config(cfg: &SkydailyConfig) -> Result<Pipeline<BlueskyClient>> {
    let timeout = Duration::from_secs(cfg.source.timeout_secs);
    let fetcher = StatsFetcher::new(&cfg.source.url, timeout)?;
    let archiver = Archiver::new(&cfg.archive.root);

    let poster = if cfg.publish.enabled {
        let credentials = BlueskyCredentials::from_parts(
            cfg.publish.handle.clone(),
            cfg.publish.app_password.clone(),
        );
        Some(BlueskyClient::new(&cfg.publish.service, credentials, timeout)?)
    } else {
        None
    };

    Ok(Pipeline::new(
        fetcher,
        archiver,
        Publisher::new(poster, cfg.source.url.clone()),
    ))
}

impl<P: SocialPoster> Pipeline<P> {
    pub fn new(fetcher: StatsFetcher, archiver: Archiver, publisher: Publisher<P>) -> Self {
        Self {
            fetcher,
            archiver,
            publisher,
        }
    }

    /// Fetch, archive, diff, publish.
    ///
    /// Fetch and archive failures are returned; by the time publishing runs
    /// the archive entry is on disk, and its outcome only lands in the report.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport> {
        let snapshot = self.fetcher.fetch_at(now).await?;
        let archive = self.archiver.archive(&snapshot, now.date_naive())?;

        let previous = self.archiver.load_previous(&archive);
        let delta = compute_delta(&snapshot, previous.as_ref());
        if let Some(d) = &delta {
            tracing::info!(
                users=d.users,
                likes=d.likes,
                elapsed_secs=d.elapsed_secs,
                growth_rate=?d.growth_rate,
                "delta.computed"
            );
        }

        let publication = self.publisher.publish(now, &snapshot, delta.as_ref()).await;

        Ok(RunReport {
            archive,
            delta,
            publication,
        })
    }
}
