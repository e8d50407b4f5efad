use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use publish::PostResult;
use skydaily_common::observability::{LogConfig, init_logging};
use skydaily_config::SkydailyConfigLoader;
use std::path::PathBuf;

mod pipeline;
mod publish;

const DEFAULT_CONFIG_FILE: &str = "skydaily.yaml";

/// Archive today's Bluesky stats snapshot and post a summary.
#[derive(Debug, Parser)]
#[command(name = "skydaily", version)]
struct Cli {
    /// Configuration file; `skydaily.yaml` is used when present.
    #[arg(long, env = "SKYDAILY_CONFIG")]
    config: Option<PathBuf>,

    /// Archive root, overriding `archive.root`.
    #[arg(long, env = "SKYDAILY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Fetch and archive, but do not post.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LogConfig::default())?;

    let loader = match &cli.config {
        Some(path) => SkydailyConfigLoader::new().with_file(path),
        None => SkydailyConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let mut cfg = loader.load().context("loading configuration")?;
    if let Some(dir) = cli.data_dir {
        cfg.archive.root = dir;
    }
    if cli.dry_run {
        cfg.publish.enabled = false;
    }

    let pipeline = pipeline::from_config(&cfg)?;
    let report = pipeline.run(Utc::now()).await.inspect_err(|e| {
        tracing::error!(error=%e, "run.aborted");
    })?;

    println!("{}", report.publication.text);
    tracing::info!(
        path=%report.archive.entry.path.display(),
        is_new_day=report.archive.is_new_day,
        has_delta=report.delta.is_some(),
        "run.archived"
    );

    match &report.publication.result {
        PostResult::Posted(receipt) => tracing::info!(uri=%receipt.uri, "run.completed"),
        PostResult::Skipped => tracing::info!("run.completed.without_post"),
        // The archive is committed; a failed post does not fail the run.
        PostResult::Failed(e) => tracing::warn!(error=%e, "run.completed.post_failed"),
    }
    Ok(())
}
