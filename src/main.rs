//! CLI entry point for depcite.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use depcite_core::{CiteConfig, ConsoleSink, Pipeline, SystemClock, load_default_file_config};
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_level()));

    // stdout carries BibTeX only
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(input = %args.target, jobs = ?args.jobs, "CLI arguments parsed");

    let mut config = CiteConfig::default();
    let loaded = load_default_file_config()?;
    if let Some(file_config) = &loaded.config {
        debug!(path = ?loaded.path, "applying config file");
        file_config.apply_to(&mut config);
    }
    args.apply_to(&mut config);
    debug!(?config, "resolved configuration");

    let pipeline = Pipeline::from_config(&config, Arc::new(SystemClock))?;
    let mut sink = ConsoleSink::stdio();
    let summary = pipeline.run(&args.target, &mut sink).await?;

    info!(
        cited = summary.cited,
        unresolved = summary.unresolved,
        manifests_failed = summary.manifests_failed,
        "depcite finished"
    );
    Ok(())
}
