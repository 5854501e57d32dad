//! gh-traffic: accumulates GitHub repository traffic beyond the 14-day window.
//!
//! GitHub only keeps two weeks of view and clone statistics. Running this
//! periodically (cron, CI schedule) merges each fetch into a local JSON file,
//! building up the full history over time.

mod app;
mod cli;
mod data;
mod github;
mod repos;
#[cfg(test)]
mod testing;

use anyhow::Result;
use cli::{AppConfig, Cli};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "gh_traffic=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = AppConfig::from_cli(cli);
    app::run(config)
}
