//! Main application logic: load, fetch, merge, save.

use anyhow::{Context, Result};

use crate::cli::AppConfig;
use crate::data::{MergeStats, Metric, StateFile, Store};
use crate::github::{FetchError, GithubClient, TrafficSource};
use crate::repos::{self, RepoId};

/// Totals for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub repos: usize,
    pub failed_requests: usize,
    pub merged: MergeStats,
}

/// Run one polling pass with the given configuration
pub fn run(config: AppConfig) -> Result<()> {
    let repos = repos::load_repo_list(&config.repos_path)?;

    let state = StateFile::new(config.state_path.clone());
    let mut store = state
        .load()
        .context("Refusing to continue without the existing traffic history")?;

    tracing::info!(
        repos = repos.len(),
        known = store.len(),
        state = %state.path().display(),
        "starting traffic poll"
    );

    let client = GithubClient::new(
        &config.api_url,
        config.token.clone(),
        config.timeout,
        config.retry.clone(),
    )
    .context("Failed to build HTTP client")?;

    let summary = collect(&mut store, &repos, &client);

    state
        .save(&store)
        .with_context(|| format!("Failed to save traffic history to {:?}", state.path()))?;

    tracing::info!(
        repos = summary.repos,
        failed_requests = summary.failed_requests,
        added = summary.merged.added,
        updated = summary.merged.updated,
        "traffic poll finished"
    );

    Ok(())
}

/// Fetch and merge traffic for every repository into `store`
pub fn collect(store: &mut Store, repos: &[RepoId], source: &impl TrafficSource) -> RunSummary {
    let mut summary = RunSummary::default();

    for repo in repos {
        summary.repos += 1;
        store.entry(repo);

        for metric in Metric::ALL {
            match update_metric(store, repo, metric, source) {
                Ok(stats) => summary.merged += stats,
                Err(_) => summary.failed_requests += 1,
            }
        }
    }

    summary
}

/// Fetch one metric for one repository and merge it, logging the outcome
fn update_metric(
    store: &mut Store,
    repo: &RepoId,
    metric: Metric,
    source: &impl TrafficSource,
) -> Result<MergeStats, FetchError> {
    match source.fetch(repo, metric) {
        Ok(records) => {
            tracing::info!(repo = %repo, endpoint = %metric, "OK");
            let stats = store.merge(repo, metric, records);
            tracing::debug!(
                repo = %repo,
                endpoint = %metric,
                added = stats.added,
                updated = stats.updated,
                "merged"
            );
            Ok(stats)
        }
        Err(e) => {
            match e.status() {
                Some(status) => tracing::warn!(repo = %repo, endpoint = %metric, status, "{e}"),
                None => tracing::warn!(repo = %repo, endpoint = %metric, "{e}"),
            }
            Err(e)
        }
    }
}
