//! Command-line interface argument parsing for gh-traffic.
//!
//! - `gh-traffic --token "$TOKEN" --repos repos.txt`
//! - `gh-traffic --token "$TOKEN" --repos repos.txt --state /var/lib/traffic.json`
//! - `gh-traffic --token "$TOKEN" --repos repos.txt --respect-rate-limit`

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::github::{RetryPolicy, DEFAULT_API_URL};

/// Name of the state file when no path is given
pub const STATE_FILE_NAME: &str = "traffic.json";

/// Environment variable overriding the default state file location
pub const STATE_ENV_VAR: &str = "GH_TRAFFIC_STATE";

/// Accumulate GitHub repository traffic beyond the 14-day API window.
///
/// Fetches daily views and clones for every repository in the list and merges
/// them into a local JSON history. Meant to be run periodically.
#[derive(Parser, Debug)]
#[command(name = "gh-traffic")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// GitHub token with push access to the listed repositories
    #[arg(long)]
    pub token: String,

    /// Path to a text file containing owner/repo lines
    #[arg(long)]
    pub repos: PathBuf,

    /// Path to the traffic history JSON file
    /// Defaults to $GH_TRAFFIC_STATE, then traffic.json next to the executable
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Base URL of the GitHub REST API
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// How many times a failed request is retried
    #[arg(long, default_value = "3")]
    pub max_retries: u32,

    /// Wait as long as GitHub's rate-limit headers ask before retrying
    #[arg(long)]
    pub respect_rate_limit: bool,

    /// Longest rate-limit wait in seconds that is honored before giving up
    #[arg(long, default_value = "300")]
    pub max_rate_limit_wait: u64,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub token: String,
    pub repos_path: PathBuf,
    pub state_path: PathBuf,
    pub api_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl AppConfig {
    /// Create AppConfig from parsed CLI arguments
    pub fn from_cli(cli: Cli) -> Self {
        let state_path = cli.state.unwrap_or_else(|| {
            // Environment first, then alongside the executable
            if let Some(path) = std::env::var_os(STATE_ENV_VAR).filter(|p| !p.is_empty()) {
                PathBuf::from(path)
            } else {
                default_state_dir().join(STATE_FILE_NAME)
            }
        });

        AppConfig {
            token: cli.token,
            repos_path: cli.repos,
            state_path,
            api_url: cli.api_url,
            timeout: Duration::from_secs(cli.timeout),
            retry: RetryPolicy {
                max_retries: cli.max_retries,
                respect_rate_limit: cli.respect_rate_limit,
                max_rate_limit_wait: Duration::from_secs(cli.max_rate_limit_wait),
                ..RetryPolicy::default()
            },
        }
    }
}

/// Directory containing the running executable, or the working directory
fn default_state_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.canonicalize().ok())
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}
