//! Repository list loading.
//!
//! The list is a plain text file with one `owner/name` or
//! `https://github.com/owner/name` per line.

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use thiserror::Error;

const GITHUB_URL_PREFIX: &str = "https://github.com/";

fn repo_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s/]+/[^\s/]+$").expect("valid repo regex"))
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("\"{0}\" does not match owner/repo")]
pub struct InvalidRepo(pub String);

/// A validated `owner/name` repository identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoId(String);

impl RepoId {
    /// Normalize one line of the repository list and validate it
    pub fn parse(line: &str) -> Result<Self, InvalidRepo> {
        let trimmed = line.trim();
        let candidate = trimmed.strip_prefix(GITHUB_URL_PREFIX).unwrap_or(trimmed);

        if repo_pattern().is_match(candidate) {
            Ok(RepoId(candidate.to_string()))
        } else {
            Err(InvalidRepo(candidate.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn owner(&self) -> &str {
        self.split().0
    }

    pub fn name(&self) -> &str {
        self.split().1
    }

    fn split(&self) -> (&str, &str) {
        // Validated on construction
        self.0.split_once('/').unwrap_or((self.0.as_str(), ""))
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse every line of a repository list, skipping (and logging) invalid ones
pub fn parse_repo_list(content: &str) -> Vec<RepoId> {
    content
        .lines()
        .filter_map(|line| match RepoId::parse(line) {
            Ok(repo) => Some(repo),
            Err(e) => {
                tracing::warn!(line = %line, "{e}");
                None
            }
        })
        .collect()
}

/// Read and parse the repository list file
pub fn load_repo_list(path: &Path) -> Result<Vec<RepoId>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read repository list: {path:?}"))?;
    Ok(parse_repo_list(&content))
}
