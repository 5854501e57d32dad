//! Data models for accumulated repository traffic.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::merge::{merge_records, MergeStats};
use crate::repos::RepoId;

/// Traffic category reported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Views,
    Clones,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Views, Metric::Clones];

    /// JSON key used both in API responses and in the state file
    pub fn key(self) -> &'static str {
        match self {
            Metric::Views => "views",
            Metric::Clones => "clones",
        }
    }

    /// Path segment below `/repos/{owner}/{name}/`
    pub fn endpoint(self) -> &'static str {
        match self {
            Metric::Views => "traffic/views",
            Metric::Clones => "traffic/clones",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// One day of traffic for a repository and metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficRecord {
    pub timestamp: String,
    pub count: u64,
    pub uniques: u64,
}

impl TrafficRecord {
    #[allow(dead_code)] // Used in tests
    pub fn new(timestamp: impl Into<String>, count: u64, uniques: u64) -> Self {
        TrafficRecord {
            timestamp: timestamp.into(),
            count,
            uniques,
        }
    }
}

/// Accumulated history for a single repository.
///
/// Each sequence holds at most one record per timestamp, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoTraffic {
    #[serde(default)]
    pub views: Vec<TrafficRecord>,
    #[serde(default)]
    pub clones: Vec<TrafficRecord>,
}

impl RepoTraffic {
    #[allow(dead_code)] // Used in tests
    pub fn records(&self, metric: Metric) -> &[TrafficRecord] {
        match metric {
            Metric::Views => &self.views,
            Metric::Clones => &self.clones,
        }
    }

    pub fn records_mut(&mut self, metric: Metric) -> &mut Vec<TrafficRecord> {
        match metric {
            Metric::Views => &mut self.views,
            Metric::Clones => &mut self.clones,
        }
    }
}

/// All accumulated traffic, keyed by `owner/name`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Store {
    repos: BTreeMap<String, RepoTraffic>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    #[allow(dead_code)] // Used in tests
    pub fn get(&self, repo: &RepoId) -> Option<&RepoTraffic> {
        self.repos.get(repo.as_str())
    }

    /// Get the history for a repository, creating an empty one if it is new
    pub fn entry(&mut self, repo: &RepoId) -> &mut RepoTraffic {
        self.repos.entry(repo.as_str().to_string()).or_default()
    }

    /// Merge freshly fetched records into the history of one repository and metric
    pub fn merge(
        &mut self,
        repo: &RepoId,
        metric: Metric,
        incoming: Vec<TrafficRecord>,
    ) -> MergeStats {
        merge_records(self.entry(repo).records_mut(metric), incoming)
    }
}

/// Response body of the traffic endpoints.
///
/// The record array is keyed `views` or `clones` depending on the endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TrafficSummary {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub uniques: u64,
    #[serde(alias = "views", alias = "clones")]
    pub records: Vec<TrafficRecord>,
}
