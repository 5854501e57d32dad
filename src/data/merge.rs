//! Timestamp-keyed merging of traffic records.
//!
//! The API only returns the last 14 days, so every run overlaps with data
//! already on disk. Merging overwrites counts for known days and appends new
//! ones, which makes repeated runs idempotent.

use super::models::TrafficRecord;

/// What a merge changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Existing records whose counts were overwritten
    pub updated: usize,
    /// Records appended because their timestamp was new
    pub added: usize,
}

impl std::ops::AddAssign for MergeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.updated += rhs.updated;
        self.added += rhs.added;
    }
}

/// Merge `incoming` into `existing`, keyed by timestamp.
///
/// Matching records keep their position and take the incoming `count` and
/// `uniques`. Unknown timestamps are appended in arrival order; nothing is
/// re-sorted.
pub fn merge_records(existing: &mut Vec<TrafficRecord>, incoming: Vec<TrafficRecord>) -> MergeStats {
    let mut stats = MergeStats::default();

    for record in incoming {
        match existing.iter_mut().find(|r| r.timestamp == record.timestamp) {
            Some(known) => {
                known.count = record.count;
                known.uniques = record.uniques;
                stats.updated += 1;
            }
            None => {
                existing.push(record);
                stats.added += 1;
            }
        }
    }

    stats
}
