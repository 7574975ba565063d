use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

/// A calendar date used as the time axis of aggregation.
///
/// Holds the day itself in daily mode and the first day of the month in
/// monthly mode.
pub type BucketKey = NaiveDate;

/// Behavior category counted per (user, bucket).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorTag {
    /// Every dated, in-window line.
    TotalRecords,
    /// Code insertion accepted from the primary assistant.
    PrimaryToolCodeAction,
    /// Model selection / question asked to the primary assistant.
    PrimaryToolQueryAction,
    /// Completions endpoint hit by the secondary assistant.
    SecondaryToolCodeAction,
    /// Chat completions endpoint hit by the secondary assistant.
    SecondaryToolQueryAction,
}

impl BehaviorTag {
    /// All tags in report column order.
    pub const ALL: [BehaviorTag; 5] = [
        BehaviorTag::TotalRecords,
        BehaviorTag::PrimaryToolCodeAction,
        BehaviorTag::PrimaryToolQueryAction,
        BehaviorTag::SecondaryToolCodeAction,
        BehaviorTag::SecondaryToolQueryAction,
    ];

    /// Canonical snake_case name, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorTag::TotalRecords => "total_records",
            BehaviorTag::PrimaryToolCodeAction => "primary_tool_code_action",
            BehaviorTag::PrimaryToolQueryAction => "primary_tool_query_action",
            BehaviorTag::SecondaryToolCodeAction => "secondary_tool_code_action",
            BehaviorTag::SecondaryToolQueryAction => "secondary_tool_query_action",
        }
    }
}

impl fmt::Display for BehaviorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── DailyStats ────────────────────────────────────────────────────────────────

/// Counters for one (user, bucket) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    /// Dated lines inside the window.
    #[serde(default)]
    pub total_records: u64,
    /// Primary assistant code actions.
    #[serde(default)]
    pub primary_code_actions: u64,
    /// Primary assistant queries.
    #[serde(default)]
    pub primary_query_actions: u64,
    /// Secondary assistant code actions.
    #[serde(default)]
    pub secondary_code_actions: u64,
    /// Secondary assistant queries (raw, not normalized).
    #[serde(default)]
    pub secondary_query_actions: u64,
}

impl DailyStats {
    /// Add one to the counter backing `tag`.
    pub fn increment(&mut self, tag: BehaviorTag) {
        *self.counter_mut(tag) += 1;
    }

    /// Current value of the counter backing `tag`.
    pub fn get(&self, tag: BehaviorTag) -> u64 {
        match tag {
            BehaviorTag::TotalRecords => self.total_records,
            BehaviorTag::PrimaryToolCodeAction => self.primary_code_actions,
            BehaviorTag::PrimaryToolQueryAction => self.primary_query_actions,
            BehaviorTag::SecondaryToolCodeAction => self.secondary_code_actions,
            BehaviorTag::SecondaryToolQueryAction => self.secondary_query_actions,
        }
    }

    /// Primary assistant code actions plus queries.
    pub fn primary_total(&self) -> u64 {
        self.primary_code_actions + self.primary_query_actions
    }

    /// `true` when every counter is zero.
    pub fn is_empty(&self) -> bool {
        BehaviorTag::ALL.iter().all(|tag| self.get(*tag) == 0)
    }

    /// Add every counter of `other` into `self`.
    pub fn merge(&mut self, other: &DailyStats) {
        for tag in BehaviorTag::ALL {
            *self.counter_mut(tag) += other.get(tag);
        }
    }

    fn counter_mut(&mut self, tag: BehaviorTag) -> &mut u64 {
        match tag {
            BehaviorTag::TotalRecords => &mut self.total_records,
            BehaviorTag::PrimaryToolCodeAction => &mut self.primary_code_actions,
            BehaviorTag::PrimaryToolQueryAction => &mut self.primary_query_actions,
            BehaviorTag::SecondaryToolCodeAction => &mut self.secondary_code_actions,
            BehaviorTag::SecondaryToolQueryAction => &mut self.secondary_query_actions,
        }
    }
}

// ── UserStats ─────────────────────────────────────────────────────────────────

/// Per-bucket counters for one user, merged across all of their log files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    buckets: BTreeMap<BucketKey, DailyStats>,
}

impl UserStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters for `bucket`, created on first touch.
    pub fn record(&mut self, bucket: BucketKey) -> &mut DailyStats {
        self.buckets.entry(bucket).or_default()
    }

    /// Counters for `bucket`, or all zeros when nothing was recorded.
    pub fn stats_or_default(&self, bucket: &BucketKey) -> DailyStats {
        self.buckets.get(bucket).copied().unwrap_or_default()
    }

    /// Number of populated buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Sum over every populated bucket.
    pub fn totals(&self) -> DailyStats {
        let mut totals = DailyStats::default();
        for stats in self.buckets.values() {
            totals.merge(stats);
        }
        totals
    }

    /// Accumulate `other` bucket by bucket.
    pub fn merge(&mut self, other: &UserStats) {
        for (bucket, stats) in &other.buckets {
            self.record(*bucket).merge(stats);
        }
    }
}

// ── Aggregate ─────────────────────────────────────────────────────────────────

/// Statistics for every user seen during a run, keyed by identity.
///
/// Identities iterate in sorted order so reports are stable between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    users: BTreeMap<String, UserStats>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stats for `identity`, inserting an empty entry when absent.
    pub fn user_mut(&mut self, identity: &str) -> &mut UserStats {
        self.users.entry(identity.to_string()).or_default()
    }

    pub fn get(&self, identity: &str) -> Option<&UserStats> {
        self.users.get(identity)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl<'a> IntoIterator for &'a Aggregate {
    type Item = (&'a String, &'a UserStats);
    type IntoIter = btree_map::Iter<'a, String, UserStats>;

    fn into_iter(self) -> Self::IntoIter {
        self.users.iter()
    }
}
