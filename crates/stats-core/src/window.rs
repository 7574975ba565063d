//! Reporting window policy.
//!
//! A [`WindowSpec`] fixes the reference date and [`ReportMode`] of one run and
//! answers two questions: does a log date belong to the run, and which seven
//! buckets does the report list.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};
use crate::models::BucketKey;

/// Number of buckets every report lists.
pub const BUCKET_COUNT: usize = 7;

// ── ReportMode ────────────────────────────────────────────────────────────────

/// Granularity of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// The reference day and the six days before it.
    #[default]
    Daily,
    /// The reference month and the six months before it.
    Monthly,
}

impl ReportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportMode::Daily => "daily",
            ReportMode::Monthly => "monthly",
        }
    }

    /// Report file name without extension.
    pub fn file_stem(&self) -> &'static str {
        match self {
            ReportMode::Daily => "analysis_report_daily",
            ReportMode::Monthly => "analysis_report_monthly",
        }
    }
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportMode {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(ReportMode::Daily),
            "monthly" => Ok(ReportMode::Monthly),
            other => Err(StatsError::InvalidReferenceDate(format!(
                "unknown report mode \"{}\"",
                other
            ))),
        }
    }
}

// ── Date helpers ──────────────────────────────────────────────────────────────

/// First day of `date`'s month.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Last day of `date`'s month.
pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .map(|next| next - Days::new(1))
        .unwrap_or(NaiveDate::MAX)
}

fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days))
        .unwrap_or(NaiveDate::MIN)
}

fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

// ── WindowSpec ────────────────────────────────────────────────────────────────

/// Immutable reporting window for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    reference_date: NaiveDate,
    mode: ReportMode,
    /// Dates must be strictly after this one.
    lower_exclusive: NaiveDate,
    /// Dates must be on or before this one.
    upper_inclusive: NaiveDate,
}

impl WindowSpec {
    pub fn new(reference_date: NaiveDate, mode: ReportMode) -> Self {
        let (lower_exclusive, upper_inclusive) = match mode {
            ReportMode::Daily => (
                days_before(reference_date, BUCKET_COUNT as u64),
                reference_date,
            ),
            ReportMode::Monthly => (
                months_before(first_of_month(reference_date), (BUCKET_COUNT - 1) as u32),
                last_of_month(reference_date),
            ),
        };
        Self {
            reference_date,
            mode,
            lower_exclusive,
            upper_inclusive,
        }
    }

    pub fn daily(reference_date: NaiveDate) -> Self {
        Self::new(reference_date, ReportMode::Daily)
    }

    pub fn monthly(reference_date: NaiveDate) -> Self {
        Self::new(reference_date, ReportMode::Monthly)
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn mode(&self) -> ReportMode {
        self.mode
    }

    /// `(exclusive lower bound, inclusive upper bound)` of the window.
    pub fn bounds(&self) -> (NaiveDate, NaiveDate) {
        (self.lower_exclusive, self.upper_inclusive)
    }

    /// Whether a line dated `candidate` is counted.
    pub fn in_window(&self, candidate: NaiveDate) -> bool {
        candidate > self.lower_exclusive && candidate <= self.upper_inclusive
    }

    /// Bucket a counted date falls into.
    pub fn bucket_for(&self, candidate: NaiveDate) -> BucketKey {
        match self.mode {
            ReportMode::Daily => candidate,
            ReportMode::Monthly => first_of_month(candidate),
        }
    }

    /// The seven buckets of the report, oldest first, with no gaps.
    pub fn bucket_sequence(&self) -> [BucketKey; BUCKET_COUNT] {
        let last = BUCKET_COUNT - 1;
        std::array::from_fn(|i| {
            let back = last - i;
            match self.mode {
                ReportMode::Daily => days_before(self.reference_date, back as u64),
                ReportMode::Monthly => {
                    months_before(first_of_month(self.reference_date), back as u32)
                }
            }
        })
    }
}

// ── Reference argument ────────────────────────────────────────────────────────

/// Parse a reference argument: `yyyyMMdd` selects daily mode on that day,
/// `yyyyMM` selects monthly mode on the first of that month.
pub fn parse_reference_arg(arg: &str) -> Result<(NaiveDate, ReportMode)> {
    let arg = arg.trim();
    let invalid = || StatsError::InvalidReferenceDate(arg.to_string());

    if !arg.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    match arg.len() {
        6 => NaiveDate::parse_from_str(&format!("{}01", arg), "%Y%m%d")
            .map(|d| (d, ReportMode::Monthly))
            .map_err(|_| invalid()),
        8 => NaiveDate::parse_from_str(arg, "%Y%m%d")
            .map(|d| (d, ReportMode::Daily))
            .map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}
