//! Top-level analysis pipeline.
//!
//! Builds the window, runs the aggregation engine and returns an
//! [`AnalysisResult`] ready for the report renderers.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use stats_core::error::Result;
use stats_core::markers::{BehaviorClassifier, MarkerSet};
use stats_core::models::{Aggregate, BucketKey};
use stats_core::window::{ReportMode, WindowSpec, BUCKET_COUNT};

use crate::aggregator::{LogAggregator, RunSummary};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Counters from the aggregation run.
    pub summary: RunSummary,
    /// Wall-clock seconds spent aggregating.
    pub elapsed_seconds: f64,
}

/// The complete output of [`analyze_logs`].
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Per-user, per-bucket counters.
    pub aggregate: Aggregate,
    /// Window the aggregate was built for.
    pub window: WindowSpec,
    /// Reporting order of buckets, oldest first.
    pub buckets: [BucketKey; BUCKET_COUNT],
    /// Markers used for classification; renderers take tool names from here.
    pub markers: MarkerSet,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    pub fn mode(&self) -> ReportMode {
        self.window.mode()
    }
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full analysis over `log_dir`.
///
/// 1. Build the [`WindowSpec`] for `reference_date` and `mode`.
/// 2. Aggregate every log file with the given markers.
/// 3. Return the aggregate with its bucket sequence and run metadata.
pub fn analyze_logs(
    log_dir: &Path,
    reference_date: NaiveDate,
    mode: ReportMode,
    markers: MarkerSet,
) -> Result<AnalysisResult> {
    run_analysis(log_dir, reference_date, mode, markers, None)
}

/// Same as [`analyze_logs`], failing with `StatsError::Cancelled` before the
/// next file once `cancel` is set.
pub fn analyze_logs_cancellable(
    log_dir: &Path,
    reference_date: NaiveDate,
    mode: ReportMode,
    markers: MarkerSet,
    cancel: Arc<AtomicBool>,
) -> Result<AnalysisResult> {
    run_analysis(log_dir, reference_date, mode, markers, Some(cancel))
}

fn run_analysis(
    log_dir: &Path,
    reference_date: NaiveDate,
    mode: ReportMode,
    markers: MarkerSet,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<AnalysisResult> {
    let window = WindowSpec::new(reference_date, mode);

    let start = std::time::Instant::now();
    let mut aggregator =
        LogAggregator::new(window).with_classifier(BehaviorClassifier::new(markers.clone()));
    if let Some(flag) = cancel {
        aggregator = aggregator.with_cancel_flag(flag);
    }
    let (aggregate, summary) = aggregator.aggregate_with_summary(log_dir)?;
    let elapsed = start.elapsed().as_secs_f64();

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        summary,
        elapsed_seconds: elapsed,
    };

    Ok(AnalysisResult {
        aggregate,
        window,
        buckets: window.bucket_sequence(),
        markers,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
