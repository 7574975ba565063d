//! Background analysis job.
//!
//! An [`AnalysisJob`] runs the aggregation and every renderer on a blocking
//! tokio task and sends [`JobEvent`]s through an `mpsc` channel, so the front
//! end can show a busy state while the logs are read. A shared cancel flag is
//! checked between files and before each report is written.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use stats_core::error::{Result, StatsError};
use stats_core::markers::MarkerSet;
use stats_core::window::ReportMode;
use stats_data::analysis::{analyze_logs_cancellable, AnalysisMetadata};
use stats_report::{ReportRenderer, SpreadsheetReport, TextReport};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

// ── Public types ──────────────────────────────────────────────────────────────

/// Outcome of a successful job.
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub reference_date: NaiveDate,
    pub mode: ReportMode,
    /// Number of users in the aggregate.
    pub users: usize,
    /// Text report lines, for console echo.
    pub text_lines: Vec<String>,
    /// Every report file written, in renderer order.
    pub reports: Vec<PathBuf>,
    pub metadata: AnalysisMetadata,
}

/// Progress events of a running job.
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// The job was picked up and is reading logs.
    Started,
    /// The job ended; errors are carried as their display message.
    Finished(std::result::Result<JobSummary, String>),
}

// ── AnalysisJob ───────────────────────────────────────────────────────────────

/// One analysis run with its report targets.
#[derive(Clone)]
pub struct AnalysisJob {
    log_dir: PathBuf,
    output_dir: PathBuf,
    reference_date: NaiveDate,
    mode: ReportMode,
    markers: MarkerSet,
    text: TextReport,
    spreadsheet: SpreadsheetReport,
    cancel: Arc<AtomicBool>,
}

impl AnalysisJob {
    /// Job writing the text and spreadsheet reports into `output_dir`.
    pub fn new(
        log_dir: PathBuf,
        output_dir: PathBuf,
        reference_date: NaiveDate,
        mode: ReportMode,
    ) -> Self {
        Self {
            log_dir,
            output_dir,
            reference_date,
            mode,
            markers: MarkerSet::default(),
            text: TextReport::new(),
            spreadsheet: SpreadsheetReport::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_markers(mut self, markers: MarkerSet) -> Self {
        self.markers = markers;
        self
    }

    /// Divisor for the spreadsheet's secondary query column.
    pub fn with_secondary_query_divisor(mut self, divisor: u64) -> Self {
        self.spreadsheet = self.spreadsheet.with_secondary_query_divisor(divisor);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Run the analysis and all renderers on the current thread.
    pub fn run(&self) -> Result<JobSummary> {
        let result = analyze_logs_cancellable(
            &self.log_dir,
            self.reference_date,
            self.mode,
            self.markers.clone(),
            Arc::clone(&self.cancel),
        )?;

        let renderers: [&dyn ReportRenderer; 2] = [&self.text, &self.spreadsheet];
        let mut reports = Vec::with_capacity(renderers.len());
        for renderer in renderers {
            if self.cancelled() {
                info!("Analysis cancelled before writing {}", renderer.file_name(self.mode));
                return Err(StatsError::Cancelled);
            }
            reports.push(renderer.render(&result, &self.output_dir)?);
        }

        Ok(JobSummary {
            reference_date: self.reference_date,
            mode: self.mode,
            users: result.aggregate.len(),
            text_lines: self.text.lines(&result),
            reports,
            metadata: result.metadata,
        })
    }

    /// Start the job in the background.
    ///
    /// Returns the event receiver and a [`JobHandle`] that can abort it.
    pub fn start(self) -> (mpsc::Receiver<JobEvent>, JobHandle) {
        let (tx, rx) = mpsc::channel(16);
        let cancel = Arc::clone(&self.cancel);

        let handle = tokio::spawn(async move {
            if tx.send(JobEvent::Started).await.is_err() {
                debug!("job receiver dropped before start");
                return;
            }

            info!(
                "Starting {} analysis for {} in {}",
                self.mode,
                self.reference_date,
                self.log_dir.display()
            );

            let outcome = match tokio::task::spawn_blocking(move || self.run()).await {
                Ok(Ok(summary)) => Ok(summary),
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => Err(format!("analysis task failed: {e}")),
            };

            if let Err(e) = tx.send(JobEvent::Finished(outcome)).await {
                warn!(error = %e, "failed to send job result; receiver dropped");
            }
        });

        (rx, JobHandle { handle, cancel })
    }
}

// ── JobHandle ─────────────────────────────────────────────────────────────────

/// A handle to the background job.
pub struct JobHandle {
    handle: tokio::task::JoinHandle<()>,
    cancel: Arc<AtomicBool>,
}

impl JobHandle {
    /// Abort the job. A file already being read is finished, then the
    /// blocking work stops before the next file or report.
    pub fn abort(&self) {
        self.cancel.store(true, Ordering::Relaxed);
        self.handle.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
