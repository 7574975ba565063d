//! Plain-text report.

use std::path::{Path, PathBuf};

use stats_core::error::{Result, StatsError};
use stats_core::formatting::format_bucket;
use stats_core::window::ReportMode;
use stats_data::analysis::AnalysisResult;
use tracing::info;

use crate::{prepare_output, ReportRenderer};

/// Writes `analysis_report_{daily|monthly}.txt`.
///
/// For every user, sorted by identity: the identity on its own line, one line
/// per bucket of the sequence with the primary tool counters, then a blank
/// line. Buckets without activity are written as zeros.
#[derive(Debug, Clone, Default)]
pub struct TextReport;

impl TextReport {
    pub fn new() -> Self {
        Self
    }

    /// Report lines, also used for console echo.
    pub fn lines(&self, result: &AnalysisResult) -> Vec<String> {
        let mode = result.mode();
        let mut lines = Vec::new();

        for (identity, user) in &result.aggregate {
            lines.push(identity.clone());
            for bucket in &result.buckets {
                let stats = user.stats_or_default(bucket);
                lines.push(format!(
                    "{} total: {} ai_total: {} code: {} query: {}",
                    format_bucket(*bucket, mode),
                    stats.total_records,
                    stats.primary_total(),
                    stats.primary_code_actions,
                    stats.primary_query_actions,
                ));
            }
            lines.push(String::new());
        }

        lines
    }
}

impl ReportRenderer for TextReport {
    fn file_name(&self, mode: ReportMode) -> String {
        format!("{}.txt", mode.file_stem())
    }

    fn render(&self, result: &AnalysisResult, out_dir: &Path) -> Result<PathBuf> {
        let path = prepare_output(out_dir, &self.file_name(result.mode()))?;

        let mut content = self.lines(result).join("\n");
        content.push('\n');
        std::fs::write(&path, content).map_err(|source| StatsError::ReportWrite {
            path: path.clone(),
            source,
        })?;

        info!("Wrote text report to {}", path.display());
        Ok(path)
    }
}
