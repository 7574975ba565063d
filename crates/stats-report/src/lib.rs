//! Report renderers for IDE usage statistics.
//!
//! Renderers read a finished [`AnalysisResult`] and write one file into an
//! output directory. They never change the aggregate.

use std::path::{Path, PathBuf};

use stats_core::error::{Result, StatsError};
use stats_core::window::ReportMode;
use stats_data::analysis::AnalysisResult;

pub mod spreadsheet;
pub mod text;

pub use spreadsheet::SpreadsheetReport;
pub use text::TextReport;

/// A report format written from an [`AnalysisResult`].
pub trait ReportRenderer: Send + Sync {
    /// File name of the report for `mode`, without directory.
    fn file_name(&self, mode: ReportMode) -> String;

    /// Write the report into `out_dir`, returning the written path.
    fn render(&self, result: &AnalysisResult, out_dir: &Path) -> Result<PathBuf>;
}

/// Create `out_dir` if needed and return the report path inside it.
pub(crate) fn prepare_output(out_dir: &Path, file_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir).map_err(|source| StatsError::ReportWrite {
        path: out_dir.to_path_buf(),
        source,
    })?;
    Ok(out_dir.join(file_name))
}
