//! Tabular report as an Excel workbook.
//!
//! One sheet, one row per (user, bucket) with a running row number. Column
//! names for the tool counters are taken from the [`MarkerSet`] display names.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use stats_core::error::{Result, StatsError};
use stats_core::formatting::format_bucket;
use stats_core::markers::MarkerSet;
use stats_core::window::ReportMode;
use stats_data::analysis::AnalysisResult;
use tracing::{info, warn};

use crate::{prepare_output, ReportRenderer};

pub const DEFAULT_SECONDARY_QUERY_DIVISOR: u64 = 3;

const SHEET_NAME: &str = "Log Analysis Report";

/// One data row of the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetRow {
    pub no: u64,
    pub name: String,
    pub period: String,
    pub total_records: u64,
    pub primary_total: u64,
    pub primary_code: u64,
    pub primary_query: u64,
    pub secondary_code: u64,
    pub secondary_query: u64,
}

impl SpreadsheetRow {
    fn counters(&self) -> [u64; 6] {
        [
            self.total_records,
            self.primary_total,
            self.primary_code,
            self.primary_query,
            self.secondary_code,
            self.secondary_query,
        ]
    }
}

/// Writes `analysis_report_{daily|monthly}.xlsx`.
///
/// The secondary query column is divided by `secondary_query_divisor`
/// (integer division, default 3). Only the written column is normalized.
#[derive(Debug, Clone)]
pub struct SpreadsheetReport {
    secondary_query_divisor: u64,
}

impl Default for SpreadsheetReport {
    fn default() -> Self {
        Self {
            secondary_query_divisor: DEFAULT_SECONDARY_QUERY_DIVISOR,
        }
    }
}

impl SpreadsheetReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Divisor for the secondary query column; `0` is treated as `1`.
    pub fn with_secondary_query_divisor(mut self, divisor: u64) -> Self {
        if divisor == 0 {
            warn!("Secondary query divisor 0 is not allowed, using 1");
        }
        self.secondary_query_divisor = divisor.max(1);
        self
    }

    pub fn secondary_query_divisor(&self) -> u64 {
        self.secondary_query_divisor
    }

    /// Column names for the given tool display names.
    pub fn headers(markers: &MarkerSet) -> Vec<String> {
        let p = &markers.primary_tool;
        let s = &markers.secondary_tool;
        vec![
            "No".to_string(),
            "Name".to_string(),
            "Period".to_string(),
            "Total Records".to_string(),
            format!("{p}-Total"),
            format!("{p}-Code"),
            format!("{p}-Query"),
            format!("{s}-Code"),
            format!("{s}-Query"),
        ]
    }

    /// Data rows in sheet order: users sorted, buckets oldest first.
    pub fn rows(&self, result: &AnalysisResult) -> Vec<SpreadsheetRow> {
        let mode = result.mode();
        let mut rows = Vec::with_capacity(result.aggregate.len() * result.buckets.len());

        for (identity, user) in &result.aggregate {
            for bucket in &result.buckets {
                let stats = user.stats_or_default(bucket);
                rows.push(SpreadsheetRow {
                    no: rows.len() as u64 + 1,
                    name: identity.clone(),
                    period: format_bucket(*bucket, mode),
                    total_records: stats.total_records,
                    primary_total: stats.primary_total(),
                    primary_code: stats.primary_code_actions,
                    primary_query: stats.primary_query_actions,
                    secondary_code: stats.secondary_code_actions,
                    secondary_query: stats.secondary_query_actions / self.secondary_query_divisor,
                });
            }
        }

        rows
    }

    fn write_workbook(
        &self,
        result: &AnalysisResult,
        path: &Path,
    ) -> std::result::Result<usize, XlsxError> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let rows = self.rows(result);

        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        for (col, header) in Self::headers(&result.markers).iter().enumerate() {
            let col = col as u16;
            let width = match col {
                0 => 5,
                1 | 3 => 10,
                _ => 15,
            };
            sheet.set_column_width(col, width)?;
            sheet.write_string_with_format(0, col, header, &header_format)?;
        }

        for (i, row) in rows.iter().enumerate() {
            let r = i as u32 + 1;
            sheet.write_number(r, 0, row.no as f64)?;
            sheet.write_string(r, 1, &row.name)?;
            sheet.write_string(r, 2, &row.period)?;
            for (offset, value) in row.counters().iter().enumerate() {
                sheet.write_number(r, 3 + offset as u16, *value as f64)?;
            }
        }

        workbook.save(path)?;
        Ok(rows.len())
    }
}

impl ReportRenderer for SpreadsheetReport {
    fn file_name(&self, mode: ReportMode) -> String {
        format!("{}.xlsx", mode.file_stem())
    }

    fn render(&self, result: &AnalysisResult, out_dir: &Path) -> Result<PathBuf> {
        let path = prepare_output(out_dir, &self.file_name(result.mode()))?;

        let written = self
            .write_workbook(result, &path)
            .map_err(|e| StatsError::ReportWrite {
                path: path.clone(),
                source: std::io::Error::other(e.to_string()),
            })?;

        info!("Wrote {} rows to {}", written, path.display());
        Ok(path)
    }
}
