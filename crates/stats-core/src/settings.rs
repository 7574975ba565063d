use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::window::{parse_reference_arg, ReportMode};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Daily / monthly AI-assistant usage statistics from IDE logs
#[derive(Parser, Debug, Clone)]
#[command(
    name = "ide-usage-stats",
    about = "Daily / monthly AI-assistant usage statistics from IDE logs",
    version
)]
pub struct Settings {
    /// Reference date: yyyyMMdd for a daily report, yyyyMM for a monthly one
    #[arg(long)]
    pub date: Option<String>,

    /// Report mode used when --date is not given
    #[arg(long, default_value = "daily", value_parser = ["daily", "monthly"])]
    pub mode: String,

    /// Directory scanned recursively for *.log and *.log.N files
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Directory the reports are written to (defaults to the log directory)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// JSON file overriding the behavior markers
    #[arg(long)]
    pub markers: Option<PathBuf>,

    /// Divisor applied to the secondary tool's query column of the spreadsheet
    #[arg(long, default_value_t = 3)]
    pub secondary_query_divisor: u64,

    /// Timezone used to determine "today" (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.ide-usage-stats/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl LastUsedParams {
    /// Default path of the persisted file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".ide-usage-stats").join("last_used.json")
    }

    /// Load persisted params, `Default` when the file is absent or cannot be
    /// parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    pub fn clear_at(path: &Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit args and config
    /// path.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values. A persisted output directory
        // belongs to the persisted log directory only.
        if settings.log_dir.is_none() {
            settings.log_dir = last.log_dir;
            if settings.output_dir.is_none() {
                settings.output_dir = last.output_dir;
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Reference date and mode for this run.
    ///
    /// `--date` decides both; without it the run covers `today` in the
    /// `--mode` granularity.
    pub fn reference(&self, today: NaiveDate) -> Result<(NaiveDate, ReportMode)> {
        match &self.date {
            Some(arg) => parse_reference_arg(arg),
            None => Ok((today, self.mode.parse()?)),
        }
    }

    /// Log directory, falling back to `default_dir`.
    pub fn resolve_log_dir(&self, default_dir: &Path) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| default_dir.to_path_buf())
    }

    /// Output directory, falling back to the resolved log directory.
    pub fn resolve_output_dir(&self, log_dir: &Path) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| log_dir.to_path_buf())
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            log_dir: s.log_dir.clone(),
            output_dir: s.output_dir.clone(),
            timezone: Some(s.timezone.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}
