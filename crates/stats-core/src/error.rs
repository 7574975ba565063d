use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the usage statistics pipeline.
#[derive(Error, Debug)]
pub enum StatsError {
    /// The log directory handed to the engine does not exist.
    #[error("Log directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// Discovery finished without a single `.log` / `.log.N` file.
    #[error("No log files found in {0}")]
    NoLogFilesFound(PathBuf),

    /// A log file name does not carry a `<prefix>_<identity>_<suffix>` shape.
    #[error("Cannot extract user identity from file name: {0}")]
    MalformedFileName(String),

    /// A log file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A report file could not be written.
    #[error("Failed to write report {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run was stopped before it finished.
    #[error("Analysis cancelled")]
    Cancelled,

    /// The reference date argument matched neither `yyyyMMdd` nor `yyyyMM`.
    #[error("Invalid reference date: {0}")]
    InvalidReferenceDate(String),

    /// A marker configuration is unusable.
    #[error("Marker configuration error: {0}")]
    MarkerConfig(String),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the stats crates.
pub type Result<T> = std::result::Result<T, StatsError>;
