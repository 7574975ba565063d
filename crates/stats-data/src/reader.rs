//! Log file discovery and line streaming.
//!
//! Walks a log directory for `*.log` and rotated `*.log.N` files and feeds
//! their lines one at a time to a callback, so only one file handle and one
//! line buffer are alive at any moment.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use stats_core::error::{Result, StatsError};
use tracing::{debug, warn};

// ── Public API ────────────────────────────────────────────────────────────────

/// `true` for `name.log` and rotated `name.log.<digits>` file names.
pub fn is_log_file_name(file_name: &str) -> bool {
    static LOG_NAME: OnceLock<Regex> = OnceLock::new();
    LOG_NAME
        .get_or_init(|| Regex::new(r"\.log(\.\d+)?$").expect("regex is valid"))
        .is_match(file_name)
}

/// Find all log files recursively under `log_dir`, sorted by path.
///
/// Matching is done on the file name only, so directories named `*.log` are
/// never picked up and parent path components do not matter.
pub fn find_log_files(log_dir: &Path) -> Vec<PathBuf> {
    if !log_dir.exists() {
        warn!("Log directory does not exist: {}", log_dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(log_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", log_dir.display(), e);
                None
            }
        })
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .map(is_log_file_name)
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    debug!("Found {} log files under {}", files.len(), log_dir.display());
    files
}

/// Stream every line of `path` into `on_line`, returning the number of lines.
///
/// Line terminators (`\n`, `\r\n`) are stripped. Bytes that are not valid
/// UTF-8 are replaced rather than failing the file; markers and dates are
/// plain ASCII so replacement never changes a match.
pub fn for_each_line(path: &Path, mut on_line: impl FnMut(&str)) -> Result<u64> {
    let file_read = |source: std::io::Error| StatsError::FileRead {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(file_read)?;
    let mut reader = std::io::BufReader::new(file);
    let mut buf: Vec<u8> = Vec::with_capacity(512);
    let mut lines = 0u64;

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf).map_err(file_read)?;
        if read == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        lines += 1;
        on_line(&String::from_utf8_lossy(&buf));
    }

    Ok(lines)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
