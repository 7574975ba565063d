//! Log-to-statistics aggregation engine.
//!
//! Discovers log files, attributes each to a user via an
//! [`IdentityExtractor`], streams every file through the [`LineProcessor`]
//! and merges all files of one user into a single [`UserStats`].

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use stats_core::attribution::{DelimitedIdentity, IdentityExtractor};
use stats_core::error::{Result, StatsError};
use stats_core::markers::BehaviorClassifier;
use stats_core::models::{Aggregate, UserStats};
use stats_core::window::WindowSpec;
use tracing::{debug, info, warn};

use crate::processor::{LineOutcome, LineProcessor};
use crate::reader::{find_log_files, for_each_line};

// ── RunSummary ────────────────────────────────────────────────────────────────

/// Counters describing what one aggregation run touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RunSummary {
    /// Log files found by discovery.
    pub files_discovered: usize,
    /// Files read to the end.
    pub files_processed: usize,
    /// Files skipped because no identity could be extracted from the name.
    pub files_skipped: usize,
    /// Files that failed with an I/O error; nothing of them is counted.
    pub files_failed: usize,
    /// Lines read across all files.
    pub lines_read: u64,
    /// Lines counted into a bucket.
    pub lines_counted: u64,
}

// ── FileCounters ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct FileCounters {
    counted: u64,
    undated: u64,
    out_of_window: u64,
}

impl FileCounters {
    fn record(&mut self, outcome: LineOutcome) {
        match outcome {
            LineOutcome::Counted => self.counted += 1,
            LineOutcome::NoDateToken | LineOutcome::InvalidDate => self.undated += 1,
            LineOutcome::OutOfWindow => self.out_of_window += 1,
        }
    }
}

// ── LogAggregator ─────────────────────────────────────────────────────────────

/// Builds an [`Aggregate`] from a directory of IDE logs.
///
/// # Example
/// ```no_run
/// use chrono::NaiveDate;
/// use stats_core::window::WindowSpec;
/// use stats_data::aggregator::LogAggregator;
///
/// let reference = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
/// let aggregator = LogAggregator::new(WindowSpec::daily(reference));
/// let aggregate = aggregator.aggregate(std::path::Path::new("logs")).unwrap();
/// for (identity, user) in &aggregate {
///     println!("{identity}: {} buckets", user.len());
/// }
/// ```
pub struct LogAggregator {
    window: WindowSpec,
    classifier: BehaviorClassifier,
    extractor: Box<dyn IdentityExtractor>,
    cancel: Option<Arc<AtomicBool>>,
}

impl LogAggregator {
    /// Engine with the default markers and `_`-delimited attribution.
    pub fn new(window: WindowSpec) -> Self {
        Self {
            window,
            classifier: BehaviorClassifier::default(),
            extractor: Box::new(DelimitedIdentity::default()),
            cancel: None,
        }
    }

    pub fn with_classifier(mut self, classifier: BehaviorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_extractor(mut self, extractor: Box<dyn IdentityExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Stop with [`StatsError::Cancelled`] before the next file once `flag`
    /// is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Aggregate every log file under `log_dir`.
    ///
    /// Fails with [`StatsError::DirectoryNotFound`] before touching any file
    /// and with [`StatsError::NoLogFilesFound`] when discovery is empty.
    /// Files with malformed names are skipped; unreadable files are logged
    /// and skipped. Each file is counted into its own [`UserStats`] and merged
    /// into its user once fully read.
    pub fn aggregate(&self, log_dir: &Path) -> Result<Aggregate> {
        self.aggregate_with_summary(log_dir)
            .map(|(aggregate, _)| aggregate)
    }

    /// Same as [`LogAggregator::aggregate`], also returning run counters.
    pub fn aggregate_with_summary(&self, log_dir: &Path) -> Result<(Aggregate, RunSummary)> {
        if !log_dir.exists() {
            return Err(StatsError::DirectoryNotFound(log_dir.to_path_buf()));
        }

        let files = find_log_files(log_dir);
        if files.is_empty() {
            return Err(StatsError::NoLogFilesFound(log_dir.to_path_buf()));
        }

        let (lower, upper) = self.window.bounds();
        info!(
            "Aggregating {} log files from {} ({} mode, window ({}, {}])",
            files.len(),
            log_dir.display(),
            self.window.mode(),
            lower,
            upper
        );

        let mut aggregate = Aggregate::new();
        let mut summary = RunSummary {
            files_discovered: files.len(),
            ..Default::default()
        };

        for path in &files {
            if self.is_cancelled() {
                info!("Aggregation cancelled before {}", path.display());
                return Err(StatsError::Cancelled);
            }

            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let identity = match self.extractor.extract(&file_name) {
                Ok(identity) => identity,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    summary.files_skipped += 1;
                    continue;
                }
            };

            let user = aggregate.user_mut(&identity);
            let mut partial = UserStats::new();
            match self.process_file(path, &mut partial) {
                Ok((lines, counters)) => {
                    user.merge(&partial);
                    debug!(
                        "File {} ({}): {} read, {} counted, {} undated, {} out of window",
                        path.display(),
                        identity,
                        lines,
                        counters.counted,
                        counters.undated,
                        counters.out_of_window,
                    );
                    summary.files_processed += 1;
                    summary.lines_read += lines;
                    summary.lines_counted += counters.counted;
                }
                Err(e) => {
                    warn!("{}", e);
                    summary.files_failed += 1;
                }
            }
        }

        for (identity, user) in &aggregate {
            debug!(
                "User {}: {} records in {} buckets",
                identity,
                user.totals().total_records,
                user.len()
            );
        }

        info!(
            "Aggregated {} users: {} files processed, {} skipped, {} failed",
            aggregate.len(),
            summary.files_processed,
            summary.files_skipped,
            summary.files_failed
        );

        Ok((aggregate, summary))
    }

    /// Stream one file into `user`.
    fn process_file(&self, path: &Path, user: &mut UserStats) -> Result<(u64, FileCounters)> {
        let processor = LineProcessor::new(&self.window, &self.classifier);
        let mut counters = FileCounters::default();
        let lines = for_each_line(path, |line| {
            counters.record(processor.process(line, user));
        })?;
        Ok((lines, counters))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stats_core::markers::{
        Marker, MarkerSet, PRIMARY_CODE_MARKER, SECONDARY_CODE_MARKER, SECONDARY_QUERY_MARKER,
    };
    use stats_core::models::{BehaviorTag, DailyStats};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn write_log(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    fn identities(aggregate: &Aggregate) -> Vec<&str> {
        aggregate.into_iter().map(|(k, _)| k.as_str()).collect()
    }

    fn code_line(day: &str) -> String {
        format!("{} 10:00:00,001 [ 42] INFO - {}", day, PRIMARY_CODE_MARKER)
    }

    // ── scenarios ─────────────────────────────────────────────────────────────

    #[test]
    fn test_single_user_daily_scenario() {
        let dir = TempDir::new().unwrap();
        let code = code_line("2025-03-04");
        write_log(
            dir.path(),
            "app_alice_2024.log",
            &[&code, "2025-03-04 Select model is gpt4"],
        );

        let aggregate = LogAggregator::new(WindowSpec::daily(date(2025, 3, 4)))
            .aggregate(dir.path())
            .unwrap();

        assert_eq!(aggregate.len(), 1);
        let alice = aggregate.get("alice").unwrap();
        assert_eq!(
            alice.stats_or_default(&date(2025, 3, 4)),
            DailyStats {
                total_records: 2,
                primary_code_actions: 1,
                primary_query_actions: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_all_lines_out_of_window_keeps_user_with_no_buckets() {
        let dir = TempDir::new().unwrap();
        let code = code_line("2025-03-04");
        write_log(
            dir.path(),
            "app_alice_2024.log",
            &[&code, "2025-03-04 Select model is gpt4"],
        );

        let window = WindowSpec::daily(date(2025, 3, 20));
        let aggregate = LogAggregator::new(window).aggregate(dir.path()).unwrap();

        let alice = aggregate.get("alice").unwrap();
        assert!(alice.is_empty());
        let sequence = window.bucket_sequence();
        assert_eq!(sequence.len(), 7);
        assert!(sequence.iter().all(|b| alice.stats_or_default(b).is_empty()));
    }

    #[test]
    fn test_empty_directory_is_no_log_files() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "readme.txt", &["2025-03-04 nothing"]);

        let err = LogAggregator::new(WindowSpec::daily(date(2025, 3, 4)))
            .aggregate(dir.path())
            .unwrap_err();
        assert!(matches!(err, StatsError::NoLogFilesFound(_)));
    }

    #[test]
    fn test_missing_directory() {
        let err = LogAggregator::new(WindowSpec::daily(date(2025, 3, 4)))
            .aggregate(Path::new("/tmp/does-not-exist-usage-stats-dir"))
            .unwrap_err();
        assert!(matches!(err, StatsError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_monthly_scenario() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "idea_bob_idea.log", &["2025-01-10 Select model is x"]);

        let aggregate = LogAggregator::new(WindowSpec::monthly(date(2025, 3, 15)))
            .aggregate(dir.path())
            .unwrap();

        let bob = aggregate.get("bob").unwrap();
        assert_eq!(bob.len(), 1);
        assert_eq!(bob.stats_or_default(&date(2025, 1, 1)).total_records, 1);
    }

    // ── merging ───────────────────────────────────────────────────────────────

    #[test]
    fn test_files_of_same_user_merge_to_sum() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("rotated");
        std::fs::create_dir_all(&sub).unwrap();
        let code = code_line("2025-03-03");
        let copilot = format!("2025-03-04 POST {}", SECONDARY_CODE_MARKER);
        let first: Vec<&str> = vec![code.as_str(), "2025-03-04 Select model is a"];
        let second: Vec<&str> = vec![copilot.as_str(), "2025-03-04 Select model is b", "trace line"];
        write_log(dir.path(), "idea_alice_idea.log", &first);
        write_log(&sub, "idea_alice_idea.log.1", &second);

        let window = WindowSpec::daily(date(2025, 3, 4));
        let merged = LogAggregator::new(window).aggregate(dir.path()).unwrap();
        assert_eq!(merged.len(), 1);

        // Independent runs against empty stats.
        let separate = |name: &str, lines: &[&str]| {
            let d = TempDir::new().unwrap();
            write_log(d.path(), name, lines);
            LogAggregator::new(window)
                .aggregate(d.path())
                .unwrap()
                .get("alice")
                .cloned()
                .unwrap()
        };
        let mut expected = UserStats::new();
        expected.merge(&separate("idea_alice_idea.log", &first));
        expected.merge(&separate("idea_alice_idea.log", &second));

        assert_eq!(merged.get("alice").unwrap(), &expected);
        assert_eq!(
            expected.stats_or_default(&date(2025, 3, 4)),
            DailyStats {
                total_records: 3,
                primary_query_actions: 2,
                secondary_code_actions: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_multiple_users() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "idea_alice_idea.log", &["2025-03-04 boot"]);
        write_log(dir.path(), "idea_bob_idea.log", &["2025-03-02 boot", "2025-03-03 boot"]);

        let (aggregate, summary) = LogAggregator::new(WindowSpec::daily(date(2025, 3, 4)))
            .aggregate_with_summary(dir.path())
            .unwrap();

        assert_eq!(identities(&aggregate), vec!["alice", "bob"]);
        assert_eq!(aggregate.get("bob").unwrap().totals().total_records, 2);
        assert_eq!(summary.files_processed, 2);
        assert_eq!(summary.lines_read, 3);
        assert_eq!(summary.lines_counted, 3);
    }

    // ── attribution policy ────────────────────────────────────────────────────

    #[test]
    fn test_malformed_file_name_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "idea.log", &["2025-03-04 Select model is x"]);
        write_log(dir.path(), "idea_alice_idea.log", &["2025-03-04 boot"]);

        let (aggregate, summary) = LogAggregator::new(WindowSpec::daily(date(2025, 3, 4)))
            .aggregate_with_summary(dir.path())
            .unwrap();

        assert_eq!(identities(&aggregate), vec!["alice"]);
        assert_eq!(summary.files_discovered, 2);
        assert_eq!(summary.files_skipped, 1);
        assert_eq!(summary.files_processed, 1);
    }

    #[test]
    fn test_only_malformed_names_yields_empty_aggregate() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "idea.log", &["2025-03-04 boot"]);

        let aggregate = LogAggregator::new(WindowSpec::daily(date(2025, 3, 4)))
            .aggregate(dir.path())
            .unwrap();
        assert!(aggregate.is_empty());
    }

    struct WholeStem;

    impl IdentityExtractor for WholeStem {
        fn extract(&self, file_name: &str) -> Result<String> {
            file_name
                .split('.')
                .next()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| StatsError::MalformedFileName(file_name.to_string()))
        }
    }

    #[test]
    fn test_custom_extractor() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "carol.log", &["2025-03-04 boot"]);

        let aggregate = LogAggregator::new(WindowSpec::daily(date(2025, 3, 4)))
            .with_extractor(Box::new(WholeStem))
            .aggregate(dir.path())
            .unwrap();
        assert!(aggregate.get("carol").is_some());
    }

    #[test]
    fn test_custom_classifier() {
        let dir = TempDir::new().unwrap();
        write_log(
            dir.path(),
            "idea_alice_idea.log",
            &["2025-03-04 tab accepted", &format!("2025-03-04 {}", SECONDARY_QUERY_MARKER)],
        );
        let markers = MarkerSet::new(vec![Marker::new(
            BehaviorTag::PrimaryToolCodeAction,
            "tab accepted",
        )])
        .unwrap();

        let aggregate = LogAggregator::new(WindowSpec::daily(date(2025, 3, 4)))
            .with_classifier(BehaviorClassifier::new(markers))
            .aggregate(dir.path())
            .unwrap();

        let stats = aggregate
            .get("alice")
            .unwrap()
            .stats_or_default(&date(2025, 3, 4));
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.primary_code_actions, 1);
        assert_eq!(stats.secondary_query_actions, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_does_not_abort_run() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = write_log(dir.path(), "idea_alice_idea.log", &["2025-03-04 boot"]);
        write_log(dir.path(), "idea_bob_idea.log", &["2025-03-04 boot"]);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits; only assert when the file is unreadable.
        if std::fs::File::open(&locked).is_ok() {
            return;
        }

        let (aggregate, summary) = LogAggregator::new(WindowSpec::daily(date(2025, 3, 4)))
            .aggregate_with_summary(dir.path())
            .unwrap();
        assert_eq!(summary.files_failed, 1);
        assert_eq!(aggregate.get("bob").unwrap().totals().total_records, 1);
        assert!(aggregate.get("alice").unwrap().is_empty());
    }

    // ── cancellation ──────────────────────────────────────────────────────────

    #[test]
    fn test_cancel_flag_stops_before_next_file() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "idea_alice_idea.log", &["2025-03-04 boot"]);

        let flag = Arc::new(AtomicBool::new(true));
        let err = LogAggregator::new(WindowSpec::daily(date(2025, 3, 4)))
            .with_cancel_flag(flag)
            .aggregate(dir.path())
            .unwrap_err();
        assert!(matches!(err, StatsError::Cancelled));
    }

    #[test]
    fn test_unset_cancel_flag_runs_to_end() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "idea_alice_idea.log", &["2025-03-04 boot"]);

        let aggregate = LogAggregator::new(WindowSpec::daily(date(2025, 3, 4)))
            .with_cancel_flag(Arc::new(AtomicBool::new(false)))
            .aggregate(dir.path())
            .unwrap();
        assert_eq!(aggregate.len(), 1);
    }
}
