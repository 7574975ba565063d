//! Per-line counting.

use stats_core::markers::BehaviorClassifier;
use stats_core::models::{BehaviorTag, UserStats};
use stats_core::time_utils::parse_log_date;
use stats_core::window::WindowSpec;

/// What happened to a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// Counted into a bucket.
    Counted,
    /// No space in the line, so no leading date token.
    NoDateToken,
    /// The leading token is not a `yyyy-MM-dd` date.
    InvalidDate,
    /// Dated outside the reporting window.
    OutOfWindow,
}

/// Applies the window policy and the classifier to raw lines.
#[derive(Debug, Clone)]
pub struct LineProcessor<'a> {
    window: &'a WindowSpec,
    classifier: &'a BehaviorClassifier,
}

impl<'a> LineProcessor<'a> {
    pub fn new(window: &'a WindowSpec, classifier: &'a BehaviorClassifier) -> Self {
        Self { window, classifier }
    }

    /// Count `line` into `user` when it is dated inside the window.
    ///
    /// Lines without a date prefix (stack trace continuations, wrapped
    /// messages) are skipped silently and leave `user` untouched.
    pub fn process(&self, line: &str, user: &mut UserStats) -> LineOutcome {
        let Some((token, _payload)) = line.split_once(' ') else {
            return LineOutcome::NoDateToken;
        };

        let Some(date) = parse_log_date(token) else {
            return LineOutcome::InvalidDate;
        };

        if !self.window.in_window(date) {
            return LineOutcome::OutOfWindow;
        }

        let stats = user.record(self.window.bucket_for(date));
        stats.increment(BehaviorTag::TotalRecords);
        for tag in self.classifier.classify(line) {
            stats.increment(tag);
        }

        LineOutcome::Counted
    }
}
