//! Runtime orchestration layer for IDE usage statistics.
//!
//! Runs one analysis and its reports off the async executor and reports
//! progress to the front end through a channel.

pub mod orchestrator;

pub use stats_core as core;
pub use stats_data as data;
pub use stats_report as report;
