//! Data ingestion layer for IDE usage statistics.
//!
//! Responsible for discovering and streaming IDE log files, counting each
//! dated line into the right user and bucket, and running the top-level
//! analysis pipeline.

pub mod aggregator;
pub mod analysis;
pub mod processor;
pub mod reader;

pub use stats_core as core;
