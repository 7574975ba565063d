//! Core domain types for IDE usage statistics.
//!
//! Holds the aggregate data model, the marker-based behavior classifier, the
//! daily / monthly window policy, file-name attribution, the error taxonomy
//! and command-line settings shared by the other crates.

pub mod attribution;
pub mod error;
pub mod formatting;
pub mod markers;
pub mod models;
pub mod settings;
pub mod time_utils;
pub mod window;

pub use error::{Result, StatsError};
