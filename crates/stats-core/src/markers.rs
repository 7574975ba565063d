//! Marker configuration and the substring-based behavior classifier.
//!
//! A [`MarkerSet`] maps fixed strings to [`BehaviorTag`]s. Matching is plain,
//! case-sensitive substring containment; every marker found in a line yields
//! one tag, so a single line may count for several behaviors at once.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};
use crate::models::BehaviorTag;

// ── Default markers ───────────────────────────────────────────────────────────

/// Primary assistant: an inline completion was accepted with Tab.
pub const PRIMARY_CODE_MARKER: &str =
    "com.alibabacloud.intellij.cosy.editor.CosyEditorActionHandler - execute action:EditorTab";

/// Primary assistant: a chat model was selected for a question.
pub const PRIMARY_QUERY_MARKER: &str = "Select model is";

/// Secondary assistant: completions endpoint.
pub const SECONDARY_CODE_MARKER: &str =
    "https://proxy.individual.githubcopilot.com/v1/engines/copilot-codex/completions";

/// Secondary assistant: chat completions endpoint.
pub const SECONDARY_QUERY_MARKER: &str = "https://api.individual.githubcopilot.com/chat/completions";

// ── Marker ────────────────────────────────────────────────────────────────────

/// One substring and the tag it counts towards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub tag: BehaviorTag,
    pub pattern: String,
}

impl Marker {
    pub fn new(tag: BehaviorTag, pattern: impl Into<String>) -> Self {
        Self {
            tag,
            pattern: pattern.into(),
        }
    }
}

// ── MarkerSet ─────────────────────────────────────────────────────────────────

/// The configured markers plus display names of the two assistant backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSet {
    /// Display name of the primary assistant, used in report headers.
    #[serde(default = "default_primary_tool")]
    pub primary_tool: String,
    /// Display name of the secondary assistant, used in report headers.
    #[serde(default = "default_secondary_tool")]
    pub secondary_tool: String,
    pub markers: Vec<Marker>,
}

fn default_primary_tool() -> String {
    "Lingma".to_string()
}

fn default_secondary_tool() -> String {
    "Copilot".to_string()
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self {
            primary_tool: default_primary_tool(),
            secondary_tool: default_secondary_tool(),
            markers: vec![
                Marker::new(BehaviorTag::PrimaryToolCodeAction, PRIMARY_CODE_MARKER),
                Marker::new(BehaviorTag::PrimaryToolQueryAction, PRIMARY_QUERY_MARKER),
                Marker::new(BehaviorTag::SecondaryToolCodeAction, SECONDARY_CODE_MARKER),
                Marker::new(BehaviorTag::SecondaryToolQueryAction, SECONDARY_QUERY_MARKER),
            ],
        }
    }
}

impl MarkerSet {
    /// Build a validated set from explicit markers with default tool names.
    pub fn new(markers: Vec<Marker>) -> Result<Self> {
        let set = Self {
            markers,
            ..Self::default()
        };
        set.validate()?;
        Ok(set)
    }

    /// Parse and validate a JSON marker document.
    pub fn from_json(content: &str) -> Result<Self> {
        let set: MarkerSet = serde_json::from_str(content)?;
        set.validate()?;
        Ok(set)
    }

    /// Load a JSON marker document from disk.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| StatsError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Reject markers that target `TotalRecords` or have an empty pattern.
    pub fn validate(&self) -> Result<()> {
        for marker in &self.markers {
            if marker.tag == BehaviorTag::TotalRecords {
                return Err(StatsError::MarkerConfig(format!(
                    "marker \"{}\" cannot target {}",
                    marker.pattern, marker.tag
                )));
            }
            if marker.pattern.is_empty() {
                return Err(StatsError::MarkerConfig(format!(
                    "empty pattern for {}",
                    marker.tag
                )));
            }
        }
        Ok(())
    }
}

// ── BehaviorClassifier ────────────────────────────────────────────────────────

/// Pure line classifier over a [`MarkerSet`].
#[derive(Debug, Clone, Default)]
pub struct BehaviorClassifier {
    markers: MarkerSet,
}

impl BehaviorClassifier {
    pub fn new(markers: MarkerSet) -> Self {
        Self { markers }
    }

    /// Tags of every marker contained in `line`, in marker order.
    ///
    /// `TotalRecords` is never returned; callers count it unconditionally.
    pub fn classify(&self, line: &str) -> Vec<BehaviorTag> {
        self.markers
            .markers
            .iter()
            .filter(|m| line.contains(m.pattern.as_str()))
            .map(|m| m.tag)
            .collect()
    }
}
