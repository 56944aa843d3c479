use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Added,
    Removed,
    ValueChanged,
    TypeChanged,
}

impl DiffKind {
    pub fn label(self) -> &'static str {
        match self {
            DiffKind::Added => "added",
            DiffKind::Removed => "removed",
            DiffKind::ValueChanged => "value changed",
            DiffKind::TypeChanged => "type changed",
        }
    }
}

/// One located difference. `old` is absent for additions, `new` for removals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferenceEntry {
    pub path: String,
    pub kind: DiffKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
}

impl DifferenceEntry {
    pub fn added(path: impl Into<String>, new: Value) -> Self {
        Self {
            path: path.into(),
            kind: DiffKind::Added,
            old: None,
            new: Some(new),
        }
    }

    pub fn removed(path: impl Into<String>, old: Value) -> Self {
        Self {
            path: path.into(),
            kind: DiffKind::Removed,
            old: Some(old),
            new: None,
        }
    }

    pub fn value_changed(path: impl Into<String>, old: Value, new: Value) -> Self {
        Self {
            path: path.into(),
            kind: DiffKind::ValueChanged,
            old: Some(old),
            new: Some(new),
        }
    }

    pub fn type_changed(path: impl Into<String>, old: Value, new: Value) -> Self {
        Self {
            path: path.into(),
            kind: DiffKind::TypeChanged,
            old: Some(old),
            new: Some(new),
        }
    }
}

/// Outcome of the line-oriented fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TextDiff {
    Identical,
    /// First diverging line, 1-based.
    LineChanged {
        line: usize,
        previous: String,
        current: String,
    },
    LineCount {
        previous: usize,
        current: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DiffReport {
    Structural { entries: Vec<DifferenceEntry> },
    Text { outcome: TextDiff },
}

impl DiffReport {
    pub fn is_identical(&self) -> bool {
        match self {
            DiffReport::Structural { entries } => entries.is_empty(),
            DiffReport::Text { outcome } => *outcome == TextDiff::Identical,
        }
    }

    /// Structural entries; empty for text reports.
    pub fn entries(&self) -> &[DifferenceEntry] {
        match self {
            DiffReport::Structural { entries } => entries,
            DiffReport::Text { .. } => &[],
        }
    }

    pub fn paths_of(&self, kind: DiffKind) -> BTreeSet<String> {
        self.entries()
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| entry.path.clone())
            .collect()
    }

    pub fn summary(&self) -> String {
        match self {
            _ if self.is_identical() => "No difference".to_string(),
            DiffReport::Structural { entries } if entries.len() == 1 => {
                "1 difference".to_string()
            }
            DiffReport::Structural { entries } => format!("{} differences", entries.len()),
            DiffReport::Text {
                outcome: TextDiff::LineChanged { line, .. },
            } => format!("Line {line} differs"),
            DiffReport::Text {
                outcome: TextDiff::LineCount { previous, current },
            } => format!("Different number of lines ({previous} vs {current})"),
            DiffReport::Text {
                outcome: TextDiff::Identical,
            } => "No difference".to_string(),
        }
    }
}
