use serde::{Deserialize, Serialize};

use crate::diff::{DiffReport, KeySetSummary};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    /// Every record against the first record of its group.
    #[default]
    Base,
    /// Every record against its predecessor.
    Adjacent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairwiseDiff {
    pub record_id: String,
    pub against_id: String,
    pub report: DiffReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDiffs {
    pub base_id: String,
    pub diffs: Vec<PairwiseDiff>,
    pub key_summary: KeySetSummary,
}

impl GroupDiffs {
    pub fn is_uniform(&self) -> bool {
        self.key_summary.is_empty() && self.diffs.iter().all(|diff| diff.report.is_identical())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupComparison {
    pub key: String,
    /// Records with a response, oldest first.
    pub record_ids: Vec<String>,
    /// Records of the group that have no response yet.
    pub skipped: Vec<String>,
    /// Absent when fewer than two records have a response.
    pub section: Option<GroupDiffs>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub mode: CompareMode,
    pub groups: Vec<GroupComparison>,
}
