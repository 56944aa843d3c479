//! Response body comparison.
//!
//! Two bodies are compared structurally when at least one of them is a JSON
//! object or array and both parse as JSON. Everything else falls back to a
//! line-oriented text comparison. Arrays are compared by position only; no
//! element alignment is attempted.

mod keyset;
mod model;
mod structural;
mod text;

use std::borrow::Cow;

use serde_json::Value;

use crate::executor::ResponseBody;

pub use keyset::{flatten_keys, key_set_summary, KeySetDelta, KeySetSummary};
pub use model::{DiffKind, DiffReport, DifferenceEntry, TextDiff};
pub use text::diff_text;

/// Compares `current` against `previous`. Total and deterministic.
pub fn diff(previous: &ResponseBody, current: &ResponseBody) -> DiffReport {
    match (as_json(previous), as_json(current)) {
        (Some(prev), Some(curr)) if is_container(&prev) || is_container(&curr) => {
            DiffReport::Structural {
                entries: structural::structural_diff(&prev, &curr),
            }
        }
        _ => DiffReport::Text {
            outcome: diff_text(&previous.to_text(), &current.to_text()),
        },
    }
}

pub(crate) fn as_json(body: &ResponseBody) -> Option<Cow<'_, Value>> {
    match body {
        ResponseBody::Json(value) => Some(Cow::Borrowed(value)),
        ResponseBody::Raw(text) => serde_json::from_str::<Value>(text).ok().map(Cow::Owned),
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}
