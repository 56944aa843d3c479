use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    as_json,
    structural::{join_index, join_key},
};
use crate::executor::ResponseBody;

/// Keys one record gained or lost relative to the base record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySetDelta {
    pub record_id: String,
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySetSummary {
    pub deltas: Vec<KeySetDelta>,
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
}

impl KeySetSummary {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Every object key at every nesting level, as dotted paths. Array elements
/// contribute `[i]` segments but are not keys themselves.
pub fn flatten_keys(value: &Value) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    collect(value, "", &mut keys);
    keys
}

fn collect(value: &Value, path: &str, keys: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = join_key(path, key);
                collect(child, &child_path, keys);
                keys.insert(child_path);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect(child, &join_index(path, index), keys);
            }
        }
        _ => {}
    }
}

fn body_keys(body: &ResponseBody) -> BTreeSet<String> {
    as_json(body)
        .map(|value| flatten_keys(&value))
        .unwrap_or_default()
}

/// Compares the flattened key set of each record in `others` with `base`.
pub fn key_set_summary<'a, I>(base: &ResponseBody, others: I) -> KeySetSummary
where
    I: IntoIterator<Item = (&'a str, &'a ResponseBody)>,
{
    let base_keys = body_keys(base);
    let mut summary = KeySetSummary::default();

    for (record_id, body) in others {
        let keys = body_keys(body);
        let added: BTreeSet<String> = keys.difference(&base_keys).cloned().collect();
        let removed: BTreeSet<String> = base_keys.difference(&keys).cloned().collect();

        summary.added.extend(added.iter().cloned());
        summary.removed.extend(removed.iter().cloned());
        summary.deltas.push(KeySetDelta {
            record_id: record_id.to_string(),
            added,
            removed,
        });
    }

    summary
}
