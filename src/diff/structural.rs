use serde_json::{Number, Value};

use super::model::DifferenceEntry;

const ROOT: &str = "root";

pub(super) fn structural_diff(previous: &Value, current: &Value) -> Vec<DifferenceEntry> {
    let mut entries = Vec::new();
    walk(previous, current, "", &mut entries);
    entries
}

fn walk(previous: &Value, current: &Value, path: &str, entries: &mut Vec<DifferenceEntry>) {
    if previous == current {
        return;
    }

    match (previous, current) {
        (Value::Object(before), Value::Object(after)) => {
            for (key, old) in before {
                let child = join_key(path, key);
                match after.get(key) {
                    Some(new) => walk(old, new, &child, entries),
                    None => entries.push(DifferenceEntry::removed(child, old.clone())),
                }
            }
            for (key, new) in after {
                if !before.contains_key(key) {
                    entries.push(DifferenceEntry::added(join_key(path, key), new.clone()));
                }
            }
        }
        (Value::Array(before), Value::Array(after)) => {
            for index in 0..before.len().max(after.len()) {
                let child = join_index(path, index);
                match (before.get(index), after.get(index)) {
                    (Some(old), Some(new)) => walk(old, new, &child, entries),
                    (Some(old), None) => entries.push(DifferenceEntry::removed(child, old.clone())),
                    (None, Some(new)) => entries.push(DifferenceEntry::added(child, new.clone())),
                    (None, None) => {}
                }
            }
        }
        (Value::Number(before), Value::Number(after)) if numbers_equal(before, after) => {}
        _ if kind_of(previous) != kind_of(current) => entries.push(DifferenceEntry::type_changed(
            located(path),
            previous.clone(),
            current.clone(),
        )),
        _ => entries.push(DifferenceEntry::value_changed(
            located(path),
            previous.clone(),
            current.clone(),
        )),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn located(path: &str) -> String {
    if path.is_empty() {
        ROOT.to_string()
    } else {
        path.to_string()
    }
}

/// Integers compare exactly; `f64` is used only when a float is involved,
/// so `1` equals `1.0` but ids above 2^53 stay distinct.
fn numbers_equal(before: &Number, after: &Number) -> bool {
    if before.is_f64() || after.is_f64() {
        return before.as_f64() == after.as_f64();
    }
    match (before.as_i64(), after.as_i64()) {
        (Some(before), Some(after)) => before == after,
        _ => before.as_u64() == after.as_u64(),
    }
}

/// Keys that would read as path syntax are quoted as `["a.b"]`.
pub(super) fn join_key(path: &str, key: &str) -> String {
    let plain = !key.is_empty() && !key.contains(['.', '[', ']']);
    match (plain, path.is_empty()) {
        (true, true) => key.to_string(),
        (true, false) => format!("{path}.{key}"),
        (false, _) => format!("{path}[{}]", Value::String(key.to_string())),
    }
}

pub(super) fn join_index(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn nested_paths_use_dots_and_brackets() {
        let entries = structural_diff(
            &json!({"a": {"b": [{"c": 1}, {"c": 2}]}}),
            &json!({"a": {"b": [{"c": 1}, {"c": 3}]}}),
        );
        assert_eq!(
            entries,
            vec![DifferenceEntry::value_changed("a.b[1].c", json!(2), json!(3))]
        );
    }

    #[test]
    fn arrays_compare_positionally() {
        let entries = structural_diff(&json!([1, 2]), &json!([2, 1, 5]));
        assert_eq!(
            entries,
            vec![
                DifferenceEntry::value_changed("[0]", json!(1), json!(2)),
                DifferenceEntry::value_changed("[1]", json!(2), json!(1)),
                DifferenceEntry::added("[2]", json!(5)),
            ]
        );
    }

    #[test]
    fn object_against_array_is_a_type_change() {
        let entries = structural_diff(&json!({"data": {"id": 1}}), &json!({"data": [1]}));
        assert_eq!(
            entries,
            vec![DifferenceEntry::type_changed(
                "data",
                json!({"id": 1}),
                json!([1])
            )]
        );
    }

    #[test]
    fn integer_and_float_forms_of_a_number_are_equal() {
        assert!(structural_diff(&json!({"n": 1}), &json!({"n": 1.0})).is_empty());
    }

    #[test]
    fn large_integers_compare_exactly() {
        let entries = structural_diff(
            &json!({"id": 1234567890123456789_u64}),
            &json!({"id": 1234567890123456788_u64}),
        );
        assert_eq!(
            entries,
            vec![DifferenceEntry::value_changed(
                "id",
                json!(1234567890123456789_u64),
                json!(1234567890123456788_u64)
            )]
        );

        assert_eq!(
            structural_diff(&json!([-1]), &json!([u64::MAX])).len(),
            1
        );
        assert!(structural_diff(&json!([u64::MAX]), &json!([u64::MAX])).is_empty());
    }

    #[test]
    fn keys_with_path_syntax_are_quoted() {
        let entries = structural_diff(
            &json!({"a.b": 1, "a": {"b": 1, "[0]": 1}, "": 1}),
            &json!({"a.b": 2, "a": {"b": 2, "[0]": 2}, "": 2}),
        );
        let paths: Vec<&str> = entries.iter().map(|entry| entry.path.as_str()).collect();
        assert_eq!(paths, vec![r#"[""]"#, r#"a["[0]"]"#, "a.b", r#"["a.b"]"#]);
    }

    #[test]
    fn paths_are_unique_within_a_report() {
        let entries = structural_diff(
            &json!({"a": 1, "b": {"c": [1, 2, 3]}, "d": null, "e": "x", "b.c": [0]}),
            &json!({"a": "1", "b": {"c": [1], "f": true}, "d": {}, "g": 0, "b.c": [0, 1]}),
        );
        let unique: HashSet<_> = entries.iter().map(|entry| entry.path.as_str()).collect();
        assert_eq!(unique.len(), entries.len());
        assert_eq!(entries.len(), 8);
    }
}
