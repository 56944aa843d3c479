mod model;

use tracing::debug;

use crate::diff::{diff, key_set_summary};
use crate::workbench::TestRecord;

pub use model::{CompareMode, ComparisonReport, GroupComparison, GroupDiffs, PairwiseDiff};

/// Builds the cross-record comparison view.
///
/// Records are grouped by key in first-seen order and ordered by timestamp
/// inside each group. Records without a response are listed as skipped.
pub fn compare(records: &[TestRecord], mode: CompareMode) -> ComparisonReport {
    let mut buckets: Vec<(&str, Vec<&TestRecord>)> = Vec::new();
    for record in records {
        match buckets.iter_mut().find(|(key, _)| *key == record.key) {
            Some((_, members)) => members.push(record),
            None => buckets.push((record.key.as_str(), vec![record])),
        }
    }

    let groups = buckets
        .into_iter()
        .map(|(key, mut members)| {
            members.sort_by_key(|record| record.timestamp);
            compare_group(key, &members, mode)
        })
        .collect();

    ComparisonReport { mode, groups }
}

fn compare_group(key: &str, members: &[&TestRecord], mode: CompareMode) -> GroupComparison {
    let (responded, waiting): (Vec<&TestRecord>, Vec<&TestRecord>) = members
        .iter()
        .copied()
        .partition(|record| record.response.is_some());

    let with_bodies: Vec<(&TestRecord, &crate::executor::ResponseBody)> = responded
        .iter()
        .filter_map(|record| record.response.as_ref().map(|response| (*record, &response.body)))
        .collect();

    let section = match with_bodies.as_slice() {
        [(base, base_body), rest @ ..] if !rest.is_empty() => {
            let diffs = rest
                .iter()
                .enumerate()
                .map(|(index, (record, body))| {
                    let (against, against_body) = match mode {
                        CompareMode::Base => (*base, *base_body),
                        CompareMode::Adjacent => with_bodies[index],
                    };
                    PairwiseDiff {
                        record_id: record.id.clone(),
                        against_id: against.id.clone(),
                        report: diff(against_body, body),
                    }
                })
                .collect();

            let key_summary = key_set_summary(
                base_body,
                rest.iter().map(|(record, body)| (record.id.as_str(), *body)),
            );

            Some(GroupDiffs {
                base_id: base.id.clone(),
                diffs,
                key_summary,
            })
        }
        _ => None,
    };

    debug!(key, records = members.len(), compared = with_bodies.len(), "compared group");

    GroupComparison {
        key: key.to_string(),
        record_ids: responded.iter().map(|record| record.id.clone()).collect(),
        skipped: waiting.iter().map(|record| record.id.clone()).collect(),
        section,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use crate::curl::{Headers, Request};
    use crate::diff::DiffKind;
    use crate::executor::{ResponseBody, ResponseEnvelope};
    use crate::workbench::RecordStatus;

    fn record(id: &str, key: &str, offset_secs: i64, body: Option<Value>) -> TestRecord {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        TestRecord {
            id: id.to_string(),
            group: "Default".to_string(),
            key: key.to_string(),
            curl_raw: String::new(),
            request: Request::default(),
            status: if body.is_some() {
                RecordStatus::Success
            } else {
                RecordStatus::Pending
            },
            response: body.map(|body| ResponseEnvelope {
                status: 200,
                status_text: "OK".to_string(),
                headers: Headers::new(),
                body: ResponseBody::Json(body),
                ok: true,
                error: None,
                duration_ms: 0.0,
            }),
            diff: None,
            timestamp: base + Duration::seconds(offset_secs),
            selected: false,
        }
    }

    #[test]
    fn identical_group_has_no_differences() {
        let body = json!({"data": {"id": 1}});
        let records = vec![
            record("a", "k", 0, Some(body.clone())),
            record("b", "k", 1, Some(body.clone())),
            record("c", "k", 2, Some(body)),
        ];

        let report = compare(&records, CompareMode::Base);
        let section = report.groups[0].section.as_ref().unwrap();

        assert_eq!(section.diffs.len(), 2);
        assert!(section.diffs.iter().all(|d| d.report.entries().is_empty()));
        assert!(section.key_summary.is_empty());
        assert!(section.is_uniform());
    }

    #[test]
    fn groups_keep_first_seen_order_and_sort_by_timestamp() {
        let records = vec![
            record("late", "users", 5, Some(json!({"v": 2}))),
            record("solo", "orders", 1, Some(json!({}))),
            record("early", "users", 0, Some(json!({"v": 1}))),
        ];

        let report = compare(&records, CompareMode::Base);

        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups[0].key, "users");
        assert_eq!(report.groups[0].record_ids, vec!["early", "late"]);
        let section = report.groups[0].section.as_ref().unwrap();
        assert_eq!(section.base_id, "early");
        assert_eq!(section.diffs[0].record_id, "late");
        assert_eq!(section.diffs[0].report.entries()[0].kind, DiffKind::ValueChanged);

        assert_eq!(report.groups[1].key, "orders");
        assert!(report.groups[1].section.is_none());
    }

    #[test]
    fn adjacent_mode_diffs_against_predecessor() {
        let records = vec![
            record("a", "k", 0, Some(json!({"v": 1}))),
            record("b", "k", 1, Some(json!({"v": 2}))),
            record("c", "k", 2, Some(json!({"v": 2, "w": 0}))),
        ];

        let report = compare(&records, CompareMode::Adjacent);
        let section = report.groups[0].section.as_ref().unwrap();

        assert_eq!(section.diffs[0].against_id, "a");
        assert_eq!(section.diffs[1].against_id, "b");
        assert_eq!(
            section.diffs[1].report.paths_of(DiffKind::Added),
            ["w".to_string()].into_iter().collect()
        );
        assert_eq!(section.key_summary.added, ["w".to_string()].into_iter().collect());
    }

    #[test]
    fn records_without_response_are_skipped() {
        let records = vec![
            record("a", "k", 0, Some(json!({}))),
            record("b", "k", 1, None),
        ];

        let report = compare(&records, CompareMode::Base);
        assert_eq!(report.groups[0].record_ids, vec!["a"]);
        assert_eq!(report.groups[0].skipped, vec!["b"]);
        assert!(report.groups[0].section.is_none());
    }
}
