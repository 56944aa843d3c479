use chrono::{DateTime, Utc};

use crate::workbench::TestRecord;

const BOM: char = '\u{feff}';
const COLUMNS: [&str; 7] = ["Key", "Group", "Method", "URL", "Status", "Response", "Timestamp"];

/// Renders the record set as a UTF-8 CSV report with a leading BOM so
/// spreadsheet tools pick the right encoding.
pub fn export_csv(records: &[TestRecord]) -> String {
    let mut out = String::new();
    out.push(BOM);
    out.push_str(&COLUMNS.join(","));
    out.push('\n');

    for record in records {
        let response = match &record.response {
            Some(response) => response
                .error
                .clone()
                .unwrap_or_else(|| response.body.to_text()),
            None => "N/A".to_string(),
        };
        let row = [
            record.key.as_str(),
            record.group.as_str(),
            record.request.method.as_str(),
            record.request.url.as_str(),
            &record.status.to_string(),
            &response,
            &record.timestamp.to_rfc3339(),
        ]
        .iter()
        .map(|field| quote(field))
        .collect::<Vec<_>>()
        .join(",");
        out.push_str(&row);
        out.push('\n');
    }

    out
}

pub fn report_file_name(now: DateTime<Utc>) -> String {
    format!("api-test-report-{}.csv", now.format("%Y-%m-%dT%H-%M-%S"))
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
