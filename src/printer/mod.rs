use colored::{Color, ColoredString, Colorize};
use serde_json::Value;

use crate::archive::SnapshotEntry;
use crate::compare::{ComparisonReport, GroupComparison};
use crate::diff::{DiffKind, DiffReport, DifferenceEntry, KeySetSummary, TextDiff};
use crate::workbench::{BatchOutcome, RecordStatus, Stats, TestRecord};

const PREVIEW_LIMIT: usize = 80;

fn http_status_color(status: u16) -> Color {
    if status == 0 || status >= 400 {
        Color::Red
    } else if status >= 300 {
        Color::Yellow
    } else {
        Color::Green
    }
}

fn status_badge(status: RecordStatus) -> ColoredString {
    let label = format!("{:<10}", status.to_string());
    match status {
        RecordStatus::Pending => label.dimmed(),
        RecordStatus::Processing => label.yellow(),
        RecordStatus::Success => label.green(),
        RecordStatus::Error => label.red(),
    }
}

fn kind_color(kind: DiffKind) -> Color {
    match kind {
        DiffKind::Added => Color::Green,
        DiffKind::Removed => Color::Red,
        DiffKind::ValueChanged => Color::Yellow,
        DiffKind::TypeChanged => Color::Magenta,
    }
}

fn render_value(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() > PREVIEW_LIMIT {
        let truncated: String = text.chars().take(PREVIEW_LIMIT).collect();
        format!("{truncated}…")
    } else {
        text
    }
}

pub(crate) fn format_entry(entry: &DifferenceEntry) -> String {
    let detail = match (&entry.old, &entry.new) {
        (Some(old), Some(new)) => format!("{} -> {}", render_value(old), render_value(new)),
        (None, Some(new)) => render_value(new),
        (Some(old), None) => render_value(old),
        (None, None) => String::new(),
    };
    format!(
        "{} {} {}",
        format!("{:<13}", entry.kind.label()).color(kind_color(entry.kind)),
        entry.path.cyan(),
        detail.dimmed()
    )
}

pub fn print_records(records: &[TestRecord]) {
    if records.is_empty() {
        println!("{}", "No tests yet. Add one with `curldiff add`.".dimmed());
        return;
    }

    for record in records {
        let response = match &record.response {
            Some(response) => format!("{}", response.status)
                .color(http_status_color(response.status))
                .to_string(),
            None => "-".dimmed().to_string(),
        };
        let diff = record
            .diff
            .as_ref()
            .map(|report| report.summary())
            .unwrap_or_default();
        println!(
            "{} {} {} {} {} {} {}",
            status_badge(record.status),
            record.id.dimmed(),
            record.key.bold(),
            format!("[{}]", record.group).dimmed(),
            format!("{} {}", record.request.method, record.request.url).cyan(),
            response,
            diff.yellow()
        );
    }
}

pub fn print_record(record: &TestRecord) {
    println!("{} {}", "Test".bold(), record.id.cyan());
    println!("{} {}", "Key:".bold(), record.key);
    println!("{} {}", "Group:".bold(), record.group);
    println!("{} {}", "Status:".bold(), status_badge(record.status));
    println!(
        "{} {}",
        "Created:".bold(),
        record.timestamp.to_rfc3339().dimmed()
    );

    println!(
        "{} {}",
        record.request.method.bold(),
        record.request.url.cyan()
    );
    if !record.request.headers.is_empty() {
        println!("{}", "Request headers".bold());
        for (name, value) in &record.request.headers {
            println!("  {}: {}", name.cyan(), value.dimmed());
        }
    }
    if record.request.carries_payload() {
        println!("{}", "Payload".bold());
        println!("{}", record.request.payload.dimmed());
    }

    if let Some(response) = &record.response {
        println!(
            "{} {} {} {}",
            "Response:".bold(),
            format!("{}", response.status).color(http_status_color(response.status)),
            response.status_text,
            format!("({:.1} ms)", response.duration_ms).dimmed()
        );
        if let Some(error) = &response.error {
            println!("{} {}", "Error:".bold(), error.red());
        }
        if !response.headers.is_empty() {
            println!("{}", "Response headers".bold());
            for (name, value) in &response.headers {
                println!("  {}: {}", name.cyan(), value.dimmed());
            }
        }
        println!("{}", "Body".bold());
        println!("{}", response.body.to_pretty_text());
    }

    if let Some(report) = &record.diff {
        println!("{}", "Diff against previous".bold());
        print_diff_report(report);
    }
}

pub fn print_diff_report(report: &DiffReport) {
    let summary = report.summary();
    if report.is_identical() {
        println!("{}", summary.green());
        return;
    }
    println!("{}", summary.yellow());

    match report {
        DiffReport::Structural { entries } => {
            for entry in entries {
                println!("  {}", format_entry(entry));
            }
        }
        DiffReport::Text {
            outcome:
                TextDiff::LineChanged {
                    previous, current, ..
                },
        } => {
            println!("  {} {}", "-".red(), previous.red());
            println!("  {} {}", "+".green(), current.green());
        }
        DiffReport::Text { .. } => {}
    }
}

fn print_key_summary(summary: &KeySetSummary) {
    if summary.is_empty() {
        println!("  {}", "Key sets match".green());
        return;
    }
    for key in &summary.added {
        println!("  {} {}", "+ key".green(), key.cyan());
    }
    for key in &summary.removed {
        println!("  {} {}", "- key".red(), key.cyan());
    }
}

fn print_group(group: &GroupComparison) {
    println!(
        "{} {}",
        group.key.bold(),
        format!("({} responses)", group.record_ids.len()).dimmed()
    );
    if !group.skipped.is_empty() {
        println!(
            "  {} {}",
            "Skipped (no response):".dimmed(),
            group.skipped.join(", ").dimmed()
        );
    }

    let Some(section) = &group.section else {
        println!("  {}", "Nothing to compare".dimmed());
        return;
    };

    println!("  {} {}", "Base:".bold(), section.base_id.cyan());
    for pairwise in &section.diffs {
        println!(
            "  {} {} {}",
            pairwise.record_id.cyan(),
            format!("vs {}", pairwise.against_id).dimmed(),
            if pairwise.report.is_identical() {
                pairwise.report.summary().green()
            } else {
                pairwise.report.summary().yellow()
            }
        );
        for entry in pairwise.report.entries() {
            println!("    {}", format_entry(entry));
        }
    }
    print_key_summary(&section.key_summary);
}

pub fn print_comparison(report: &ComparisonReport) {
    if report.groups.is_empty() {
        println!("{}", "No tests to compare".dimmed());
        return;
    }
    for group in &report.groups {
        print_group(group);
    }
}

pub fn print_stats(stats: &Stats) {
    println!("{} {}", "Total:".bold(), stats.total);
    println!("{} {}", "Success:".bold(), stats.success.to_string().green());
    println!("{} {}", "Error:".bold(), stats.error.to_string().red());
    println!("{} {}", "Pending:".bold(), stats.pending.to_string().dimmed());
    if stats.processing > 0 {
        println!(
            "{} {}",
            "Processing:".bold(),
            stats.processing.to_string().yellow()
        );
    }
}

pub fn print_batch_outcome(outcome: &BatchOutcome) {
    println!(
        "{} {} {} {}",
        "Ran".bold(),
        outcome.total,
        format!("{} ok", outcome.succeeded).green(),
        format!("{} failed", outcome.failed).red()
    );
}

pub fn print_snapshots(entries: &[SnapshotEntry]) {
    if entries.is_empty() {
        println!("{}", "No saved snapshots".dimmed());
        return;
    }
    for entry in entries {
        println!(
            "{} {} {}",
            entry.key.cyan(),
            entry.timestamp.to_rfc3339().dimmed(),
            format!(
                "total {} / success {} / error {} / pending {}",
                entry.stats.total, entry.stats.success, entry.stats.error, entry.stats.pending
            )
            .dimmed()
        );
    }
}
