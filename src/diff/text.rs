use super::model::TextDiff;

/// Compares two texts line by line and reports the first divergence.
pub fn diff_text(previous: &str, current: &str) -> TextDiff {
    let previous_lines: Vec<&str> = previous.split('\n').collect();
    let current_lines: Vec<&str> = current.split('\n').collect();

    let diverging = previous_lines
        .iter()
        .zip(current_lines.iter())
        .position(|(before, after)| before != after);

    if let Some(index) = diverging {
        return TextDiff::LineChanged {
            line: index + 1,
            previous: previous_lines[index].to_string(),
            current: current_lines[index].to_string(),
        };
    }

    if previous_lines.len() != current_lines.len() {
        return TextDiff::LineCount {
            previous: previous_lines.len(),
            current: current_lines.len(),
        };
    }

    TextDiff::Identical
}
