//! Plain-text results screen for a finished set.

use drill_core::format::{format_centiseconds, pluralize};
use drill_core::{BestResult, Problem, SetSummary};

/// Render the summary, the bests and the problem list.
///
/// With `mark_records`, new records get a trailing `*`. The window of
/// `highlight` (an index into `bests`) is marked in the problem list: `>`
/// for problems that count, `x` for trimmed ones.
pub fn render_results(
    problems: &[Problem],
    bests: &[BestResult],
    mark_records: bool,
    highlight: Option<usize>,
) -> String {
    let summary = SetSummary::of(problems);
    let mut out = format!(
        "{} in {}\n\n",
        pluralize("problem", summary.problem_count),
        format_centiseconds(summary.total_centiseconds)
    );

    let mut rows = vec![(
        "Set mean:".to_string(),
        format_centiseconds(summary.mean_centiseconds),
    )];
    for best in bests {
        let mut value = format_centiseconds(u64::from(best.centiseconds));
        if mark_records && best.is_new_record {
            value.push_str(" *");
        }
        rows.push((format!("Best {}:", best.format()), value));
    }
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    for (label, value) in &rows {
        out.push_str(&format!("  {label:<width$}  {value}\n"));
    }
    out.push('\n');

    let selected = highlight.and_then(|i| bests.get(i));
    for (i, problem) in problems.iter().enumerate() {
        let marker = match selected {
            Some(best) if best.excluded_indices.contains(&i) => 'x',
            Some(best) if best.covers(i) => '>',
            _ => ' ',
        };
        out.push_str(&format!(
            "{marker} {:>4}. {}: {}\n",
            i + 1,
            problem.as_operands(),
            format_centiseconds(u64::from(problem.centiseconds))
        ));
    }
    out
}

/// The best worth pointing at: the longest new record, else the longest best.
pub fn default_highlight(bests: &[BestResult]) -> Option<usize> {
    bests
        .iter()
        .rposition(|b| b.is_new_record)
        .or_else(|| bests.len().checked_sub(1))
}
