//! Best-window statistics for a finished set.
//!
//! For every record format the set is long enough for, every contiguous
//! window of `problem_count` problems is scored and the fastest one kept.
//! Ties go to the earliest window.

use std::collections::{BTreeMap, HashMap};

use crate::problem::Problem;
use crate::record::{BestResult, CalculationMethod, RecordFormat};

/// Previously recorded best per format, in centiseconds.
pub trait PriorBests {
    fn prior_best(&self, format: &RecordFormat) -> Option<u32>;
}

impl PriorBests for HashMap<RecordFormat, u32> {
    fn prior_best(&self, format: &RecordFormat) -> Option<u32> {
        self.get(format).copied()
    }
}

impl PriorBests for BTreeMap<RecordFormat, u32> {
    fn prior_best(&self, format: &RecordFormat) -> Option<u32> {
        self.get(format).copied()
    }
}

/// No history at all: every best is a new record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

impl PriorBests for NoHistory {
    fn prior_best(&self, _format: &RecordFormat) -> Option<u32> {
        None
    }
}

/// Compute the best window for each format that fits in `problems`, in
/// catalog order.
pub fn compute_bests<H>(problems: &[Problem], formats: &[RecordFormat], history: &H) -> Vec<BestResult>
where
    H: PriorBests + ?Sized,
{
    let times: Vec<u32> = problems.iter().map(|p| p.centiseconds).collect();
    compute_bests_from_times(&times, formats, history)
}

/// Same as [`compute_bests`] over bare solve times.
pub fn compute_bests_from_times<H>(
    times: &[u32],
    formats: &[RecordFormat],
    history: &H,
) -> Vec<BestResult>
where
    H: PriorBests + ?Sized,
{
    formats
        .iter()
        .filter_map(|format| {
            let window = best_window(times, *format)?;
            let centiseconds = window.score();
            let is_new_record = match history.prior_best(format) {
                Some(prior) => centiseconds < prior,
                None => true,
            };
            Some(BestResult {
                problem_count: format.problem_count(),
                calculation_method: format.calculation_method(),
                start_index: window.start,
                excluded_indices: window.excluded,
                centiseconds,
                is_new_record,
            })
        })
        .collect()
}

#[derive(Debug)]
struct ScoredWindow {
    start: usize,
    excluded: Vec<usize>,
    /// Sum of the times that count towards the score.
    total: u64,
    counted: u64,
}

impl ScoredWindow {
    fn score(&self) -> u32 {
        u32::try_from(rounded_mean(self.total, self.counted)).unwrap_or(u32::MAX)
    }
}

fn best_window(times: &[u32], format: RecordFormat) -> Option<ScoredWindow> {
    let size = format.problem_count() as usize;
    if size == 0 || size > times.len() {
        return None;
    }

    let mut best: Option<ScoredWindow> = None;
    for (start, window) in times.windows(size).enumerate() {
        let scored = score_window(start, window, format.calculation_method());
        // Windows compare on the rounded score; equal scores keep the earlier one.
        if best.as_ref().is_none_or(|b| scored.score() < b.score()) {
            best = Some(scored);
        }
    }
    best
}

fn score_window(start: usize, window: &[u32], method: CalculationMethod) -> ScoredWindow {
    let total: u64 = window.iter().map(|&t| u64::from(t)).sum();
    match method {
        CalculationMethod::Single | CalculationMethod::Mean => ScoredWindow {
            start,
            excluded: Vec::new(),
            total,
            counted: window.len() as u64,
        },
        CalculationMethod::Average => {
            let (fastest, slowest) = trimmed_positions(window);
            let mut excluded = vec![start + fastest, start + slowest];
            excluded.sort_unstable();
            ScoredWindow {
                start,
                excluded,
                total: total - u64::from(window[fastest]) - u64::from(window[slowest]),
                counted: window.len() as u64 - 2,
            }
        }
    }
}

/// Positions of the fastest and slowest time, earliest on ties. The two are
/// always distinct, so a window of equal times drops its first two entries.
fn trimmed_positions(window: &[u32]) -> (usize, usize) {
    let mut fastest = 0;
    for (i, &t) in window.iter().enumerate() {
        if t < window[fastest] {
            fastest = i;
        }
    }
    let mut slowest: Option<usize> = None;
    for (i, &t) in window.iter().enumerate() {
        if i == fastest {
            continue;
        }
        if slowest.is_none_or(|s| t > window[s]) {
            slowest = Some(i);
        }
    }
    (fastest, slowest.unwrap_or(fastest))
}

/// Mean rounded half up.
pub fn rounded_mean(total: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    (2 * total + count) / (2 * count)
}

// ---------------------------------------------------------------------------
// SetSummary
// ---------------------------------------------------------------------------

/// Totals shown at the top of the results screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetSummary {
    pub problem_count: usize,
    pub total_centiseconds: u64,
    pub mean_centiseconds: u64,
}

impl SetSummary {
    pub fn of(problems: &[Problem]) -> Self {
        let total_centiseconds = problems.iter().map(|p| u64::from(p.centiseconds)).sum();
        Self {
            problem_count: problems.len(),
            total_centiseconds,
            mean_centiseconds: rounded_mean(total_centiseconds, problems.len() as u64),
        }
    }
}
