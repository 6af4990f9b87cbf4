use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::problem::{OperandLengths, Operation, Problem};
use crate::record::RecordFormat;

// ---------------------------------------------------------------------------
// SetCategory
// ---------------------------------------------------------------------------

/// Settings a set was played under. Records are kept per category, so a
/// two-digit multiplication best never competes with a one-digit one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SetCategory {
    pub operation: Operation,
    pub operand_lengths: OperandLengths,
}

impl fmt::Display for SetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{}{}",
            self.operation,
            self.operand_lengths.first(),
            self.operation.symbol(),
            self.operand_lengths.second()
        )
    }
}

// ---------------------------------------------------------------------------
// SolvedSet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolvedSet {
    pub id: String,
    pub category: SetCategory,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub problems: Vec<Problem>,
}

impl SolvedSet {
    pub fn new(category: SetCategory, started_at: DateTime<Utc>, problems: Vec<Problem>) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            category,
            started_at,
            finished_at: Utc::now(),
            problems,
        }
    }

    pub fn total_centiseconds(&self) -> u64 {
        self.problems.iter().map(|p| u64::from(p.centiseconds)).sum()
    }
}

// ---------------------------------------------------------------------------
// RecordEntry
// ---------------------------------------------------------------------------

/// All-time best for one format within a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEntry {
    pub category: SetCategory,
    pub format: RecordFormat,
    pub centiseconds: u32,
    pub set_id: String,
    pub start_index: usize,
    pub achieved_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// SetOverview / StoreStats
// ---------------------------------------------------------------------------

/// A stored set without its problems.
#[derive(Debug, Clone)]
pub struct SetOverview {
    pub id: String,
    pub category: SetCategory,
    pub problem_count: usize,
    pub total_centiseconds: u64,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StoreStats {
    pub total_sets: usize,
    pub total_problems: usize,
    pub total_records: usize,
    pub first_set: Option<DateTime<Utc>>,
    pub last_set: Option<DateTime<Utc>>,
}
