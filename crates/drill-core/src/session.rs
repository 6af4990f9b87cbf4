//! One timed set: generates problems, checks answers, collects the solved
//! sequence. The caller owns the clock and decides when to stop.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DrillError, DrillResult};
use crate::generator::generate;
use crate::problem::{OperandLengths, Operands, Operation, Problem};
use crate::set::{SetCategory, SolvedSet};

pub const MAX_PROBLEM_COUNT: usize = 1000;

// ---------------------------------------------------------------------------
// SetSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetSettings {
    pub operation: Operation,
    pub operand_lengths: OperandLengths,
    pub problem_count: usize,
}

impl SetSettings {
    /// Validates the lengths against `max_operand_length`, bounds the problem
    /// count to `1..=MAX_PROBLEM_COUNT`, and shortens the second operand of a
    /// subtraction or division to the length of the first.
    pub fn new(
        operation: Operation,
        operand_lengths: OperandLengths,
        problem_count: usize,
        max_operand_length: u32,
    ) -> DrillResult<Self> {
        let mut operand_lengths = OperandLengths::with_max(
            operand_lengths.first(),
            operand_lengths.second(),
            max_operand_length,
        )?;
        if operation.requires_ordered_lengths() {
            operand_lengths = operand_lengths.ordered();
        }
        let bounded = problem_count.clamp(1, MAX_PROBLEM_COUNT);
        if bounded != problem_count {
            tracing::warn!(
                requested = problem_count,
                used = bounded,
                "problem count out of range, clamped"
            );
        }
        Ok(Self {
            operation,
            operand_lengths,
            problem_count: bounded,
        })
    }

    pub fn category(&self) -> SetCategory {
        SetCategory {
            operation: self.operation,
            operand_lengths: self.operand_lengths,
        }
    }
}

// ---------------------------------------------------------------------------
// Answer input
// ---------------------------------------------------------------------------

/// Order in which answer digits are typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputDirection {
    #[default]
    LeftToRight,
    /// Least significant digit first, the way answers are worked out on paper.
    RightToLeft,
}

/// Parse a typed answer. An optional leading `-` is allowed; everything else
/// must be a digit, and no more than `max_digits` of them.
pub fn parse_answer(input: &str, direction: InputDirection, max_digits: usize) -> DrillResult<i128> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DrillError::InvalidAnswer(input.to_string()));
    }
    if digits.len() > max_digits {
        return Err(DrillError::InvalidAnswer(format!(
            "{input} is longer than {max_digits} digits"
        )));
    }
    let ordered: String = match direction {
        InputDirection::LeftToRight => digits.to_string(),
        InputDirection::RightToLeft => digits.chars().rev().collect(),
    };
    let value: i128 = ordered
        .parse()
        .map_err(|_| DrillError::InvalidAnswer(input.to_string()))?;
    Ok(if negative { -value } else { value })
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Correct(Problem),
    Incorrect,
}

pub struct Session<R> {
    rng: R,
    settings: SetSettings,
    current: Operands,
    solved: Vec<Problem>,
    started_at: DateTime<Utc>,
}

impl<R: Rng> Session<R> {
    pub fn new(mut rng: R, settings: SetSettings) -> DrillResult<Self> {
        let current = generate(&mut rng, settings.operation, settings.operand_lengths)?;
        Ok(Self {
            rng,
            settings,
            current,
            solved: Vec::new(),
            started_at: Utc::now(),
        })
    }

    pub fn settings(&self) -> &SetSettings {
        &self.settings
    }

    /// The problem waiting for an answer.
    pub fn current(&self) -> &Operands {
        &self.current
    }

    /// 1-based number of the current problem.
    pub fn problem_number(&self) -> usize {
        self.solved.len() + 1
    }

    pub fn solved(&self) -> &[Problem] {
        &self.solved
    }

    pub fn is_complete(&self) -> bool {
        self.solved.len() >= self.settings.problem_count
    }

    /// Check `answer` against the current problem. A correct answer is
    /// recorded with `elapsed` as its solve time and the next problem is
    /// generated; a wrong one leaves the current problem in place.
    pub fn submit(&mut self, answer: i128, elapsed: Duration) -> DrillResult<Submission> {
        if self.is_complete() {
            return Err(DrillError::InvalidAnswer("set is already complete".into()));
        }
        if answer != self.current.correct_answer() {
            return Ok(Submission::Incorrect);
        }

        let problem = Problem::new(self.current, self.settings.operand_lengths, elapsed);
        self.solved.push(problem.clone());
        if !self.is_complete() {
            self.current = generate(
                &mut self.rng,
                self.settings.operation,
                self.settings.operand_lengths,
            )?;
        }
        Ok(Submission::Correct(problem))
    }

    /// End the set, complete or not, and hand back what was solved.
    pub fn finish(self) -> SolvedSet {
        SolvedSet::new(self.settings.category(), self.started_at, self.solved)
    }
}
