use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DrillError, DrillResult};

/// Largest operand length the generator accepts. Products of two operands of
/// this length still fit in an `i128`.
pub const MAX_SUPPORTED_OPERAND_LENGTH: u32 = 18;

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// Operation selected for a set. `All` picks one of the four arithmetic
/// operations at random for every problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    All,
}

impl Operation {
    /// The concrete operation, or `None` for `All`.
    pub fn resolved(self) -> Option<ResolvedOperation> {
        match self {
            Self::Addition => Some(ResolvedOperation::Addition),
            Self::Subtraction => Some(ResolvedOperation::Subtraction),
            Self::Multiplication => Some(ResolvedOperation::Multiplication),
            Self::Division => Some(ResolvedOperation::Division),
            Self::All => None,
        }
    }

    pub fn symbol(self) -> char {
        match self.resolved() {
            Some(op) => op.symbol(),
            None => '○',
        }
    }

    /// Subtraction and division expect the second operand to be no longer
    /// than the first.
    pub fn requires_ordered_lengths(self) -> bool {
        matches!(self, Self::Subtraction | Self::Division)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Addition => write!(f, "addition"),
            Self::Subtraction => write!(f, "subtraction"),
            Self::Multiplication => write!(f, "multiplication"),
            Self::Division => write!(f, "division"),
            Self::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for Operation {
    type Err = DrillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "addition" | "add" | "+" => Ok(Self::Addition),
            "subtraction" | "sub" | "-" => Ok(Self::Subtraction),
            "multiplication" | "mul" | "*" | "x" => Ok(Self::Multiplication),
            "division" | "div" | "/" => Ok(Self::Division),
            "all" => Ok(Self::All),
            _ => Err(DrillError::InvalidOperation(s.to_string())),
        }
    }
}

/// One of the four arithmetic operations. A generated problem always carries
/// one of these, never `Operation::All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedOperation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl ResolvedOperation {
    pub fn symbol(self) -> char {
        match self {
            Self::Addition => '+',
            Self::Subtraction => '−',
            Self::Multiplication => '×',
            Self::Division => '÷',
        }
    }
}

impl From<ResolvedOperation> for Operation {
    fn from(op: ResolvedOperation) -> Self {
        match op {
            ResolvedOperation::Addition => Self::Addition,
            ResolvedOperation::Subtraction => Self::Subtraction,
            ResolvedOperation::Multiplication => Self::Multiplication,
            ResolvedOperation::Division => Self::Division,
        }
    }
}

impl fmt::Display for ResolvedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Operation::from(*self).fmt(f)
    }
}

impl std::str::FromStr for ResolvedOperation {
    type Err = DrillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Operation>()?
            .resolved()
            .ok_or_else(|| DrillError::InvalidOperation(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// OperandLengths
// ---------------------------------------------------------------------------

/// Target digit lengths of the two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[u32; 2]", into = "[u32; 2]")]
pub struct OperandLengths([u32; 2]);

impl OperandLengths {
    pub const SINGLE_DIGITS: Self = Self([1, 1]);

    pub fn new(first: u32, second: u32) -> DrillResult<Self> {
        Self::with_max(first, second, MAX_SUPPORTED_OPERAND_LENGTH)
    }

    /// Like [`OperandLengths::new`] but bounded by a configured maximum.
    pub fn with_max(first: u32, second: u32, max: u32) -> DrillResult<Self> {
        let max = max.min(MAX_SUPPORTED_OPERAND_LENGTH);
        for length in [first, second] {
            if length == 0 || length > max {
                return Err(DrillError::InvalidOperandLength { length, max });
            }
        }
        Ok(Self([first, second]))
    }

    pub fn first(&self) -> u32 {
        self.0[0]
    }

    pub fn second(&self) -> u32 {
        self.0[1]
    }

    pub fn is_equal(&self) -> bool {
        self.0[0] == self.0[1]
    }

    /// Second length clamped to the first, as subtraction and division expect.
    pub fn ordered(self) -> Self {
        Self([self.0[0], self.0[1].min(self.0[0])])
    }
}

impl TryFrom<[u32; 2]> for OperandLengths {
    type Error = DrillError;

    fn try_from(value: [u32; 2]) -> Result<Self, Self::Error> {
        Self::new(value[0], value[1])
    }
}

impl From<OperandLengths> for [u32; 2] {
    fn from(value: OperandLengths) -> Self {
        value.0
    }
}

impl fmt::Display for OperandLengths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.0[0], self.0[1])
    }
}

impl std::str::FromStr for OperandLengths {
    type Err = DrillError;

    /// Accepts `"2,1"`, `"2x1"` or a single `"2"` for equal lengths.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| DrillError::Config(format!("invalid operand lengths: {s}")))
        };
        match s.split_once([',', 'x']) {
            Some((a, b)) => Self::new(parse(a)?, parse(b)?),
            None => {
                let length = parse(s)?;
                Self::new(length, length)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Operands
// ---------------------------------------------------------------------------

/// A generated, not yet solved, problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operands {
    pub operation: ResolvedOperation,
    pub operands: [u64; 2],
}

impl Operands {
    /// Operands read back from outside the generator. Rejects a zero divisor.
    pub fn new(operation: ResolvedOperation, operands: [u64; 2]) -> DrillResult<Self> {
        if operation == ResolvedOperation::Division && operands[1] == 0 {
            return Err(DrillError::InvalidOperation(format!(
                "{} ÷ 0 has no answer",
                operands[0]
            )));
        }
        Ok(Self {
            operation,
            operands,
        })
    }

    pub fn correct_answer(&self) -> i128 {
        let [a, b] = self.operands.map(i128::from);
        match self.operation {
            ResolvedOperation::Addition => a + b,
            ResolvedOperation::Subtraction => a - b,
            ResolvedOperation::Multiplication => a * b,
            // Divisors come from the generator or `Operands::new`, never zero.
            ResolvedOperation::Division => a / b,
        }
    }

    /// Longest answer, in digits, worth accepting for this problem.
    pub fn max_answer_length(&self) -> usize {
        let [a, b] = self.operands.map(digit_count);
        match self.operation {
            ResolvedOperation::Addition => a.max(b) + 1,
            // Unequal lengths can make the difference negative.
            ResolvedOperation::Subtraction => a.max(b),
            ResolvedOperation::Division => a,
            ResolvedOperation::Multiplication => a + b,
        }
    }
}

impl fmt::Display for Operands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.operands[0],
            self.operation.symbol(),
            self.operands[1]
        )
    }
}

pub fn digit_count(value: u64) -> usize {
    value.checked_ilog10().map_or(1, |d| d as usize + 1)
}

// ---------------------------------------------------------------------------
// Problem
// ---------------------------------------------------------------------------

/// A solved problem. Created once the answer is accepted and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProblem")]
pub struct Problem {
    pub operation: ResolvedOperation,
    pub operand_lengths: OperandLengths,
    pub operands: [u64; 2],
    pub centiseconds: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawProblem {
    operation: ResolvedOperation,
    operand_lengths: OperandLengths,
    operands: [u64; 2],
    centiseconds: u32,
    timestamp: DateTime<Utc>,
}

impl TryFrom<RawProblem> for Problem {
    type Error = DrillError;

    fn try_from(raw: RawProblem) -> Result<Self, Self::Error> {
        let operands = Operands::new(raw.operation, raw.operands)?;
        Ok(Self {
            operation: operands.operation,
            operand_lengths: raw.operand_lengths,
            operands: operands.operands,
            centiseconds: raw.centiseconds,
            timestamp: raw.timestamp,
        })
    }
}

impl Problem {
    /// `elapsed` is truncated to whole hundredths of a second.
    pub fn new(operands: Operands, operand_lengths: OperandLengths, elapsed: Duration) -> Self {
        Self {
            operation: operands.operation,
            operand_lengths,
            operands: operands.operands,
            centiseconds: duration_to_centiseconds(elapsed),
            timestamp: Utc::now(),
        }
    }

    pub fn as_operands(&self) -> Operands {
        Operands {
            operation: self.operation,
            operands: self.operands,
        }
    }
}

pub fn duration_to_centiseconds(elapsed: Duration) -> u32 {
    u32::try_from(elapsed.as_millis() / 10).unwrap_or(u32::MAX)
}
