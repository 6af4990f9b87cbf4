use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DrillError, DrillResult};

// ---------------------------------------------------------------------------
// CalculationMethod
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationMethod {
    /// One problem on its own.
    Single,
    /// Mean after dropping the fastest and the slowest problem.
    Average,
    /// Plain mean of every problem in the window.
    Mean,
}

impl fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Average => write!(f, "average"),
            Self::Mean => write!(f, "mean"),
        }
    }
}

impl std::str::FromStr for CalculationMethod {
    type Err = DrillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "average" => Ok(Self::Average),
            "mean" => Ok(Self::Mean),
            _ => Err(DrillError::InvalidRecordFormat(format!(
                "unknown calculation method: {s}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordFormat
// ---------------------------------------------------------------------------

/// A problem count paired with the way a window of that many problems is
/// scored. Records are tracked separately for every format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawRecordFormat")]
pub struct RecordFormat {
    problem_count: u32,
    calculation_method: CalculationMethod,
}

#[derive(Deserialize)]
struct RawRecordFormat {
    problem_count: u32,
    calculation_method: CalculationMethod,
}

impl TryFrom<RawRecordFormat> for RecordFormat {
    type Error = DrillError;

    fn try_from(raw: RawRecordFormat) -> Result<Self, Self::Error> {
        Self::new(raw.problem_count, raw.calculation_method)
    }
}

impl RecordFormat {
    pub const SINGLE: Self = Self {
        problem_count: 1,
        calculation_method: CalculationMethod::Single,
    };

    /// Rejects combinations that cannot be scored: a single must cover
    /// exactly one problem, and an average needs at least three so that
    /// something remains after trimming.
    pub fn new(problem_count: u32, calculation_method: CalculationMethod) -> DrillResult<Self> {
        let valid = match calculation_method {
            CalculationMethod::Single => problem_count == 1,
            CalculationMethod::Mean => problem_count >= 2,
            CalculationMethod::Average => problem_count >= 3,
        };
        if !valid {
            return Err(DrillError::InvalidRecordFormat(format!(
                "{calculation_method} of {problem_count}"
            )));
        }
        Ok(Self {
            problem_count,
            calculation_method,
        })
    }

    pub fn mean(problem_count: u32) -> DrillResult<Self> {
        Self::new(problem_count, CalculationMethod::Mean)
    }

    pub fn average(problem_count: u32) -> DrillResult<Self> {
        Self::new(problem_count, CalculationMethod::Average)
    }

    pub fn problem_count(&self) -> u32 {
        self.problem_count
    }

    pub fn calculation_method(&self) -> CalculationMethod {
        self.calculation_method
    }

    /// Compact label: `single`, `ao5`, `mo3`.
    pub fn short_label(&self) -> String {
        match self.calculation_method {
            CalculationMethod::Single => "single".into(),
            CalculationMethod::Average => format!("ao{}", self.problem_count),
            CalculationMethod::Mean => format!("mo{}", self.problem_count),
        }
    }
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.calculation_method {
            CalculationMethod::Single => write!(f, "single"),
            method => write!(f, "{method} of {}", self.problem_count),
        }
    }
}

impl std::str::FromStr for RecordFormat {
    type Err = DrillError;

    /// Parses the short labels produced by [`RecordFormat::short_label`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if lower == "single" {
            return Ok(Self::SINGLE);
        }
        let invalid = || DrillError::InvalidRecordFormat(s.to_string());
        let (method, count) = if let Some(count) = lower.strip_prefix("ao") {
            (CalculationMethod::Average, count)
        } else if let Some(count) = lower.strip_prefix("mo") {
            (CalculationMethod::Mean, count)
        } else {
            return Err(invalid());
        };
        let count = count.parse().map_err(|_| invalid())?;
        Self::new(count, method)
    }
}

/// Catalog used when the configuration does not list formats.
pub fn default_catalog() -> Vec<RecordFormat> {
    vec![
        RecordFormat::SINGLE,
        RecordFormat {
            problem_count: 3,
            calculation_method: CalculationMethod::Mean,
        },
        RecordFormat {
            problem_count: 5,
            calculation_method: CalculationMethod::Average,
        },
        RecordFormat {
            problem_count: 12,
            calculation_method: CalculationMethod::Average,
        },
        RecordFormat {
            problem_count: 50,
            calculation_method: CalculationMethod::Average,
        },
        RecordFormat {
            problem_count: 100,
            calculation_method: CalculationMethod::Average,
        },
    ]
}

// ---------------------------------------------------------------------------
// BestResult
// ---------------------------------------------------------------------------

/// Best window of a finished set for one record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestResult {
    pub problem_count: u32,
    pub calculation_method: CalculationMethod,
    pub start_index: usize,
    /// Absolute indices trimmed from the window. Only averages trim.
    pub excluded_indices: Vec<usize>,
    pub centiseconds: u32,
    pub is_new_record: bool,
}

impl BestResult {
    pub fn format(&self) -> RecordFormat {
        RecordFormat {
            problem_count: self.problem_count,
            calculation_method: self.calculation_method,
        }
    }

    /// Whether `index` falls inside the scored window.
    pub fn covers(&self, index: usize) -> bool {
        index >= self.start_index && index < self.start_index + self.problem_count as usize
    }
}
