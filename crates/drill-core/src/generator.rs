//! Operand generation.
//!
//! Every draw goes through the caller's random source so a seeded
//! [`rand::rngs::StdRng`] reproduces a set exactly.

use rand::Rng;

use crate::error::{DrillError, DrillResult};
use crate::problem::{
    OperandLengths, Operands, Operation, ResolvedOperation, MAX_SUPPORTED_OPERAND_LENGTH,
};

/// Candidates for `Operation::All`, drawn with a single uniform index.
const RANDOM_OPERATIONS: [ResolvedOperation; 4] = [
    ResolvedOperation::Addition,
    ResolvedOperation::Multiplication,
    ResolvedOperation::Subtraction,
    ResolvedOperation::Division,
];

/// Generate an operand pair for `operation` with the requested digit lengths.
///
/// Subtraction and division expect `second <= first`. When that does not
/// hold the result is still well formed: subtraction falls back to
/// independent operands (the difference may be negative) and division to the
/// smallest exact quotient.
pub fn generate<R>(
    rng: &mut R,
    operation: Operation,
    lengths: OperandLengths,
) -> DrillResult<Operands>
where
    R: Rng + ?Sized,
{
    check_length(lengths.first())?;
    check_length(lengths.second())?;

    let operation = match operation.resolved() {
        Some(op) => op,
        None => {
            let op = RANDOM_OPERATIONS[rng.random_range(0..RANDOM_OPERATIONS.len())];
            tracing::debug!(operation = %op, "randomly selected operation");
            op
        }
    };

    let operands = match operation {
        ResolvedOperation::Addition | ResolvedOperation::Multiplication => {
            [operand_of_length(rng, lengths.first()), operand_of_length(rng, lengths.second())]
        }
        ResolvedOperation::Subtraction => subtraction(rng, lengths),
        ResolvedOperation::Division => division(rng, lengths),
    };

    Ok(Operands {
        operation,
        operands,
    })
}

fn check_length(length: u32) -> DrillResult<()> {
    if length == 0 || length > MAX_SUPPORTED_OPERAND_LENGTH {
        return Err(DrillError::InvalidOperandLength {
            length,
            max: MAX_SUPPORTED_OPERAND_LENGTH,
        });
    }
    Ok(())
}

fn pow10(exp: u32) -> u64 {
    10u64.pow(exp)
}

/// Uniform over every integer with exactly `length` digits.
fn integer_of_length<R: Rng + ?Sized>(rng: &mut R, length: u32) -> u64 {
    rng.random_range(pow10(length - 1)..pow10(length))
}

/// Like [`integer_of_length`], but single digits skip 0 and 1.
fn operand_of_length<R: Rng + ?Sized>(rng: &mut R, length: u32) -> u64 {
    if length == 1 {
        rng.random_range(2..10)
    } else {
        integer_of_length(rng, length)
    }
}

fn subtraction<R: Rng + ?Sized>(rng: &mut R, lengths: OperandLengths) -> [u64; 2] {
    if !lengths.is_equal() {
        return [
            integer_of_length(rng, lengths.first()),
            integer_of_length(rng, lengths.second()),
        ];
    }
    let low = pow10(lengths.first() - 1);
    let minuend = rng.random_range(low + 1..pow10(lengths.first()));
    let subtrahend = rng.random_range(low..minuend);
    [minuend, subtrahend]
}

fn division<R: Rng + ?Sized>(rng: &mut R, lengths: OperandLengths) -> [u64; 2] {
    let dividend_length = lengths.first();
    let max_dividend = pow10(dividend_length) - 1;

    let (divisor, min_quotient) = if lengths.is_equal() {
        let divisor = if dividend_length == 1 {
            rng.random_range(2..5)
        } else {
            rng.random_range(pow10(dividend_length - 1)..pow10(dividend_length) / 2)
        };
        (divisor, 2)
    } else {
        let divisor = operand_of_length(rng, lengths.second());
        (divisor, pow10(dividend_length - 1).div_ceil(divisor))
    };
    let max_quotient = max_dividend / divisor;

    // Empty only when the divisor is longer than the dividend.
    let quotient = if max_quotient < min_quotient {
        min_quotient
    } else {
        rng.random_range(min_quotient..=max_quotient)
    };
    [divisor * quotient, divisor]
}
