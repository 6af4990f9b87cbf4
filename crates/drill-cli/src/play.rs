//! Line-based set runner: one answer per line.

use std::io::{BufRead, Write};
use std::time::Instant;

use anyhow::Result;
use rand::Rng;

use drill_core::format::format_centiseconds;
use drill_core::{parse_answer, DrillError, Session, Submission};

use crate::config::DisplayConfig;

const END_COMMAND: &str = ":end";
const ABORT_COMMAND: &str = ":q";
const CLEAR_COMMAND: &str = "c";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetEnd {
    /// Every problem was solved.
    Completed,
    /// Stopped early with `:end` or end of input; what was solved is scored.
    EndedEarly,
    /// Stopped with `:q`; nothing is scored.
    Aborted,
}

/// Run `session` until it completes or the player stops it.
pub fn play<R, I, W>(
    session: &mut Session<R>,
    display: &DisplayConfig,
    input: &mut I,
    out: &mut W,
) -> Result<SetEnd>
where
    R: Rng,
    I: BufRead,
    W: Write,
{
    writeln!(
        out,
        "Type the answer and press enter. `{END_COMMAND}` ends the set, `{ABORT_COMMAND}` aborts it."
    )?;

    let count = session.settings().problem_count;
    let mut problem_start = Instant::now();
    let mut line = String::new();

    while !session.is_complete() {
        let current = *session.current();
        if display.show_problem_number {
            write!(out, "[{}/{count}] ", session.problem_number())?;
        }
        write!(out, "{current} = ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(SetEnd::EndedEarly);
        }
        let entry = line.trim();
        match entry {
            END_COMMAND => return Ok(SetEnd::EndedEarly),
            ABORT_COMMAND => return Ok(SetEnd::Aborted),
            CLEAR_COMMAND | "" => continue,
            _ => {}
        }

        let answer =
            match parse_answer(entry, display.input_direction, current.max_answer_length()) {
                Ok(answer) => answer,
                Err(DrillError::InvalidAnswer(reason)) => {
                    writeln!(out, "  not a valid answer: {reason}")?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

        match session.submit(answer, problem_start.elapsed())? {
            Submission::Correct(problem) => {
                if display.show_timer {
                    writeln!(
                        out,
                        "  ok  {}",
                        format_centiseconds(u64::from(problem.centiseconds))
                    )?;
                }
                problem_start = Instant::now();
            }
            Submission::Incorrect => writeln!(out, "  wrong, try again")?,
        }
    }

    Ok(SetEnd::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::{OperandLengths, Operation, SetSettings};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    const SEED: u64 = 99;

    fn settings(count: usize) -> SetSettings {
        SetSettings::new(
            Operation::All,
            OperandLengths::new(2, 1).unwrap(),
            count,
            10,
        )
        .unwrap()
    }

    fn session(count: usize) -> Session<StdRng> {
        Session::new(StdRng::seed_from_u64(SEED), settings(count)).unwrap()
    }

    /// Answers for the problems a fresh `session(count)` will ask.
    fn answers(count: usize) -> Vec<String> {
        let mut twin = session(count);
        let mut answers = Vec::new();
        while !twin.is_complete() {
            let answer = twin.current().correct_answer();
            answers.push(answer.to_string());
            twin.submit(answer, std::time::Duration::ZERO).unwrap();
        }
        answers
    }

    fn run(session: &mut Session<StdRng>, script: &str) -> (SetEnd, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        let end = play(session, &DisplayConfig::default(), &mut input, &mut out).unwrap();
        (end, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_completes_with_correct_answers() {
        let mut session = session(3);
        let script = answers(3).join("\n") + "\n";
        let (end, out) = run(&mut session, &script);
        assert_eq!(end, SetEnd::Completed);
        assert_eq!(session.solved().len(), 3);
        assert!(out.contains("[1/3]"));
        assert_eq!(out.matches("  ok  ").count(), 3);
    }

    #[test]
    fn test_wrong_and_invalid_answers_retry() {
        let mut session = session(1);
        let answer = answers(1).remove(0);
        let script = format!("abc\nc\n\n-99999999999\n{answer}\n");
        let (end, out) = run(&mut session, &script);
        assert_eq!(end, SetEnd::Completed);
        assert!(out.contains("not a valid answer"));
        assert_eq!(session.solved().len(), 1);
    }

    #[test]
    fn test_end_early_and_abort() {
        let mut session = session(5);
        let first = answers(5).remove(0);
        let (end, _) = run(&mut session, &format!("{first}\n:end\n"));
        assert_eq!(end, SetEnd::EndedEarly);
        assert_eq!(session.solved().len(), 1);

        let mut session = self::session(5);
        let (end, _) = run(&mut session, ":q\n");
        assert_eq!(end, SetEnd::Aborted);
        assert!(session.solved().is_empty());
    }

    #[test]
    fn test_end_of_input_ends_set() {
        let mut session = session(2);
        let (end, _) = run(&mut session, "");
        assert_eq!(end, SetEnd::EndedEarly);
    }
}
