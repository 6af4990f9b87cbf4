mod config;
mod play;
mod results;

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use drill_core::format::{format_centiseconds, pluralize};
use drill_core::{
    compute_bests, compute_bests_from_times, generate, NoHistory, OperandLengths, Operation,
    Problem, RecordFormat, RecordStore, Session,
};
use drill_store::SqliteStore;

use crate::config::Config;
use crate::play::SetEnd;
use crate::results::{default_highlight, render_results};

#[derive(Parser)]
#[command(name = "drill", version, about = "Timed mental arithmetic drills")]
struct Cli {
    /// Path to the SQLite database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a timed set
    Run {
        /// Operation (default from config)
        #[arg(short, long)]
        operation: Option<CliOperation>,

        /// Operand lengths in digits, e.g. `2,1`
        #[arg(short, long)]
        lengths: Option<OperandLengths>,

        /// Problems in the set
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Seed the problem generator
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print problems without playing them
    Generate {
        #[arg(short, long)]
        operation: Option<CliOperation>,

        #[arg(short, long)]
        lengths: Option<OperandLengths>,

        #[arg(short = 'n', long, default_value = "10")]
        count: usize,

        #[arg(long)]
        seed: Option<u64>,

        /// Print the answers too
        #[arg(short, long)]
        answers: bool,
    },

    /// Score a JSON array of solve times (centiseconds) or solved problems
    Score {
        /// JSON file
        file: PathBuf,
    },

    /// List all-time records
    Records {
        /// Only this operation
        #[arg(short, long)]
        operation: Option<CliOperation>,

        /// Only these operand lengths (requires --operation)
        #[arg(short, long, requires = "operation")]
        lengths: Option<OperandLengths>,
    },

    /// List recently played sets
    History {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show a stored set with its bests
    Show {
        /// Set ID
        id: String,

        /// Highlight this format's window, e.g. `ao5`
        #[arg(short = 'H', long)]
        highlight: Option<RecordFormat>,
    },

    /// Delete a stored set (records it set are kept)
    Forget {
        /// Set ID
        id: String,
    },

    /// List the tracked record formats
    Formats,

    /// Show store statistics
    Stats,

    /// Show current configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum CliOperation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    All,
}

impl From<CliOperation> for Operation {
    fn from(val: CliOperation) -> Self {
        match val {
            CliOperation::Addition => Operation::Addition,
            CliOperation::Subtraction => Operation::Subtraction,
            CliOperation::Multiplication => Operation::Multiplication,
            CliOperation::Division => Operation::Division,
            CliOperation::All => Operation::All,
        }
    }
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("dev", "drill", "drill")
        .map(|dirs| dirs.data_dir().join("drill.db"))
        .unwrap_or_else(|| PathBuf::from("drill.db"))
}

fn open_store(db: Option<PathBuf>, cfg: &Config) -> Result<SqliteStore> {
    let path = db
        .or_else(|| cfg.store.path.as_ref().map(PathBuf::from))
        .unwrap_or_else(default_db_path);
    SqliteStore::new(&path).context("failed to open database")
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config()?;

    match cli.command {
        Commands::Run {
            operation,
            lengths,
            count,
            seed,
        } => {
            let store = open_store(cli.db, &cfg)?;
            cmd_run(&store, &cfg, operation.map(Into::into), lengths, count, seed)
        }
        Commands::Generate {
            operation,
            lengths,
            count,
            seed,
            answers,
        } => cmd_generate(&cfg, operation.map(Into::into), lengths, count, seed, answers),
        Commands::Score { file } => cmd_score(&cfg, &file),
        Commands::Records { operation, lengths } => {
            let store = open_store(cli.db, &cfg)?;
            cmd_records(&store, &cfg, operation.map(Into::into), lengths)
        }
        Commands::History { limit } => cmd_history(&open_store(cli.db, &cfg)?, limit),
        Commands::Show { id, highlight } => {
            cmd_show(&open_store(cli.db, &cfg)?, &cfg, &id, highlight)
        }
        Commands::Forget { id } => cmd_forget(&open_store(cli.db, &cfg)?, &id),
        Commands::Formats => cmd_formats(&cfg),
        Commands::Stats => cmd_stats(&open_store(cli.db, &cfg)?),
        Commands::Config => cmd_config(&cfg),
    }
}

// ---------------------------------------------------------------------------
// Set commands
// ---------------------------------------------------------------------------

fn cmd_run(
    store: &SqliteStore,
    cfg: &Config,
    operation: Option<Operation>,
    lengths: Option<OperandLengths>,
    count: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let settings = cfg.set_settings(operation, lengths, count)?;
    let category = settings.category();
    println!(
        "{} of {}",
        pluralize("problem", settings.problem_count),
        category
    );

    let mut session = Session::new(make_rng(seed), settings)?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout().lock();
    let end = play::play(&mut session, &cfg.display, &mut input, &mut out)?;
    out.flush()?;
    drop(out);

    if end == SetEnd::Aborted {
        println!("Set aborted.");
        return Ok(());
    }
    let set = session.finish();
    if set.problems.is_empty() {
        println!("No problems solved.");
        return Ok(());
    }

    let history = match store.prior_bests(&category) {
        Ok(history) => history,
        Err(e) => {
            tracing::warn!(error = %e, "could not load record history, treating as empty");
            HashMap::new()
        }
    };
    let bests = compute_bests(&set.problems, &cfg.catalog(), &history);

    let id = store.save_set(&set)?;
    let updated = store.record_bests(&category, &id, &bests)?;

    println!();
    print!(
        "{}",
        render_results(&set.problems, &bests, true, default_highlight(&bests))
    );
    println!();
    if updated > 0 {
        println!("{} (*)", pluralize("new record", updated));
    }
    println!("Saved: {id}");
    Ok(())
}

fn cmd_generate(
    cfg: &Config,
    operation: Option<Operation>,
    lengths: Option<OperandLengths>,
    count: usize,
    seed: Option<u64>,
    answers: bool,
) -> Result<()> {
    let settings = cfg.set_settings(operation, lengths, Some(count))?;
    let mut rng = make_rng(seed);
    for i in 1..=settings.problem_count {
        let operands = generate(&mut rng, settings.operation, settings.operand_lengths)?;
        if answers {
            println!("{i:>4}. {operands} = {}", operands.correct_answer());
        } else {
            println!("{i:>4}. {operands}");
        }
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScoreInput {
    Times(Vec<u32>),
    Problems(Vec<Problem>),
}

fn cmd_score(cfg: &Config, file: &Path) -> Result<()> {
    let content =
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let input: ScoreInput =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", file.display()))?;

    let bests = match &input {
        ScoreInput::Times(times) => compute_bests_from_times(times, &cfg.catalog(), &NoHistory),
        ScoreInput::Problems(problems) => compute_bests(problems, &cfg.catalog(), &NoHistory),
    };
    if bests.is_empty() {
        println!("Nothing to score.");
        return Ok(());
    }

    println!("{:<20} {:>10}  Window", "Format", "Time");
    println!("{}", "-".repeat(44));
    for best in &bests {
        let end = best.start_index + best.problem_count as usize;
        println!(
            "{:<20} {:>10}  {}..{}",
            best.format().to_string(),
            format_centiseconds(u64::from(best.centiseconds)),
            best.start_index + 1,
            end
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Store commands
// ---------------------------------------------------------------------------

fn cmd_records(
    store: &SqliteStore,
    cfg: &Config,
    operation: Option<Operation>,
    lengths: Option<OperandLengths>,
) -> Result<()> {
    let mut records = match (operation, lengths) {
        (Some(operation), Some(lengths)) => {
            let settings = cfg.set_settings(Some(operation), Some(lengths), None)?;
            store.list_records(Some(&settings.category()))?
        }
        _ => store.list_records(None)?,
    };
    if let (Some(operation), None) = (operation, lengths) {
        records.retain(|r| r.category.operation == operation);
    }

    if records.is_empty() {
        println!("No records yet.");
        return Ok(());
    }

    println!(
        "{:<24} {:<20} {:>10}  {:<16} Set",
        "Category", "Format", "Time", "Date"
    );
    println!("{}", "-".repeat(100));
    for r in &records {
        println!(
            "{:<24} {:<20} {:>10}  {:<16} {}",
            r.category.to_string(),
            r.format.to_string(),
            format_centiseconds(u64::from(r.centiseconds)),
            r.achieved_at.format("%Y-%m-%d %H:%M").to_string(),
            r.set_id
        );
    }
    Ok(())
}

fn cmd_history(store: &SqliteStore, limit: usize) -> Result<()> {
    let sets = store.list_sets(limit)?;
    if sets.is_empty() {
        println!("No sets played yet.");
        return Ok(());
    }

    for set in &sets {
        println!(
            "{}  {}  {:<24} {} in {}",
            set.id,
            set.finished_at.format("%Y-%m-%d %H:%M"),
            set.category.to_string(),
            pluralize("problem", set.problem_count),
            format_centiseconds(set.total_centiseconds)
        );
    }
    Ok(())
}

fn cmd_show(
    store: &SqliteStore,
    cfg: &Config,
    id: &str,
    highlight: Option<RecordFormat>,
) -> Result<()> {
    let Some(set) = store.get_set(id)? else {
        bail!("set not found: {id}");
    };
    let bests = compute_bests(&set.problems, &cfg.catalog(), &NoHistory);
    let selected = match highlight {
        Some(format) => match bests.iter().position(|b| b.format() == format) {
            Some(i) => Some(i),
            None => bail!("{format} is not available for a set of {}", set.problems.len()),
        },
        None => None,
    };

    println!("--- {} ---", set.id);
    println!("  category: {}", set.category);
    println!("  started:  {}", set.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  finished: {}", set.finished_at.format("%Y-%m-%d %H:%M:%S"));
    println!();
    print!("{}", render_results(&set.problems, &bests, false, selected));
    Ok(())
}

fn cmd_forget(store: &SqliteStore, id: &str) -> Result<()> {
    store.delete_set(id)?;
    println!("Deleted: {id}");
    Ok(())
}

fn cmd_stats(store: &SqliteStore) -> Result<()> {
    let stats = store.stats()?;
    println!("Sets:      {}", stats.total_sets);
    println!("Problems:  {}", stats.total_problems);
    println!("Records:   {}", stats.total_records);
    if let Some(first) = stats.first_set {
        println!("First:     {}", first.format("%Y-%m-%d %H:%M"));
    }
    if let Some(last) = stats.last_set {
        println!("Last:      {}", last.format("%Y-%m-%d %H:%M"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Configuration commands
// ---------------------------------------------------------------------------

fn cmd_formats(cfg: &Config) -> Result<()> {
    println!("{:<8} {:<20} Problems", "Short", "Format");
    println!("{}", "-".repeat(40));
    for format in cfg.catalog() {
        println!(
            "{:<8} {:<20} {}",
            format.short_label(),
            format.to_string(),
            format.problem_count()
        );
    }
    Ok(())
}

fn cmd_config(cfg: &Config) -> Result<()> {
    println!("Config: {}", config::show_config_path());
    println!();
    println!("[store]");
    println!(
        "  path = {}",
        cfg.store
            .path
            .as_deref()
            .unwrap_or("(default platform path)")
    );
    println!();
    println!("[set]");
    println!("  operation = {}", cfg.set.operation);
    println!("  operand_lengths = [{}]", cfg.set.operand_lengths);
    println!("  problem_count = {}", cfg.set.problem_count);
    println!("  max_operand_length = {}", cfg.set.max_operand_length);
    println!();
    println!("[display]");
    println!("  show_problem_number = {}", cfg.display.show_problem_number);
    println!("  show_timer = {}", cfg.display.show_timer);
    println!("  input_direction = {:?}", cfg.display.input_direction);
    println!();
    println!("[records]");
    let labels: Vec<String> = cfg.catalog().iter().map(RecordFormat::short_label).collect();
    println!("  formats = {}", labels.join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_args() {
        let cli = Cli::try_parse_from(["drill", "run", "-o", "division", "-l", "3,1", "-n", "12"])
            .unwrap();
        match cli.command {
            Commands::Run {
                operation,
                lengths,
                count,
                seed,
            } => {
                assert_eq!(operation.map(Operation::from), Some(Operation::Division));
                assert_eq!(lengths, Some(OperandLengths::new(3, 1).unwrap()));
                assert_eq!(count, Some(12));
                assert_eq!(seed, None);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_records_lengths_require_operation() {
        assert!(Cli::try_parse_from(["drill", "records", "-l", "2,2"]).is_err());
        assert!(Cli::try_parse_from(["drill", "records", "-o", "all", "-l", "2,2"]).is_ok());
    }

    #[test]
    fn test_score_input_accepts_times_or_problems() {
        let times: ScoreInput = serde_json::from_str("[120, 340, 95]").unwrap();
        assert!(matches!(times, ScoreInput::Times(t) if t == vec![120u32, 340, 95]));

        let problem = Problem::new(
            drill_core::Operands {
                operation: drill_core::ResolvedOperation::Addition,
                operands: [12, 30],
            },
            OperandLengths::new(2, 2).unwrap(),
            std::time::Duration::from_millis(1500),
        );
        let json = serde_json::to_string(&vec![problem]).unwrap();
        let problems: ScoreInput = serde_json::from_str(&json).unwrap();
        assert!(matches!(problems, ScoreInput::Problems(p) if p.len() == 1 && p[0].centiseconds == 150));
    }
}
