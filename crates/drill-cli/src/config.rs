//! Configuration loading from TOML files.
//!
//! Lookup order:
//! 1. `$DRILL_CONFIG` environment variable
//! 2. `~/.config/drill/config.toml`
//! 3. Built-in defaults (everything is optional)

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use drill_core::{
    default_catalog, InputDirection, OperandLengths, Operation, RecordFormat, SetSettings,
};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub set: SetConfig,
    pub display: DisplayConfig,
    pub records: RecordsConfig,
}

/// Database storage settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database path. Default: platform-specific data dir.
    pub path: Option<String>,
}

/// Defaults for `drill run` and `drill generate`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SetConfig {
    pub operation: Operation,
    pub operand_lengths: OperandLengths,
    pub problem_count: usize,
    /// Longest operand, in digits, a set may ask for.
    pub max_operand_length: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub show_problem_number: bool,
    pub show_timer: bool,
    pub input_direction: InputDirection,
}

/// Record formats tracked for every set.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    pub formats: Vec<RecordFormat>,
}

// --- Defaults ---

impl Default for SetConfig {
    fn default() -> Self {
        Self {
            operation: Operation::Multiplication,
            operand_lengths: OperandLengths::SINGLE_DIGITS,
            problem_count: 5,
            max_operand_length: 10,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_problem_number: true,
            show_timer: true,
            input_direction: InputDirection::LeftToRight,
        }
    }
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            formats: default_catalog(),
        }
    }
}

impl Config {
    /// Settings for one set: command-line overrides on top of `[set]`.
    pub fn set_settings(
        &self,
        operation: Option<Operation>,
        operand_lengths: Option<OperandLengths>,
        problem_count: Option<usize>,
    ) -> Result<SetSettings> {
        let settings = SetSettings::new(
            operation.unwrap_or(self.set.operation),
            operand_lengths.unwrap_or(self.set.operand_lengths),
            problem_count.unwrap_or(self.set.problem_count),
            self.set.max_operand_length,
        )?;
        Ok(settings)
    }

    /// The record catalog ordered by problem count, without duplicates.
    pub fn catalog(&self) -> Vec<RecordFormat> {
        let mut formats = self.records.formats.clone();
        formats.sort_by_key(|f| (f.problem_count(), f.calculation_method()));
        formats.dedup();
        formats
    }
}

/// Load config from disk. Returns defaults if no config file exists.
pub fn load_config() -> Result<Config> {
    let path = config_path();

    if let Some(p) = &path {
        if p.exists() {
            let content =
                std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| format!("parsing {}", p.display()))?;
            return Ok(config);
        }
    }

    Ok(Config::default())
}

/// Resolve the config file path.
fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("DRILL_CONFIG") {
        return Some(PathBuf::from(p));
    }

    directories::BaseDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(".config")
            .join("drill")
            .join("config.toml")
    })
}

/// Show the active config path (for `drill config`).
pub fn show_config_path() -> String {
    match config_path() {
        Some(p) if p.exists() => format!("{} (loaded)", p.display()),
        Some(p) => format!("{} (not found, using defaults)", p.display()),
        None => "no config path resolved (using defaults)".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::CalculationMethod;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.set.operation, Operation::Multiplication);
        assert_eq!(config.set.problem_count, 5);
        assert!(config.display.show_timer);
        assert_eq!(config.catalog()[0], RecordFormat::SINGLE);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[set]
operation = "division"
operand_lengths = [3, 1]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.set.operation, Operation::Division);
        assert_eq!(config.set.operand_lengths, OperandLengths::new(3, 1).unwrap());
        // Other fields should be defaults
        assert_eq!(config.set.problem_count, 5);
        assert_eq!(config.records.formats, default_catalog());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[store]
path = "/tmp/drill.db"

[set]
operation = "all"
operand_lengths = [2, 2]
problem_count = 12
max_operand_length = 4

[display]
show_problem_number = false
show_timer = false
input_direction = "right_to_left"

[[records.formats]]
problem_count = 5
calculation_method = "average"

[[records.formats]]
problem_count = 1
calculation_method = "single"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store.path.as_deref(), Some("/tmp/drill.db"));
        assert_eq!(config.set.operation, Operation::All);
        assert!(!config.display.show_problem_number);
        assert_eq!(config.display.input_direction, InputDirection::RightToLeft);
        let catalog = config.catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0], RecordFormat::SINGLE);
        assert_eq!(catalog[1].calculation_method(), CalculationMethod::Average);
    }

    #[test]
    fn test_rejects_unknown_operation() {
        let toml_str = r#"
[set]
operation = "modulo"
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_rejects_invalid_record_format() {
        let toml_str = r#"
[[records.formats]]
problem_count = 2
calculation_method = "average"
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_set_settings_overrides() {
        let config = Config::default();
        let settings = config
            .set_settings(
                Some(Operation::Subtraction),
                Some(OperandLengths::new(2, 4).unwrap()),
                Some(20),
            )
            .unwrap();
        assert_eq!(settings.operation, Operation::Subtraction);
        assert_eq!(settings.operand_lengths, OperandLengths::new(2, 2).unwrap());
        assert_eq!(settings.problem_count, 20);

        let too_long = config.set_settings(None, Some(OperandLengths::new(11, 1).unwrap()), None);
        assert!(too_long.is_err());
    }
}
