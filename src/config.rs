//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.tally.toml` files.

use crate::analysis::{DEFAULT_PRECISION, MAX_PRECISION};
use crate::models::ZeroTotalPolicy;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".tally.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub aggregate: AggregateConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Also write log events to this file, without colours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

/// Aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateConfig {
    /// Decimal places kept in each contribution.
    #[serde(default = "default_precision")]
    pub precision: u32,

    /// Behaviour when a non-empty input sums to zero.
    #[serde(default)]
    pub zero_total: ZeroTotalPolicy,

    /// Report empty input as an empty result rather than an error.
    #[serde(default = "default_true")]
    pub allow_empty: bool,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            precision: default_precision(),
            zero_total: ZeroTotalPolicy::default(),
            allow_empty: true,
        }
    }
}

fn default_precision() -> u32 {
    DEFAULT_PRECISION
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Title printed at the top of the report.
    #[serde(default = "default_title")]
    pub title: String,

    /// Include the calculator history table.
    #[serde(default = "default_true")]
    pub include_history: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            include_history: true,
        }
    }
}

fn default_title() -> String {
    "Tally Report".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Reject values no run could use.
    pub fn validate(&self) -> Result<()> {
        if self.aggregate.precision > MAX_PRECISION {
            bail!(
                "aggregate.precision must be at most {}, got {}",
                MAX_PRECISION,
                self.aggregate.precision
            );
        }
        if self.report.title.trim().is_empty() {
            bail!("report.title must not be empty");
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(ref path) = args.log_file {
            self.general.log_file = Some(path.clone());
        }

        if let Some(crate::cli::Command::Aggregate(ref agg)) = args.command {
            if let Some(precision) = agg.precision {
                self.aggregate.precision = precision;
            }
            if let Some(policy) = agg.zero_total {
                self.aggregate.zero_total = policy.into();
            }
            if agg.reject_empty {
                self.aggregate.allow_empty = false;
            }
        }

        if let Some(ref title) = args.title {
            self.report.title = title.clone();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Serializes tests that parse `aggregate` without `--precision`,
    // since clap falls back to TALLY_PRECISION.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const FILE_CONFIG: &str = r#"
[general]
log_file = "from-file.log"

[aggregate]
precision = 5
zero_total = "undefined"
allow_empty = true

[report]
title = "From file"
"#;

    fn load_file_config(dir: &TempDir) -> Config {
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), FILE_CONFIG).unwrap();
        Config::load_from_dir(dir.path()).unwrap().unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.aggregate.precision, 2);
        assert_eq!(config.aggregate.zero_total, ZeroTotalPolicy::Error);
        assert!(config.aggregate.allow_empty);
        assert_eq!(config.report.title, "Tally Report");
        assert!(!config.general.verbose);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[aggregate]
precision = 3
zero_total = "undefined"

[report]
title = "Quarterly shares"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.aggregate.precision, 3);
        assert_eq!(config.aggregate.zero_total, ZeroTotalPolicy::Undefined);
        assert!(config.aggregate.allow_empty);
        assert_eq!(config.report.title, "Quarterly shares");
        assert!(config.report.include_history);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[aggregate]"));
        assert!(toml_str.contains("[report]"));

        let round: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(round.aggregate.precision, 2);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        let mut file = std::fs::File::create(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        writeln!(file, "[aggregate]\nzero_total = \"zero\"").unwrap();

        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.aggregate.zero_total, ZeroTotalPolicy::Zero);
    }

    #[test]
    fn test_load_rejects_excessive_precision() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[aggregate]\nprecision = 42\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("precision"));
    }

    #[test]
    fn test_load_rejects_bad_policy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[aggregate]\nzero_total = \"ignore\"\n").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_parse_log_file() {
        let config: Config = toml::from_str("[general]\nlog_file = \"tally.log\"\n").unwrap();
        assert_eq!(config.general.log_file, Some(PathBuf::from("tally.log")));

        let config: Config = toml::from_str("").unwrap();
        assert!(config.general.log_file.is_none());
        assert!(!Config::default_toml().contains("log_file"));
    }

    #[test]
    fn test_cli_flags_override_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = TempDir::new().unwrap();
        let mut config = load_file_config(&dir);

        let args = Args::try_parse_from([
            "tally",
            "--title",
            "From flags",
            "--log-file",
            "from-flags.log",
            "aggregate",
            "1",
            "--precision",
            "4",
            "--zero-total",
            "zero",
            "--reject-empty",
        ])
        .unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.aggregate.precision, 4);
        assert_eq!(config.aggregate.zero_total, ZeroTotalPolicy::Zero);
        assert!(!config.aggregate.allow_empty);
        assert_eq!(config.report.title, "From flags");
        assert_eq!(config.general.log_file, Some(PathBuf::from("from-flags.log")));
    }

    #[test]
    fn test_absent_flags_keep_file_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::remove_var("TALLY_PRECISION");
        let dir = TempDir::new().unwrap();
        let mut config = load_file_config(&dir);

        let args = Args::try_parse_from(["tally", "aggregate", "1"]).unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.aggregate.precision, 5);
        assert_eq!(config.aggregate.zero_total, ZeroTotalPolicy::Undefined);
        assert!(config.aggregate.allow_empty);
        assert_eq!(config.report.title, "From file");
        assert_eq!(config.general.log_file, Some(PathBuf::from("from-file.log")));
        assert!(!config.general.verbose);
    }

    #[test]
    fn test_precision_from_environment() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = TempDir::new().unwrap();

        std::env::set_var("TALLY_PRECISION", "7");
        let from_env = Args::try_parse_from(["tally", "aggregate", "1"]);
        let flag_wins = Args::try_parse_from(["tally", "aggregate", "1", "--precision", "3"]);
        std::env::remove_var("TALLY_PRECISION");

        let mut config = load_file_config(&dir);
        config.merge_with_args(&from_env.unwrap());
        assert_eq!(config.aggregate.precision, 7);

        let mut config = load_file_config(&dir);
        config.merge_with_args(&flag_wins.unwrap());
        assert_eq!(config.aggregate.precision, 3);
    }
}
