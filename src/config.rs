//! Configuration management for the mining simulator
//!
//! Supports configuration via command line arguments, environment variables,
//! and configuration files (YAML/JSON). Values given on the command line or
//! through the environment take precedence over the file.

use crate::crypto::HashAlgorithm;
use crate::scheduler::SchedulerConfig;
use crate::types::BlockHeader;
use crate::utils::validate_hex_string;
use crate::{Error, Result};
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level: tracing::Level = (*self).into();
        write!(f, "{}", level.as_str().to_lowercase())
    }
}

/// Complete configuration for the simulator
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(
    name = "header-mine-sim",
    version = env!("CARGO_PKG_VERSION"),
    about = "Block header mining simulator",
    long_about = "Rolls the nonce and timestamp of a block header, recomputes its double-hash digest and reports every attempt, on a fixed cadence or one step at a time"
)]
pub struct Config {
    /// Print the parsed configuration and exit
    #[arg(long)]
    #[serde(skip)]
    pub print_config: bool,

    /// Configuration file path (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Period between auto-mine cycles (e.g. 250ms, 1s)
    #[arg(short = 'p', long, env = "MINE_SIM_TICK_PERIOD", default_value = "250ms")]
    #[serde(default = "default_tick_period")]
    pub tick_period: String,

    /// Hash primitive applied twice per attempt
    #[arg(short = 'H', long, value_enum, default_value = "sha256")]
    #[serde(default)]
    pub algorithm: HashAlgorithm,

    /// Start mining as soon as the header is loaded and mirror start/stop to tip polling
    #[arg(short = 'f', long)]
    #[serde(default)]
    pub follow_tip: bool,

    /// Stop after this many cycles (runs until quit when unset)
    #[arg(long)]
    pub max_cycles: Option<u64>,

    /// Header version
    #[arg(long, default_value = "1")]
    #[serde(default = "default_version")]
    pub version: u32,

    /// Previous block hash (display-order hex)
    #[arg(long, default_value = DEFAULT_PREVIOUS_HASH)]
    #[serde(default = "default_previous_hash")]
    pub previous_hash: String,

    /// Merkle root (display-order hex)
    #[arg(long, default_value = DEFAULT_MERKLE_ROOT)]
    #[serde(default = "default_merkle_root")]
    pub merkle_root: String,

    /// Initial header timestamp (Unix seconds)
    #[arg(long, default_value = "1231006505")]
    #[serde(default = "default_timestamp")]
    pub timestamp: u32,

    /// Compact difficulty bits (hex)
    #[arg(long, default_value = "1d00ffff")]
    #[serde(default = "default_bits")]
    pub bits: String,

    /// Initial nonce
    #[arg(long, default_value = "0")]
    #[serde(default)]
    pub nonce: u32,

    /// Log level
    #[arg(short = 'l', long, env = "MINE_SIM_LOG_LEVEL", default_value = "info")]
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    /// Emit logs as JSON
    #[arg(long)]
    #[serde(default)]
    pub log_json: bool,

    /// Print mining events as JSON lines
    #[arg(long)]
    #[serde(default)]
    pub json_events: bool,
}

/// Optional values read from a config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    tick_period: Option<String>,
    algorithm: Option<HashAlgorithm>,
    follow_tip: Option<bool>,
    max_cycles: Option<u64>,
    version: Option<u32>,
    previous_hash: Option<String>,
    merkle_root: Option<String>,
    timestamp: Option<u32>,
    bits: Option<String>,
    nonce: Option<u32>,
    log_level: Option<LogLevel>,
    log_json: Option<bool>,
    json_events: Option<bool>,
}

impl Config {
    /// Parse the process arguments, merge the config file and validate
    pub async fn load() -> Result<Self> {
        let matches = Self::command().get_matches();
        Self::from_matches(&matches).await
    }

    /// Like [`load`](Self::load), over explicit arguments
    pub async fn load_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command()
            .try_get_matches_from(args)
            .map_err(|e| Error::config(e.to_string()))?;
        Self::from_matches(&matches).await
    }

    async fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let mut config =
            Self::from_arg_matches(matches).map_err(|e| Error::config(e.to_string()))?;

        if let Some(config_file) = &config.config_file {
            let file_config = Self::load_from_file(config_file).await?;
            config.merge_with_file(file_config, matches);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    async fn load_from_file(path: &Path) -> Result<FileConfig> {
        let content = tokio::fs::read_to_string(path).await?;

        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content).map_err(Error::from)
        } else {
            // Default to YAML
            serde_yaml::from_str(&content).map_err(Error::from)
        }
    }

    /// Take file values for everything not set explicitly on the CLI or env
    fn merge_with_file(&mut self, file: FileConfig, matches: &ArgMatches) {
        let explicit = |id: &str| {
            matches!(
                matches.value_source(id),
                Some(ValueSource::CommandLine | ValueSource::EnvVariable)
            )
        };

        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(
                    if !explicit(stringify!($field)) {
                        if let Some(value) = file.$field {
                            self.$field = value;
                        }
                    }
                )*
            };
        }

        merge!(
            tick_period,
            algorithm,
            follow_tip,
            version,
            previous_hash,
            merkle_root,
            timestamp,
            bits,
            nonce,
            log_level,
            log_json,
            json_events,
        );

        if !explicit("max_cycles") && file.max_cycles.is_some() {
            self.max_cycles = file.max_cycles;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.tick_period_duration()?.is_zero() {
            return Err(Error::config("Tick period must be greater than 0"));
        }

        validate_hex_string(&self.previous_hash, Some(64))
            .map_err(|e| Error::config(format!("Invalid previous hash: {}", e)))?;
        validate_hex_string(&self.merkle_root, Some(64))
            .map_err(|e| Error::config(format!("Invalid merkle root: {}", e)))?;
        self.bits_value()?;

        Ok(())
    }

    /// Get tick period duration
    pub fn tick_period_duration(&self) -> Result<Duration> {
        humantime::parse_duration(&self.tick_period)
            .map_err(|e| Error::config(format!("Invalid tick period '{}': {}", self.tick_period, e)))
    }

    /// Get parsed difficulty bits
    pub fn bits_value(&self) -> Result<u32> {
        let digits = self.bits.trim_start_matches("0x");
        u32::from_str_radix(digits, 16)
            .map_err(|e| Error::config(format!("Invalid bits '{}': {}", self.bits, e)))
    }

    /// Get the initial block header
    pub fn block_header(&self) -> Result<BlockHeader> {
        BlockHeader::from_hex_fields(
            self.version,
            &self.previous_hash,
            &self.merkle_root,
            self.timestamp,
            self.bits_value()?,
            self.nonce,
        )
    }

    /// Get engine options
    pub fn scheduler_config(&self) -> Result<SchedulerConfig> {
        Ok(SchedulerConfig {
            tick_period: self.tick_period_duration()?,
            algorithm: self.algorithm,
            follow_tip: self.follow_tip,
        })
    }
}

const DEFAULT_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";
const DEFAULT_MERKLE_ROOT: &str =
    "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

// Default value functions for serde
fn default_tick_period() -> String { "250ms".to_string() }
fn default_version() -> u32 { 1 }
fn default_previous_hash() -> String { DEFAULT_PREVIOUS_HASH.to_string() }
fn default_merkle_root() -> String { DEFAULT_MERKLE_ROOT.to_string() }
fn default_timestamp() -> u32 { 1_231_006_505 }
fn default_bits() -> String { "1d00ffff".to_string() }
fn default_log_level() -> LogLevel { LogLevel::Info }

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[tokio::test]
    async fn test_config_defaults() {
        let config = Config::load_from(["header-mine-sim"]).await.unwrap();

        assert_eq!(config.tick_period_duration().unwrap(), Duration::from_millis(250));
        assert_eq!(config.algorithm, HashAlgorithm::Sha256);
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(!config.follow_tip);
        assert_eq!(config.block_header().unwrap(), BlockHeader {
            nonce: 0,
            ..BlockHeader::genesis()
        });
    }

    #[tokio::test]
    async fn test_config_cli_values() {
        let config = Config::load_from([
            "header-mine-sim",
            "--tick-period", "1s",
            "--algorithm", "blake2s256",
            "--follow-tip",
            "--bits", "0x17034219",
            "--nonce", "42",
        ])
        .await
        .unwrap();

        let scheduler = config.scheduler_config().unwrap();
        assert_eq!(scheduler.tick_period, Duration::from_secs(1));
        assert_eq!(scheduler.algorithm, HashAlgorithm::Blake2s256);
        assert!(scheduler.follow_tip);
        assert_eq!(config.bits_value().unwrap(), 0x17034219);
        assert_eq!(config.block_header().unwrap().nonce, 42);
    }

    #[tokio::test]
    async fn test_config_from_yaml_with_cli_precedence() {
        let yaml_content = r#"
tick_period: 2s
follow_tip: true
nonce: 1000
bits: "17034219"
max_cycles: 10
"#;
        let mut temp_file = Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(temp_file, "{}", yaml_content).unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();

        let config = Config::load_from([
            "header-mine-sim",
            "--config-file", path.as_str(),
            "--nonce", "5",
        ])
        .await
        .unwrap();

        assert_eq!(config.tick_period_duration().unwrap(), Duration::from_secs(2));
        assert!(config.follow_tip);
        assert_eq!(config.nonce, 5);
        assert_eq!(config.bits_value().unwrap(), 0x17034219);
        assert_eq!(config.max_cycles, Some(10));
    }

    #[tokio::test]
    async fn test_config_from_json() {
        let mut temp_file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(temp_file, r#"{{"algorithm": "blake2s256", "log_level": "debug"}}"#).unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();

        let config = Config::load_from(["header-mine-sim", "--config-file", path.as_str()])
            .await
            .unwrap();
        assert_eq!(config.algorithm, HashAlgorithm::Blake2s256);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[tokio::test]
    async fn test_config_validation_errors() {
        let err = Config::load_from(["header-mine-sim", "--tick-period", "0s"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let err = Config::load_from(["header-mine-sim", "--previous-hash", "abcd"])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("previous hash"));

        let err = Config::load_from(["header-mine-sim", "--bits", "zz"])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid bits"));
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(tracing::Level::from(LogLevel::Warn), tracing::Level::WARN);
    }
}
