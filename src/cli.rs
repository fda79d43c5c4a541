//! CLI argument parsing for collectd-tagger
//!
//! This module provides the command-line interface using clap derive macros.
//!
//! # Options
//!
//! - `[INPUT]...`: Files with metric lines (default: stdin, `-` also means stdin)
//! - `--config` / `-c`: Configuration file path (default: collectd-tagger.yaml, env: COLLECTD_TAGGER_CONFIG)
//! - `--prefix`: collectd metric name prefix regex (env: COLLECTD_TAGGER_PREFIX)
//! - `--store-rates`: Whether counters arrive as rates (env: COLLECTD_TAGGER_STORE_RATES)
//! - `--output-format`: Record format (text/json/yaml)
//! - `--validate`: Validate configuration and rules, then exit
//! - `--dry-run`: Show the compiled rule table, then exit
//! - `--fail-fast`: Stop at the first rejected metric or bad line
//! - `--log-level` / `-l`: Log level (trace/debug/info/warn/error, env: COLLECTD_TAGGER_LOG_LEVEL)
//!
//! # Precedence
//!
//! Configuration values are resolved in the following order (highest to lowest priority):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Config;

/// collectd-tagger - turn collectd metric names into tagged records
///
/// Reads Graphite plaintext lines, matches each metric name against the
/// collectd rule table and writes one tagged record per matched metric.
/// Unmatched metrics are dropped.
#[derive(Parser, Debug)]
#[command(name = "collectd-tagger")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Input files with one metric per line (default: stdin)
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "collectd-tagger.yaml",
        env = "COLLECTD_TAGGER_CONFIG"
    )]
    pub config: PathBuf,

    /// Anchored regex every collectd metric name starts with (overrides config file)
    #[arg(long, value_name = "REGEX", env = "COLLECTD_TAGGER_PREFIX")]
    pub prefix: Option<String>,

    /// Whether collectd stores counters as rates (overrides config file)
    #[arg(long, value_name = "BOOL", env = "COLLECTD_TAGGER_STORE_RATES")]
    pub store_rates: Option<bool>,

    /// Output format for records (overrides config file)
    #[arg(long, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Validate configuration and rules without processing input
    #[arg(long)]
    pub validate: bool,

    /// Show the compiled rule table without processing input
    #[arg(long)]
    pub dry_run: bool,

    /// Stop at the first rejected metric or unparsable line
    #[arg(long)]
    pub fail_fast: bool,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        env = "COLLECTD_TAGGER_LOG_LEVEL"
    )]
    pub log_level: LogLevel,
}

impl Cli {
    /// Apply CLI overrides on top of a loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(prefix) = &self.prefix {
            config.collectd.collectd_prefix = Some(prefix.clone());
        }
        if let Some(store_rates) = self.store_rates {
            config.collectd.store_rates = store_rates;
        }
        if let Some(format) = self.output_format {
            config.output.format = format;
        }
    }
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level - default
    Info,
    /// Warn level
    Warn,
    /// Error level - least verbose
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Record output formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `name tag=value ...` line per record
    Text,
    /// One JSON object per line
    Json,
    /// A single YAML sequence
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}
