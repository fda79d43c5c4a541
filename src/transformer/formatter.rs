//! Tagged record output
//!
//! This module renders [`Target`] records for the downstream store.
//!
//! # Formats
//!
//! ```text
//! text: <name> <tag>=<value> ... [<value> [<timestamp>]]
//! json: {"name": ..., "rule": ..., "tags": {...}, "target_type": ...}   (one per line)
//! yaml: a sequence of the same objects
//! ```
//!
//! In text output `target_type` is written as a tag, and tags are sorted for
//! deterministic output.

use std::io::Write;

use crate::cli::OutputFormat;
use crate::error::{AppError, AppResult};

use super::engine::Target;

/// Record formatter
///
/// # Example
///
/// ```ignore
/// use collectd_tagger::transformer::RecordFormatter;
/// use collectd_tagger::cli::OutputFormat;
///
/// let formatter = RecordFormatter::new(OutputFormat::Json);
/// let output = formatter.format(&targets)?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RecordFormatter {
    format: OutputFormat,
}

impl RecordFormatter {
    /// Create a new formatter
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// The output format in use
    pub fn format_kind(&self) -> OutputFormat {
        self.format
    }

    /// Format records into a single string
    ///
    /// Text and JSON output end every record with a newline.
    pub fn format(&self, targets: &[Target]) -> AppResult<String> {
        match self.format {
            OutputFormat::Text => {
                let mut output = String::with_capacity(targets.len() * 128);
                for target in targets {
                    output.push_str(&Self::format_text(target));
                    output.push('\n');
                }
                Ok(output)
            }
            OutputFormat::Json => {
                let mut output = String::with_capacity(targets.len() * 160);
                for target in targets {
                    output.push_str(&Self::format_json(target)?);
                    output.push('\n');
                }
                Ok(output)
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(targets).map_err(|e| AppError::Output(e.to_string()))
            }
        }
    }

    /// Write one record in streaming formats
    ///
    /// YAML is a single document, so callers collect records and use
    /// [`RecordFormatter::format`] instead.
    pub fn write_record<W: Write>(&self, writer: &mut W, target: &Target) -> AppResult<()> {
        let line = match self.format {
            OutputFormat::Text => Self::format_text(target),
            OutputFormat::Json => Self::format_json(target)?,
            OutputFormat::Yaml => {
                return Err(AppError::Output(
                    "yaml output cannot be streamed per record".to_string(),
                ));
            }
        };
        writeln!(writer, "{}", line).map_err(|e| AppError::Output(e.to_string()))
    }

    /// Whether records can be written one at a time
    pub fn is_streaming(&self) -> bool {
        !matches!(self.format, OutputFormat::Yaml)
    }

    fn format_text(target: &Target) -> String {
        let mut line = target.name.clone();

        for (key, value) in target.all_tags() {
            line.push(' ');
            line.push_str(&key);
            line.push('=');
            line.push_str(&value);
        }

        if let Some(value) = target.value {
            line.push(' ');
            line.push_str(&format_value(value));
            if let Some(ts) = target.timestamp {
                line.push(' ');
                line.push_str(&ts.to_string());
            }
        }

        line
    }

    fn format_json(target: &Target) -> AppResult<String> {
        serde_json::to_string(target).map_err(|e| AppError::Output(e.to_string()))
    }
}

/// Format a sample value
///
/// Integral values are written without a fractional part.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
