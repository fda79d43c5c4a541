//! collectd-tagger - collectd metric name tagger
//!
//! Reads Graphite plaintext metric lines and writes one tagged record per
//! metric matched by the collectd rule table.

use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use collectd_tagger::cli::{Cli, OutputFormat};
use collectd_tagger::collector::InputSource;
use collectd_tagger::config::Config;
use collectd_tagger::runner::{self, RunOptions};
use collectd_tagger::transformer::{RecordFormatter, TransformEngine};

fn main() -> Result<()> {
    let cli = Cli::parse();

    collectd_tagger::init_logging(&cli.log_level.to_string())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting collectd-tagger"
    );

    let mut config = Config::load_or_default(&cli.config)?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let started = Instant::now();
    let engine = TransformEngine::from_config(&config.collectd)?;
    info!(
        rules = engine.rules().len(),
        prefix = %config.collectd.prefix(),
        store_rates = engine.store_rates(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "Rule table compiled"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if cli.validate {
        writeln!(
            out,
            "Configuration is valid ({} rules, prefix {})",
            engine.rules().len(),
            config.collectd.prefix()
        )?;
        return Ok(());
    }

    if cli.dry_run {
        print_rules(&engine, config.output.format, &mut out)?;
        return Ok(());
    }

    let sources: Vec<InputSource> = cli
        .inputs
        .iter()
        .map(|p| InputSource::from_arg(p))
        .collect();

    let stats = runner::run(
        &engine,
        &sources,
        RecordFormatter::new(config.output.format),
        RunOptions {
            fail_fast: cli.fail_fast,
        },
        &mut out,
    )?;
    stats.log_summary();

    Ok(())
}

/// Print the compiled rule table
fn print_rules<W: Write>(
    engine: &TransformEngine,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            writeln!(
                out,
                "{} rules (store_rates: {})",
                engine.rules().len(),
                engine.store_rates()
            )?;
            for (index, rule) in engine.rules().iter().enumerate() {
                let target_type = rule
                    .target_type
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "-".to_string());
                writeln!(out, "{:>2}. {} [{}]", index + 1, rule.name, target_type)?;
                writeln!(out, "    pattern: {}", rule.pattern)?;
                if !rule.tags.is_empty() {
                    let tags: Vec<String> = rule
                        .tags
                        .iter()
                        .map(|(k, v)| format!("{}={}", k, v))
                        .collect();
                    writeln!(out, "    tags: {}", tags.join(" "))?;
                }
                if !rule.fixup.is_none() {
                    writeln!(out, "    fixup: {:?}", rule.fixup)?;
                }
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(engine.rules())
                .context("Failed to serialize rules")?;
            writeln!(out, "{}", json)?;
        }
        OutputFormat::Yaml => {
            let yaml =
                serde_yaml::to_string(engine.rules()).context("Failed to serialize rules")?;
            write!(out, "{}", yaml)?;
        }
    }
    Ok(())
}
