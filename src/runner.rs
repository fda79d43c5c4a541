//! Input processing loop
//!
//! Reads samples from each input source, tags them with the transform engine
//! and writes records through the formatter.

use std::io::{BufRead, Write};

use tracing::{debug, info, warn};

use crate::collector::{InputSource, LineReader};
use crate::error::{AppError, AppResult};
use crate::metrics::{StatsSnapshot, TransformStats};
use crate::transformer::{RecordFormatter, Target, TransformEngine};

/// Processing options
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Abort on the first rejected metric or bad line instead of skipping it
    pub fail_fast: bool,
}

/// Tags metric lines and writes records
pub struct Runner<'a> {
    engine: &'a TransformEngine,
    formatter: RecordFormatter,
    options: RunOptions,
    stats: TransformStats,
    /// Records held back for non-streaming formats
    pending: Vec<Target>,
}

impl<'a> Runner<'a> {
    /// Create a runner
    pub fn new(
        engine: &'a TransformEngine,
        formatter: RecordFormatter,
        options: RunOptions,
    ) -> Self {
        Self {
            engine,
            formatter,
            options,
            stats: TransformStats::for_rules(engine.rules()),
            pending: Vec::new(),
        }
    }

    /// Process every line of a reader
    ///
    /// # Errors
    ///
    /// I/O and output errors always abort. Per-line parse errors and
    /// rejected metrics abort only with `fail_fast`.
    pub fn process<R: BufRead, W: Write>(&mut self, reader: R, writer: &mut W) -> AppResult<()> {
        for result in LineReader::new(reader) {
            let sample = match result {
                Ok(sample) => sample,
                Err(e) if e.is_recoverable() && !self.options.fail_fast => {
                    warn!(error = %e, "Skipping line");
                    self.stats.record_invalid();
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            self.stats.record_line();

            match self
                .engine
                .transform_sample(&sample.name, sample.value, sample.timestamp)
            {
                Ok(Some(target)) => {
                    self.stats.record_match(&target.rule);
                    if self.formatter.is_streaming() {
                        self.formatter.write_record(writer, &target)?;
                    } else {
                        self.pending.push(target);
                    }
                }
                Ok(None) => {
                    debug!(line = sample.line, metric = %sample.name, "Unmatched metric dropped");
                    self.stats.record_unmatched();
                }
                Err(e) if !self.options.fail_fast => {
                    warn!(line = sample.line, metric = %sample.name, error = %e, "Dropping metric");
                    self.stats.record_rejected();
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    /// Process an input source
    pub fn process_source<W: Write>(
        &mut self,
        source: &InputSource,
        writer: &mut W,
    ) -> AppResult<()> {
        debug!(input = %source, "Reading input");
        let reader = source.open()?;
        self.process(reader, writer)
    }

    /// Flush held-back records and return the final statistics
    pub fn finish<W: Write>(mut self, writer: &mut W) -> AppResult<StatsSnapshot> {
        if !self.pending.is_empty() {
            let output = self.formatter.format(&self.pending)?;
            writer
                .write_all(output.as_bytes())
                .map_err(|e| AppError::Output(e.to_string()))?;
            self.pending.clear();
        }
        writer.flush().map_err(|e| AppError::Output(e.to_string()))?;

        Ok(self.stats.snapshot())
    }
}

/// Process all input sources and write records to `writer`
///
/// An empty source list reads stdin.
pub fn run<W: Write>(
    engine: &TransformEngine,
    sources: &[InputSource],
    formatter: RecordFormatter,
    options: RunOptions,
    writer: &mut W,
) -> AppResult<StatsSnapshot> {
    let mut runner = Runner::new(engine, formatter, options);

    if sources.is_empty() {
        runner.process_source(&InputSource::Stdin, writer)?;
    } else {
        for source in sources {
            runner.process_source(source, writer)?;
        }
    }

    let snapshot = runner.finish(writer)?;
    info!(
        format = %formatter.format_kind(),
        records = snapshot.matched,
        "Records written"
    );
    Ok(snapshot)
}
