//! Single-file processing: read, transform, write

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::{OutputMode, WalkerConfig};
use crate::error::ProcessError;
use crate::transform::Pipeline;

/// Result of processing one file. Consumed by the caller right away.
#[derive(Debug)]
pub enum ProcessingOutcome {
    Success {
        /// Where the output went (or would have gone, in a dry run)
        output: PathBuf,
        /// Time spent in parse, transform and print
        elapsed: Duration,
        /// Number of edits the pipeline made
        edits: usize,
        /// False for dry runs and unchanged in-place files
        written: bool,
    },
    Failure(ProcessError),
}

impl ProcessingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingOutcome::Success { .. })
    }
}

/// Something that can turn one input file into an outcome.
///
/// Implementations must not panic; every failure is reported as
/// [`ProcessingOutcome::Failure`].
pub trait ProcessFile: Sync {
    fn process(&self, path: &Path) -> ProcessingOutcome;
}

/// Runs the transform pipeline over a file and writes the result.
#[derive(Debug)]
pub struct FileProcessor {
    pipeline: Pipeline,
    output: OutputMode,
    dry_run: bool,
}

impl FileProcessor {
    pub fn new(pipeline: Pipeline, output: OutputMode) -> Self {
        Self {
            pipeline,
            output,
            dry_run: false,
        }
    }

    /// Standard pipeline minus the disabled rules, with the configured output mode.
    pub fn from_config(config: &WalkerConfig) -> Self {
        let pipeline = config
            .disabled_rules
            .iter()
            .fold(Pipeline::standard(), |pipeline, name| pipeline.without(name));
        Self::new(pipeline, config.output.clone()).dry_run(config.dry_run)
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn try_process(&self, path: &Path) -> Result<(PathBuf, Duration, usize, bool), ProcessError> {
        let source = fs::read_to_string(path).map_err(|source| ProcessError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let start = Instant::now();
        let (text, edits) =
            self.pipeline
                .run_counted(&source)
                .map_err(|source| ProcessError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
        let elapsed = start.elapsed();

        let output = self.output.output_path(path);
        let unchanged_in_place = self.output == OutputMode::InPlace && text == source;
        let write = !self.dry_run && !unchanged_in_place;
        if write {
            fs::write(&output, text).map_err(|source| ProcessError::Write {
                path: output.clone(),
                source,
            })?;
        }

        Ok((output, elapsed, edits, write))
    }
}

impl ProcessFile for FileProcessor {
    fn process(&self, path: &Path) -> ProcessingOutcome {
        match self.try_process(path) {
            Ok((output, elapsed, edits, written)) => {
                tracing::debug!(
                    path = %path.display(),
                    output = %output.display(),
                    edits,
                    elapsed_us = elapsed.as_micros() as u64,
                    "processed file"
                );
                ProcessingOutcome::Success {
                    output,
                    elapsed,
                    edits,
                    written,
                }
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "file failed");
                ProcessingOutcome::Failure(e)
            }
        }
    }
}
