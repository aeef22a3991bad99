//! Error types for runs, file processing and parsing

use std::path::PathBuf;

use thiserror::Error;

/// A source text could not be parsed.
///
/// Line and column are 1-based; the column counts characters, not bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{line}:{column}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl SyntaxError {
    /// Build an error located at byte `offset` of `source`.
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_col(source, offset);
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Translate a byte offset into a 1-based (line, column) pair.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..floor_char_boundary(source, offset)];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(nl) => before[nl + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, column)
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Failure of the transform pipeline. Nothing is printed when this is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("parse failure at {0}")]
    ParseFailure(#[from] SyntaxError),
}

/// File-local failure. The walker records these and moves on to the next entry.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: PipelineError,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProcessError {
    /// The path the failure is about (the input for read/parse, the output for write).
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Write { path, .. } => path,
        }
    }
}

/// Fatal errors that end the whole run with a non-zero exit status.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("cannot access '{}': No such file or directory", .0.display())]
    PathNotFound(PathBuf),

    #[error("'{}' is neither a regular file nor a directory", .0.display())]
    UnsupportedPathKind(PathBuf),

    #[error("invalid skip pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("cannot inspect '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error writing output: {0}")]
    Report(#[source] std::io::Error),
}
