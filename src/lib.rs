//! Flowstrip - strip Flow pragmas and type-only import/export kinds from a source tree

pub mod classify;
pub mod config;
pub mod error;
pub mod processor;
pub mod report;
pub mod run;
pub mod stats;
pub mod syntax;
pub mod transform;
pub mod walker;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use classify::{PathClassifier, derive_output_path};
pub use config::{OutputMode, SkipRules, WalkerConfig};
pub use error::{PipelineError, ProcessError, RunError, SyntaxError};
pub use processor::{FileProcessor, ProcessFile, ProcessingOutcome};
pub use report::{ConsoleReporter, Reporter, SilentReporter};
pub use run::RunController;
pub use stats::{DirectoryStats, FileCounts, GlobalStats, print_stats_json, print_summary};
pub use transform::{Pipeline, RewriteRule};
pub use walker::Walker;
