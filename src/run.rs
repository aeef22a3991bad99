//! Run controller: resolve the input path and dispatch

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::classify::PathClassifier;
use crate::config::WalkerConfig;
use crate::error::RunError;
use crate::processor::{FileProcessor, ProcessFile};
use crate::report::Reporter;
use crate::stats::GlobalStats;
use crate::walker::Walker;

/// Runs one invocation over a file or a directory tree.
#[derive(Debug)]
pub struct RunController<P> {
    walker: Walker<P>,
}

impl RunController<FileProcessor> {
    /// Build the classifier, processor and walker described by `config`.
    pub fn from_config(config: &WalkerConfig) -> Result<Self, RunError> {
        let classifier = PathClassifier::new(config)?;
        let processor = FileProcessor::from_config(config);
        Ok(Self::new(
            Walker::new(classifier, processor).with_jobs(config.jobs),
        ))
    }
}

impl<P: ProcessFile> RunController<P> {
    pub fn new(walker: Walker<P>) -> Self {
        Self { walker }
    }

    pub fn walker(&self) -> &Walker<P> {
        &self.walker
    }

    /// Process `input` and return the run totals with the elapsed wall time.
    ///
    /// A regular file is processed directly; a directory is walked from depth
    /// 0. Missing paths and other entry kinds are fatal.
    pub fn run<R: Reporter>(&self, input: &Path, reporter: &mut R) -> Result<GlobalStats, RunError> {
        let start = Instant::now();
        let path = absolutize(input)?;

        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(RunError::PathNotFound(input.to_path_buf()));
            }
            Err(source) => return Err(RunError::Io { path, source }),
        };

        let stats = if metadata.is_file() {
            tracing::debug!(path = %path.display(), "processing single file");
            let counts = self
                .walker
                .visit_file(&path, reporter)
                .map_err(RunError::Report)?;
            GlobalStats {
                files: counts,
                ..Default::default()
            }
        } else if metadata.is_dir() {
            tracing::debug!(path = %path.display(), "walking directory");
            self.walker
                .walk(&path, 0, reporter)
                .map_err(RunError::Report)?
        } else {
            return Err(RunError::UnsupportedPathKind(input.to_path_buf()));
        };

        let stats = stats.with_elapsed(start.elapsed());
        tracing::debug!(
            succeeded = stats.files.succeeded,
            failed = stats.files.failed,
            skipped = stats.files.skipped,
            "run finished"
        );
        Ok(stats)
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, RunError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|source| RunError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RecordingReporter, TestTree};

    fn controller(tree: &TestTree) -> RunController<FileProcessor> {
        let config = WalkerConfig {
            base_dir: Some(tree.path().to_path_buf()),
            ..Default::default()
        };
        RunController::from_config(&config).unwrap()
    }

    #[test]
    fn test_missing_path() {
        let tree = TestTree::new();
        let err = controller(&tree)
            .run(&tree.path().join("nope"), &mut RecordingReporter::default())
            .unwrap_err();
        assert!(matches!(err, RunError::PathNotFound(_)));
    }

    #[test]
    fn test_single_file_with_type_export() {
        let tree = TestTree::new();
        let file = tree.add_file(
            "node_modules/Foo.js",
            "const x = 1;\nexport type { A, B };\nfoo(x);\n",
        );

        let stats = controller(&tree)
            .run(&file, &mut RecordingReporter::default())
            .unwrap();

        assert_eq!(stats.files.succeeded, 1);
        assert_eq!(stats.directories, 0);
        assert_eq!(
            tree.read("node_modules/Foo_transformed.js"),
            "const x = 1;\nexport { A, B };\nfoo(x);\n"
        );
    }

    #[test]
    fn test_single_ineligible_file() {
        let tree = TestTree::new();
        let file = tree.add_file("notes.txt", "// @flow\n");
        let mut reporter = RecordingReporter::default();

        let stats = controller(&tree).run(&file, &mut reporter).unwrap();

        assert_eq!(stats.files, Default::default());
        assert_eq!(reporter.ineligible, vec![file]);
        assert!(!tree.exists("notes_transformed.txt"));
    }

    #[test]
    fn test_directory_with_parse_failure() {
        let tree = TestTree::new();
        tree.add_file("broken.js", "import { from 'x';\n");

        let stats = controller(&tree)
            .run(tree.path(), &mut RecordingReporter::default())
            .unwrap();

        assert_eq!(stats.files.failed, 1);
        assert_eq!(stats.files.succeeded, 0);
        assert!(!tree.exists("broken_transformed.js"));
    }

    #[test]
    fn test_invalid_pattern_is_fatal() {
        let mut config = WalkerConfig::default();
        config.skip.ignore_names.push("[".to_string());
        assert!(matches!(
            RunController::from_config(&config),
            Err(RunError::InvalidPattern { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_fifo_is_unsupported() {
        let tree = TestTree::new();
        let fifo = tree.path().join("pipe");
        let made = std::process::Command::new("mkfifo")
            .arg(&fifo)
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        if !made {
            return;
        }

        let err = controller(&tree)
            .run(&fifo, &mut RecordingReporter::default())
            .unwrap_err();
        assert!(matches!(err, RunError::UnsupportedPathKind(_)));
    }
}
