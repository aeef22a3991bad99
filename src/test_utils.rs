//! Test utilities for building temporary source trees.
//!
//! This module is only compiled for tests and benchmarks.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::processor::ProcessingOutcome;
use crate::report::Reporter;
use crate::stats::DirectoryStats;

/// A temporary directory tree for testing.
///
/// The tree is automatically cleaned up when dropped.
pub struct TestTree {
    dir: TempDir,
}

impl TestTree {
    /// Create a new empty temporary directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        Self { dir }
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Add a file, creating parent directories as needed.
    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Add an empty directory.
    pub fn add_dir(&self, path: &str) -> PathBuf {
        let full_path = self.dir.path().join(path);
        fs::create_dir_all(&full_path).expect("Failed to create dir");
        full_path
    }

    /// Read a file of the tree as text.
    pub fn read(&self, path: &str) -> String {
        fs::read_to_string(self.dir.path().join(path)).expect("Failed to read file")
    }

    /// True if `path` exists in the tree.
    pub fn exists(&self, path: &str) -> bool {
        self.dir.path().join(path).exists()
    }
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

/// A reporter that keeps every event for later inspection.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub entered: Vec<(PathBuf, usize)>,
    /// Processed files and whether they succeeded
    pub processed: Vec<(PathBuf, bool)>,
    pub skipped: Vec<PathBuf>,
    pub directories: Vec<DirectoryStats>,
    pub failed_directories: Vec<PathBuf>,
    pub ineligible: Vec<PathBuf>,
}

impl Reporter for RecordingReporter {
    fn directory_entered(&mut self, path: &Path, depth: usize) -> io::Result<()> {
        self.entered.push((path.to_path_buf(), depth));
        Ok(())
    }

    fn file_processed(
        &mut self,
        path: &Path,
        outcome: &ProcessingOutcome,
        _depth: usize,
    ) -> io::Result<()> {
        self.processed
            .push((path.to_path_buf(), outcome.is_success()));
        Ok(())
    }

    fn file_skipped(&mut self, path: &Path, _depth: usize) -> io::Result<()> {
        self.skipped.push(path.to_path_buf());
        Ok(())
    }

    fn directory_finished(&mut self, stats: &DirectoryStats) -> io::Result<()> {
        self.directories.push(stats.clone());
        Ok(())
    }

    fn directory_failed(
        &mut self,
        path: &Path,
        _error: &io::Error,
        _depth: usize,
    ) -> io::Result<()> {
        self.failed_directories.push(path.to_path_buf());
        Ok(())
    }

    fn ineligible_input(&mut self, path: &Path) -> io::Result<()> {
        self.ineligible.push(path.to_path_buf());
        Ok(())
    }
}
