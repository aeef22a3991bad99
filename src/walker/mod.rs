//! Recursive directory walking
//!
//! The walker enumerates one directory at a time, asks the [`PathClassifier`]
//! what to do with each entry, hands eligible files to a [`ProcessFile`]
//! implementation and returns the counters of the whole subtree.

mod entry;

use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::classify::PathClassifier;
use crate::processor::{ProcessFile, ProcessingOutcome};
use crate::report::Reporter;
use crate::stats::{DirectoryStats, FileCounts, GlobalStats};

pub use self::entry::{Entry, EntryKind, read_entries};

/// What happens to a file found during the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileDecision {
    /// Not counted anywhere
    Invisible,
    /// Counted as encountered and skipped
    Skip,
    Process,
}

/// How the files of one directory are processed.
#[derive(Debug)]
enum Parallelism {
    Sequential,
    /// rayon's global pool
    Global,
    Pool(rayon::ThreadPool),
}

/// Depth-first walker over a directory tree.
#[derive(Debug)]
pub struct Walker<P> {
    classifier: PathClassifier,
    processor: P,
    parallelism: Parallelism,
}

impl<P: ProcessFile> Walker<P> {
    /// A sequential walker.
    pub fn new(classifier: PathClassifier, processor: P) -> Self {
        Self {
            classifier,
            processor,
            parallelism: Parallelism::Sequential,
        }
    }

    /// Number of workers for the files of each directory.
    /// 0 = auto-detect, 1 = sequential, N = N worker threads
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.parallelism = match jobs {
            1 => Parallelism::Sequential,
            0 => Parallelism::Global,
            n => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => Parallelism::Pool(pool),
                Err(e) => {
                    tracing::warn!(error = %e, "cannot build worker pool, using the global pool");
                    Parallelism::Global
                }
            },
        };
        self
    }

    pub fn classifier(&self) -> &PathClassifier {
        &self.classifier
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// True if a subdirectory must not be entered.
    pub fn skips_directory(&self, path: &Path, name: &str) -> bool {
        self.classifier.is_skipped_directory(name)
            || self.classifier.is_ignored_name(name)
            || self.classifier.path_matches_skip_pattern(path)
    }

    /// Decide what to do with a file found in a walked directory.
    pub fn classify_file(&self, path: &Path, name: &str) -> FileDecision {
        if self.classifier.is_ignored_name(name)
            || self.classifier.path_matches_skip_pattern(path)
            || !self.classifier.is_eligible_file(path)
        {
            FileDecision::Invisible
        } else if self.classifier.is_derived_output(path) {
            FileDecision::Skip
        } else {
            FileDecision::Process
        }
    }

    /// Walk `dir` and everything below it; returns the subtree totals.
    ///
    /// A directory that cannot be enumerated is reported and counted as
    /// unreadable; its siblings are unaffected. Only reporter failures are
    /// returned as errors.
    pub fn walk<R: Reporter>(
        &self,
        dir: &Path,
        depth: usize,
        reporter: &mut R,
    ) -> io::Result<GlobalStats> {
        let mut totals = GlobalStats::default();

        let entries = match read_entries(dir) {
            Ok(entries) => entries,
            Err(error) => {
                tracing::warn!(path = %dir.display(), %error, "cannot read directory");
                reporter.directory_failed(dir, &error, depth)?;
                totals.record_unreadable();
                return Ok(totals);
            }
        };

        reporter.directory_entered(dir, depth)?;

        let mut counts = FileCounts::default();
        let mut pending: Vec<PathBuf> = Vec::new();

        for entry in entries {
            let name = entry.name();
            match entry.kind {
                EntryKind::Directory => {
                    if self.skips_directory(&entry.path, &name) {
                        tracing::trace!(path = %entry.path.display(), "skipping directory");
                        continue;
                    }
                    let subtree = self.walk(&entry.path, depth + 1, reporter)?;
                    totals.merge(&subtree);
                }
                EntryKind::File => match self.classify_file(&entry.path, &name) {
                    FileDecision::Invisible => {}
                    FileDecision::Skip => {
                        counts.record_skipped();
                        reporter.file_skipped(&entry.path, depth)?;
                    }
                    FileDecision::Process => {
                        if matches!(self.parallelism, Parallelism::Sequential) {
                            let outcome = self.processor.process(&entry.path);
                            record(&mut counts, reporter, &entry.path, &outcome, depth)?;
                        } else {
                            pending.push(entry.path);
                        }
                    }
                },
            }
        }

        if !pending.is_empty() {
            for (path, outcome) in self.process_batch(&pending) {
                record(&mut counts, reporter, path, &outcome, depth)?;
            }
        }

        let dir_stats = DirectoryStats {
            path: dir.to_path_buf(),
            depth,
            counts,
        };
        reporter.directory_finished(&dir_stats)?;
        totals.record_directory(&dir_stats);

        Ok(totals)
    }

    /// Process one explicitly named file.
    ///
    /// Directory rules, skip patterns and ignore names do not apply; the
    /// extension still has to be eligible, otherwise nothing is counted.
    pub fn visit_file<R: Reporter>(&self, path: &Path, reporter: &mut R) -> io::Result<FileCounts> {
        let mut counts = FileCounts::default();
        if !self.classifier.is_eligible_file(path) {
            tracing::debug!(path = %path.display(), "ineligible input file");
            reporter.ineligible_input(path)?;
            return Ok(counts);
        }
        let outcome = self.processor.process(path);
        record(&mut counts, reporter, path, &outcome, 0)?;
        Ok(counts)
    }

    /// Process files on the worker pool; outcomes come back in input order.
    fn process_batch<'a>(&self, paths: &'a [PathBuf]) -> Vec<(&'a Path, ProcessingOutcome)> {
        let run = || {
            paths
                .par_iter()
                .map(|p| (p.as_path(), self.processor.process(p)))
                .collect::<Vec<_>>()
        };
        match &self.parallelism {
            Parallelism::Pool(pool) => pool.install(run),
            Parallelism::Global | Parallelism::Sequential => run(),
        }
    }
}

fn record<R: Reporter>(
    counts: &mut FileCounts,
    reporter: &mut R,
    path: &Path,
    outcome: &ProcessingOutcome,
    depth: usize,
) -> io::Result<()> {
    if let ProcessingOutcome::Failure(error) = outcome {
        tracing::warn!(path = %path.display(), %error, "file failed");
    }
    counts.record_outcome(outcome.is_success());
    reporter.file_processed(path, outcome, depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputMode, WalkerConfig};
    use crate::processor::FileProcessor;
    use crate::report::SilentReporter;
    use crate::test_utils::{RecordingReporter, TestTree};
    use std::fs;
    use std::sync::Mutex;
    use std::time::Duration;

    fn walker_for(tree: &TestTree, config: WalkerConfig) -> Walker<FileProcessor> {
        let config = WalkerConfig {
            base_dir: Some(tree.path().to_path_buf()),
            ..config
        };
        let classifier = PathClassifier::new(&config).unwrap();
        Walker::new(classifier, FileProcessor::from_config(&config)).with_jobs(config.jobs)
    }

    /// Succeeds on every file and remembers which ones it saw.
    struct Recorder(Mutex<Vec<PathBuf>>);

    impl ProcessFile for Recorder {
        fn process(&self, path: &Path) -> ProcessingOutcome {
            self.0.lock().unwrap().push(path.to_path_buf());
            ProcessingOutcome::Success {
                output: path.to_path_buf(),
                elapsed: Duration::ZERO,
                edits: 0,
                written: false,
            }
        }
    }

    #[test]
    fn test_counts_and_outputs() {
        let tree = TestTree::new();
        tree.add_file("src/a.js", "// @flow\nexport type { A };\n");
        tree.add_file("src/b.jsx", "const b = 1;\n");
        tree.add_file("src/readme.md", "# hi");
        tree.add_file("src/lib/bad.js", "function f( {\n");

        let walker = walker_for(&tree, WalkerConfig::default());
        let stats = walker.walk(tree.path(), 0, &mut SilentReporter).unwrap();

        assert_eq!(stats.files.encountered, 3);
        assert_eq!(stats.files.succeeded, 2);
        assert_eq!(stats.files.failed, 1);
        assert_eq!(stats.directories, 3);
        assert!(stats.files.is_consistent());
        assert_eq!(tree.read("src/a_transformed.js"), "export { A };\n");
        assert!(!tree.path().join("src/lib/bad_transformed.js").exists());
    }

    #[test]
    fn test_node_modules_never_processed() {
        let tree = TestTree::new();
        tree.add_file("node_modules/pkg/index.js", "// @flow\n");
        tree.add_file("packages/x/node_modules/y.js", "// @flow\n");
        tree.add_file(".cache/z.js", "// @flow\n");
        tree.add_file("index.js", "// @flow\n");

        let recorder = Recorder(Mutex::new(Vec::new()));
        let config = WalkerConfig {
            base_dir: Some(tree.path().to_path_buf()),
            ..Default::default()
        };
        let walker = Walker::new(PathClassifier::new(&config).unwrap(), recorder);
        let stats = walker.walk(tree.path(), 0, &mut SilentReporter).unwrap();

        let seen = walker.processor().0.lock().unwrap().clone();
        assert_eq!(seen, vec![tree.path().join("index.js")]);
        assert_eq!(stats.files.encountered, 1);
    }

    #[test]
    fn test_skip_globs_are_invisible() {
        let tree = TestTree::new();
        tree.add_file("src/__tests__/a.js", "");
        tree.add_file("src/a.test.js", "");
        tree.add_file("test/b.js", "");
        tree.add_file("src/keep.js", "");

        let walker = walker_for(&tree, WalkerConfig::default());
        let stats = walker.walk(tree.path(), 0, &mut SilentReporter).unwrap();
        assert_eq!(stats.files.encountered, 1);
        assert_eq!(stats.files.succeeded, 1);
    }

    #[test]
    fn test_derived_outputs_are_skipped() {
        let tree = TestTree::new();
        tree.add_file("a.js", "const a = 1;\n");

        let walker = walker_for(&tree, WalkerConfig::default());
        let first = walker.walk(tree.path(), 0, &mut SilentReporter).unwrap();
        assert_eq!(first.files.succeeded, 1);
        assert_eq!(first.files.skipped, 0);

        let second = walker.walk(tree.path(), 0, &mut SilentReporter).unwrap();
        assert_eq!(second.files.encountered, 2);
        assert_eq!(second.files.skipped, 1);
        assert_eq!(second.files.succeeded, 1);
        assert!(!tree.path().join("a_transformed_transformed.js").exists());
    }

    #[test]
    fn test_in_place_does_not_skip_suffix_names() {
        let tree = TestTree::new();
        tree.add_file("a_transformed.js", "import type { T } from 't';\n");

        let config = WalkerConfig {
            output: OutputMode::InPlace,
            ..Default::default()
        };
        let walker = walker_for(&tree, config);
        let stats = walker.walk(tree.path(), 0, &mut SilentReporter).unwrap();
        assert_eq!(stats.files.succeeded, 1);
        assert_eq!(tree.read("a_transformed.js"), "import { T } from 't';\n");
    }

    #[test]
    fn test_ignore_names() {
        let tree = TestTree::new();
        tree.add_file("vendor/lib.js", "");
        tree.add_file("app.min.js", "");
        tree.add_file("app.js", "");

        let mut config = WalkerConfig::default();
        config.skip.ignore_names = vec!["vendor".to_string(), "*.min.js".to_string()];
        let walker = walker_for(&tree, config);
        let stats = walker.walk(tree.path(), 0, &mut SilentReporter).unwrap();
        assert_eq!(stats.files.encountered, 1);
    }

    #[test]
    fn test_directory_sums_match_totals() {
        let tree = TestTree::new();
        tree.add_file("a.js", "");
        tree.add_file("x/b.js", "");
        tree.add_file("x/y/c.js", "f(\n");
        tree.add_file("x/y/z/d.mjs", "");
        tree.add_file("x/y/z/e_transformed.js", "");

        let walker = walker_for(&tree, WalkerConfig::default());
        let mut reporter = RecordingReporter::default();
        let stats = walker.walk(tree.path(), 0, &mut reporter).unwrap();

        let mut sum = FileCounts::default();
        for dir in &reporter.directories {
            assert!(dir.counts.is_consistent());
            sum.merge(&dir.counts);
        }
        assert_eq!(sum, stats.files);
        assert_eq!(reporter.directories.len(), stats.directories);
        assert_eq!(stats.files.failed, 1);
        assert_eq!(stats.files.skipped, 1);
        assert_eq!(reporter.processed.len(), 4);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let tree = TestTree::new();
        for i in 0..20 {
            tree.add_file(&format!("d{}/f{}.js", i % 3, i), "import type { T } from 't';\n");
        }
        tree.add_file("d0/broken.js", "{");

        let sequential = walker_for(&tree, WalkerConfig::default());
        let seq = sequential.walk(tree.path(), 0, &mut SilentReporter).unwrap();

        for f in fs::read_dir(tree.path()).unwrap() {
            for g in fs::read_dir(f.unwrap().path()).unwrap() {
                let path = g.unwrap().path();
                if path.to_string_lossy().contains("_transformed") {
                    fs::remove_file(path).unwrap();
                }
            }
        }

        let config = WalkerConfig {
            jobs: 4,
            ..Default::default()
        };
        let parallel = walker_for(&tree, config);
        let par = parallel.walk(tree.path(), 0, &mut SilentReporter).unwrap();

        assert_eq!(seq.files, par.files);
        assert_eq!(seq.directories, par.directories);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_spares_siblings() {
        use std::os::unix::fs::PermissionsExt;

        let tree = TestTree::new();
        tree.add_file("locked/a.js", "");
        tree.add_file("open/b.js", "");
        let locked = tree.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // root can read anything; nothing to test then
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let walker = walker_for(&tree, WalkerConfig::default());
        let mut reporter = RecordingReporter::default();
        let stats = walker.walk(tree.path(), 0, &mut reporter).unwrap();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(stats.unreadable_directories, 1);
        assert_eq!(stats.files.succeeded, 1);
        assert_eq!(reporter.failed_directories, vec![locked]);
    }
}
