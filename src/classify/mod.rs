//! Path classification: what to skip, what to process, where output goes
//!
//! All predicates here are pure; none of them touch the filesystem.

mod pattern;

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::{OutputMode, WalkerConfig};
use crate::error::RunError;

pub use self::pattern::{SkipPattern, first_match, glob_to_regex};

/// Skip and eligibility decisions for one run.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    directory_names: HashSet<String>,
    patterns: Vec<SkipPattern>,
    ignore_names: Vec<glob::Pattern>,
    extensions: Vec<String>,
    suffix: Option<String>,
    base_dir: PathBuf,
}

impl PathClassifier {
    /// Compile the skip rules of `config`.
    ///
    /// `base_dir` falls back to the process working directory.
    pub fn new(config: &WalkerConfig) -> Result<Self, RunError> {
        let patterns = config
            .skip
            .patterns
            .iter()
            .map(|p| {
                SkipPattern::new(p).map_err(|e| RunError::InvalidPattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let ignore_names = config
            .skip
            .ignore_names
            .iter()
            .map(|p| {
                glob::Pattern::new(p).map_err(|e| RunError::InvalidPattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let base_dir = match &config.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };

        Ok(Self {
            directory_names: config.skip.directory_names.iter().cloned().collect(),
            patterns,
            ignore_names,
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            suffix: match &config.output {
                OutputMode::Sibling { suffix } => Some(suffix.clone()),
                OutputMode::InPlace => None,
            },
            base_dir,
        })
    }

    /// True iff the extension is in the configured set (case-insensitive).
    pub fn is_eligible_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }

    /// True iff `name` is a configured directory name or starts with `.`.
    ///
    /// Takes the base name only, never a full path.
    pub fn is_skipped_directory(&self, name: &str) -> bool {
        name.starts_with('.') || self.directory_names.contains(name)
    }

    /// True iff the relative path matches any skip pattern.
    pub fn matches_skip_pattern(&self, relative_path: &str) -> bool {
        first_match(&self.patterns, relative_path).is_some()
    }

    /// Skip-pattern check for an absolute or base-relative filesystem path.
    pub fn path_matches_skip_pattern(&self, path: &Path) -> bool {
        self.matches_skip_pattern(&self.relative_path(path))
    }

    /// True iff `name` matches a user ignore glob.
    pub fn is_ignored_name(&self, name: &str) -> bool {
        self.ignore_names
            .iter()
            .any(|p| name == p.as_str() || p.matches(name))
    }

    /// True iff the file looks like an output of a previous run.
    ///
    /// Always false when rewriting in place.
    pub fn is_derived_output(&self, path: &Path) -> bool {
        match (&self.suffix, path.file_stem().and_then(|s| s.to_str())) {
            (Some(suffix), Some(stem)) => !suffix.is_empty() && stem.ends_with(suffix.as_str()),
            _ => false,
        }
    }

    /// `path` relative to the base directory, with forward slashes.
    ///
    /// Paths outside the base directory keep their full form.
    pub fn relative_path(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.base_dir).unwrap_or(path);
        rel.to_string_lossy().replace('\\', "/")
    }
}

/// Insert `suffix` between the file stem and its extension.
///
/// `/a/b/Foo.jsx` with `_transformed` becomes `/a/b/Foo_transformed.jsx`.
pub fn derive_output_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_stem().unwrap_or_default().to_os_string();
    name.push(suffix);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}
