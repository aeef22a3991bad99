//! Configuration types for classification, processing and walking

use std::path::{Path, PathBuf};

use crate::classify::derive_output_path;

/// Extensions treated as source files when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];

/// Suffix appended to the file stem of sibling outputs.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_transformed";

/// Directory base names that are never descended into.
pub const DEFAULT_SKIPPED_DIRECTORIES: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "coverage",
    "flow-typed",
];

/// Path globs, matched against paths relative to the base directory.
pub const DEFAULT_SKIP_PATTERNS: &[&str] = &[
    "**/__tests__/**",
    "**/__mocks__/**",
    "**/test/**",
    "**/tests/**",
    "**/*.test.js",
    "**/*.test.jsx",
    "**/*.spec.js",
    "**/*.spec.jsx",
    "**/coverage/**",
    "**/node_modules/**",
    "**/.git/**",
    "**/dist/**",
    "**/build/**",
];

/// Rules that exclude paths from traversal and processing.
#[derive(Debug, Clone)]
pub struct SkipRules {
    /// Exact directory base names to skip (names starting with `.` are always skipped)
    pub directory_names: Vec<String>,
    /// Ordered path globs; `**` spans segments, `*` and `?` stay within one
    pub patterns: Vec<String>,
    /// Base-name globs for files and directories (`--ignore`)
    pub ignore_names: Vec<String>,
}

impl Default for SkipRules {
    fn default() -> Self {
        Self {
            directory_names: DEFAULT_SKIPPED_DIRECTORIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            patterns: DEFAULT_SKIP_PATTERNS.iter().map(|s| s.to_string()).collect(),
            ignore_names: Vec::new(),
        }
    }
}

impl SkipRules {
    /// Rules that skip nothing except dot-directories.
    pub fn none() -> Self {
        Self {
            directory_names: Vec::new(),
            patterns: Vec::new(),
            ignore_names: Vec::new(),
        }
    }
}

/// Where transformed text is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// `<dir>/<stem><suffix>.<ext>` next to the input; the input is left alone.
    Sibling { suffix: String },
    /// Overwrite the input file.
    InPlace,
}

impl Default for OutputMode {
    fn default() -> Self {
        OutputMode::Sibling {
            suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
        }
    }
}

impl OutputMode {
    /// The sibling suffix, if outputs are written next to their inputs.
    pub fn suffix(&self) -> Option<&str> {
        match self {
            OutputMode::Sibling { suffix } => Some(suffix),
            OutputMode::InPlace => None,
        }
    }

    /// Where the transformed text of `path` goes.
    pub fn output_path(&self, path: &Path) -> PathBuf {
        match self {
            OutputMode::Sibling { suffix } => derive_output_path(path, suffix),
            OutputMode::InPlace => path.to_path_buf(),
        }
    }
}

/// Configuration for a whole run.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    pub skip: SkipRules,
    /// Lowercase extensions without the leading dot
    pub extensions: Vec<String>,
    pub output: OutputMode,
    /// Transform but do not write anything
    pub dry_run: bool,
    /// Directory that skip patterns are evaluated relative to.
    /// `None` means the process working directory.
    pub base_dir: Option<PathBuf>,
    /// Number of workers processing the files of one directory.
    /// 0 = auto-detect (use all available cores)
    /// 1 = sequential (no parallelism)
    /// N = use N worker threads
    pub jobs: usize,
    /// Rule names to leave out of the pipeline
    pub disabled_rules: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            skip: SkipRules::default(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            output: OutputMode::default(),
            dry_run: false,
            base_dir: None,
            jobs: 1,
            disabled_rules: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WalkerConfig::default();
        assert_eq!(config.jobs, 1);
        assert!(!config.dry_run);
        assert_eq!(config.output.suffix(), Some("_transformed"));
        assert!(config.extensions.iter().any(|e| e == "jsx"));
        assert!(
            config
                .skip
                .directory_names
                .iter()
                .any(|d| d == "node_modules")
        );
    }

    #[test]
    fn test_in_place_has_no_suffix() {
        assert_eq!(OutputMode::InPlace.suffix(), None);
        assert_eq!(
            OutputMode::InPlace.output_path(Path::new("/a/b.js")),
            PathBuf::from("/a/b.js")
        );
    }

    #[test]
    fn test_sibling_output_path() {
        assert_eq!(
            OutputMode::default().output_path(Path::new("/a/b/Foo.jsx")),
            PathBuf::from("/a/b/Foo_transformed.jsx")
        );
    }
}
