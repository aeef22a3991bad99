//! Per-directory and per-run counters
//!
//! Each walker frame owns a [`FileCounts`] for its own entries and returns a
//! [`GlobalStats`] for its whole subtree. Totals only ever grow by merging a
//! finished frame into its parent, so every global increment traces back to
//! exactly one directory.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Serialize, Serializer};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// File counters for one directory or a whole run.
///
/// `eligible + skipped == encountered` and `succeeded + failed == eligible`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileCounts {
    /// Files with a matching extension that no skip rule excluded
    pub encountered: usize,
    /// Files handed to the processor
    pub eligible: usize,
    /// Files deliberately left alone (outputs of a previous run)
    pub skipped: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl FileCounts {
    /// Record a file that was seen but not processed.
    pub fn record_skipped(&mut self) {
        self.encountered += 1;
        self.skipped += 1;
    }

    /// Record a processed file.
    pub fn record_outcome(&mut self, success: bool) {
        self.encountered += 1;
        self.eligible += 1;
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn merge(&mut self, other: &FileCounts) {
        self.encountered += other.encountered;
        self.eligible += other.eligible;
        self.skipped += other.skipped;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }

    /// Check the counter identities.
    pub fn is_consistent(&self) -> bool {
        self.eligible + self.skipped == self.encountered
            && self.succeeded + self.failed == self.eligible
    }
}

/// Finalized counters of one directory's own files (not its subdirectories).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryStats {
    pub path: PathBuf,
    pub depth: usize,
    pub counts: FileCounts,
}

/// Totals for a subtree or a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GlobalStats {
    pub files: FileCounts,
    /// Directories whose entries were enumerated
    pub directories: usize,
    /// Directories that could not be enumerated
    pub unreadable_directories: usize,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl GlobalStats {
    /// Fold a finished directory frame into the totals.
    pub fn record_directory(&mut self, dir: &DirectoryStats) {
        self.files.merge(&dir.counts);
        self.directories += 1;
    }

    pub fn record_unreadable(&mut self) {
        self.unreadable_directories += 1;
    }

    /// Add the totals of a subtree. Elapsed time is not summed.
    pub fn merge(&mut self, other: &GlobalStats) {
        self.files.merge(&other.files);
        self.directories += other.directories;
        self.unreadable_directories += other.unreadable_directories;
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

/// Millisecond-rounded human form, e.g. `1s 250ms`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = Duration::from_millis(elapsed.as_millis() as u64);
    if millis.is_zero() {
        return "<1ms".to_string();
    }
    humantime::format_duration(millis).to_string()
}

/// Print the run summary to stdout with optional color.
pub fn print_summary(stats: &GlobalStats, use_color: bool) -> io::Result<()> {
    let color_choice = if use_color {
        ColorChoice::Always
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(color_choice);
    write_summary(&mut stdout, stats)
}

/// Write the run summary to any color-capable writer.
pub fn write_summary<W: WriteColor>(out: &mut W, stats: &GlobalStats) -> io::Result<()> {
    let mut bold = ColorSpec::new();
    bold.set_bold(true);
    out.set_color(&bold)?;
    writeln!(out, "Summary")?;
    out.reset()?;
    writeln!(out, "───────")?;

    let files = &stats.files;
    writeln!(
        out,
        "Files:        {} encountered, {} eligible, {} skipped",
        files.encountered, files.eligible, files.skipped
    )?;

    write!(out, "Succeeded:    ")?;
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    writeln!(out, "{}", files.succeeded)?;
    out.reset()?;

    write!(out, "Failed:       ")?;
    if files.failed > 0 {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
    }
    writeln!(out, "{}", files.failed)?;
    out.reset()?;

    write!(out, "Directories:  {} visited", stats.directories)?;
    if stats.unreadable_directories > 0 {
        write!(out, ", ")?;
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        write!(out, "{} unreadable", stats.unreadable_directories)?;
        out.reset()?;
    }
    writeln!(out)?;

    writeln!(out, "Elapsed:      {}", format_elapsed(stats.elapsed))?;
    Ok(())
}

/// Print the run summary as JSON.
pub fn print_stats_json(stats: &GlobalStats) -> io::Result<()> {
    let json = serde_json::to_string_pretty(stats).map_err(io::Error::other)?;
    println!("{}", json);
    Ok(())
}
