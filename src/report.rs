//! Progress reporting for the walker and run controller

use std::io::{self, Write};
use std::path::Path;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::processor::ProcessingOutcome;
use crate::stats::{DirectoryStats, format_elapsed};

/// Receives walk events as they happen.
///
/// `depth` is the nesting level of the directory being walked (0 for the
/// root) and only affects presentation.
pub trait Reporter {
    fn directory_entered(&mut self, path: &Path, depth: usize) -> io::Result<()>;

    fn file_processed(
        &mut self,
        path: &Path,
        outcome: &ProcessingOutcome,
        depth: usize,
    ) -> io::Result<()>;

    /// A derived output of a previous run was found and left alone.
    fn file_skipped(&mut self, path: &Path, depth: usize) -> io::Result<()>;

    /// Called once per directory after all of its entries, with its own counters.
    fn directory_finished(&mut self, stats: &DirectoryStats) -> io::Result<()>;

    /// The directory could not be enumerated; its subtree is abandoned.
    fn directory_failed(&mut self, path: &Path, error: &io::Error, depth: usize)
    -> io::Result<()>;

    /// A single input file was named whose extension is not processed.
    fn ineligible_input(&mut self, path: &Path) -> io::Result<()>;
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn directory_entered(&mut self, _path: &Path, _depth: usize) -> io::Result<()> {
        Ok(())
    }

    fn file_processed(
        &mut self,
        _path: &Path,
        _outcome: &ProcessingOutcome,
        _depth: usize,
    ) -> io::Result<()> {
        Ok(())
    }

    fn file_skipped(&mut self, _path: &Path, _depth: usize) -> io::Result<()> {
        Ok(())
    }

    fn directory_finished(&mut self, _stats: &DirectoryStats) -> io::Result<()> {
        Ok(())
    }

    fn directory_failed(
        &mut self,
        _path: &Path,
        _error: &io::Error,
        _depth: usize,
    ) -> io::Result<()> {
        Ok(())
    }

    fn ineligible_input(&mut self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

/// Human-readable, indented progress output.
pub struct ConsoleReporter<W: WriteColor> {
    out: W,
    /// Only failures are printed
    quiet: bool,
}

impl ConsoleReporter<StandardStream> {
    /// Report to stdout.
    pub fn stdout(use_color: bool, quiet: bool) -> Self {
        let color_choice = if use_color {
            ColorChoice::Always
        } else {
            ColorChoice::Never
        };
        Self::new(StandardStream::stdout(color_choice), quiet)
    }
}

impl<W: WriteColor> ConsoleReporter<W> {
    pub fn new(out: W, quiet: bool) -> Self {
        Self { out, quiet }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn indent(&mut self, depth: usize) -> io::Result<()> {
        write!(self.out, "{}", "  ".repeat(depth))
    }

    fn colored(&mut self, color: Color, bold: bool, text: &str) -> io::Result<()> {
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(color)).set_bold(bold);
        self.out.set_color(&spec)?;
        write!(self.out, "{}", text)?;
        self.out.reset()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

impl<W: WriteColor> Reporter for ConsoleReporter<W> {
    fn directory_entered(&mut self, path: &Path, depth: usize) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.indent(depth)?;
        let name = if depth == 0 {
            path.display().to_string()
        } else {
            display_name(path)
        };
        self.colored(Color::Blue, true, &format!("{}/", name))?;
        writeln!(self.out)
    }

    fn file_processed(
        &mut self,
        path: &Path,
        outcome: &ProcessingOutcome,
        depth: usize,
    ) -> io::Result<()> {
        match outcome {
            ProcessingOutcome::Success {
                output,
                elapsed,
                edits,
                written,
            } => {
                if self.quiet {
                    return Ok(());
                }
                self.indent(depth + 1)?;
                self.colored(Color::Green, false, "✓ ")?;
                write!(self.out, "{}", display_name(path))?;
                if output != path {
                    let arrow = if *written { "→" } else { "⇢" };
                    write!(self.out, " {} {}", arrow, display_name(output))?;
                }
                let noun = if *edits == 1 { "edit" } else { "edits" };
                writeln!(
                    self.out,
                    " ({} {}, {})",
                    edits,
                    noun,
                    format_elapsed(*elapsed)
                )
            }
            ProcessingOutcome::Failure(error) => {
                self.indent(depth + 1)?;
                self.colored(Color::Red, true, "✗ ")?;
                writeln!(self.out, "{}", error)
            }
        }
    }

    fn file_skipped(&mut self, path: &Path, depth: usize) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.indent(depth + 1)?;
        self.colored(Color::Yellow, false, "- ")?;
        writeln!(self.out, "{} (previous output)", display_name(path))
    }

    fn directory_finished(&mut self, stats: &DirectoryStats) -> io::Result<()> {
        let counts = &stats.counts;
        if self.quiet || counts.encountered == 0 {
            return Ok(());
        }
        self.indent(stats.depth + 1)?;
        writeln!(
            self.out,
            "{} succeeded, {} failed, {} skipped",
            counts.succeeded, counts.failed, counts.skipped
        )
    }

    fn directory_failed(
        &mut self,
        path: &Path,
        error: &io::Error,
        depth: usize,
    ) -> io::Result<()> {
        self.indent(depth)?;
        self.colored(Color::Yellow, true, "! ")?;
        writeln!(self.out, "cannot read {}: {}", path.display(), error)
    }

    fn ineligible_input(&mut self, path: &Path) -> io::Result<()> {
        self.colored(Color::Yellow, true, "warning: ")?;
        writeln!(
            self.out,
            "{} does not have a processed extension; nothing to do",
            path.display()
        )
    }
}
