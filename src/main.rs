//! CLI entry point for flowstrip

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use flowstrip::config::DEFAULT_OUTPUT_SUFFIX;
use flowstrip::{
    ConsoleReporter, OutputMode, RunController, RunError, SilentReporter, WalkerConfig,
    print_stats_json, print_summary,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Determine whether to use color output based on mode and environment.
fn should_use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // https://no-color.org/
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            if std::env::var_os("FORCE_COLOR").is_some() {
                return true;
            }
            if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
                return false;
            }
            std::io::stdout().is_terminal()
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "flowstrip")]
#[command(about = "Strip Flow pragmas and type-only import/export kinds from JavaScript sources")]
#[command(version)]
struct Args {
    /// File or directory to transform
    path: PathBuf,

    /// Rewrite files in place instead of writing <stem><suffix>.<ext> next to them
    #[arg(long = "in-place", conflicts_with = "suffix")]
    in_place: bool,

    /// Transform and report, but write nothing
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Suffix added to the file stem of outputs
    #[arg(long, value_name = "SUFFIX", default_value = DEFAULT_OUTPUT_SUFFIX, value_parser = parse_suffix)]
    suffix: String,

    /// File extension to process (can be used multiple times; replaces js, jsx, mjs, cjs)
    #[arg(long = "ext", value_name = "EXT")]
    ext: Vec<String>,

    /// Ignore files and directories whose name matches pattern (can be used multiple times)
    #[arg(short = 'I', long = "ignore", value_name = "PATTERN")]
    ignore: Vec<String>,

    /// Additional path glob to skip, relative to the working directory (can be used multiple times)
    #[arg(long = "skip-pattern", value_name = "GLOB")]
    skip_pattern: Vec<String>,

    /// Leave a rewrite rule out of the pipeline (can be used multiple times)
    #[arg(
        long = "disable-rule",
        value_name = "RULE",
        value_parser = ["strip-pragmas", "normalize-import-kinds", "normalize-export-kinds"]
    )]
    disable_rule: Vec<String>,

    /// Number of parallel workers per directory
    /// (0 = auto-detect, 1 = sequential, N = use N workers)
    #[arg(short = 'j', long = "jobs", default_value = "1")]
    jobs: usize,

    /// Only print failures and the final summary
    #[arg(short, long)]
    quiet: bool,

    /// Print the final statistics as JSON instead of progress output
    #[arg(long = "json")]
    json: bool,

    /// Control color output: auto, always, never
    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    color: ColorMode,
}

/// Reject suffixes that would make the output overwrite its input or escape its directory.
fn parse_suffix(s: &str) -> Result<String, String> {
    if s.is_empty() {
        return Err("suffix must not be empty (use --in-place to overwrite inputs)".to_string());
    }
    if s.contains('/') || s.contains('\\') {
        return Err("suffix must not contain path separators".to_string());
    }
    Ok(s.to_string())
}

impl Args {
    fn walker_config(&self) -> WalkerConfig {
        let mut config = WalkerConfig {
            output: if self.in_place {
                OutputMode::InPlace
            } else {
                OutputMode::Sibling {
                    suffix: self.suffix.clone(),
                }
            },
            dry_run: self.dry_run,
            jobs: self.jobs,
            disabled_rules: self.disable_rule.clone(),
            ..Default::default()
        };
        if !self.ext.is_empty() {
            config.extensions = self
                .ext
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect();
        }
        config.skip.ignore_names.extend(self.ignore.iter().cloned());
        config.skip.patterns.extend(self.skip_pattern.iter().cloned());
        config
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn run(args: &Args) -> Result<(), RunError> {
    let controller = RunController::from_config(&args.walker_config())?;

    if args.json {
        let stats = controller.run(&args.path, &mut SilentReporter)?;
        return print_stats_json(&stats).map_err(RunError::Report);
    }

    let use_color = should_use_color(args.color);
    let mut reporter = ConsoleReporter::stdout(use_color, args.quiet);
    let stats = controller.run(&args.path, &mut reporter)?;
    if !args.quiet {
        println!();
    }
    print_summary(&stats, use_color).map_err(RunError::Report)
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version end up here too
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            // Usage errors exit 1, not clap's 2, so `e.exit()` is not used. If the
            // text cannot be written the stream is gone and the exit code still reports.
            let _ = e.print();
            return code;
        }
    };

    init_tracing();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("flowstrip: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("flowstrip").chain(argv.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["src"]).unwrap().walker_config();
        assert_eq!(config.output.suffix(), Some("_transformed"));
        assert_eq!(config.jobs, 1);
        assert!(config.disabled_rules.is_empty());
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let err = parse(&[]).unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn test_in_place_conflicts_with_suffix() {
        assert!(parse(&["src", "--in-place", "--suffix", "_x"]).is_err());
        let config = parse(&["src", "--in-place"]).unwrap().walker_config();
        assert_eq!(config.output, OutputMode::InPlace);
    }

    #[test]
    fn test_empty_suffix_rejected() {
        assert!(parse(&["src", "--suffix", ""]).is_err());
        assert!(parse(&["src", "--suffix", "a/b"]).is_err());
    }

    #[test]
    fn test_lists_extend_defaults() {
        let config = parse(&["src", "-I", "vendor", "--skip-pattern", "**/gen/**", "--ext", ".Flow"])
            .unwrap()
            .walker_config();
        assert_eq!(config.skip.ignore_names, vec!["vendor"]);
        assert_eq!(config.skip.patterns.last().map(String::as_str), Some("**/gen/**"));
        assert!(config.skip.patterns.len() > 1);
        assert_eq!(config.extensions, vec!["flow"]);
    }

    #[test]
    fn test_unknown_rule_rejected() {
        assert!(parse(&["src", "--disable-rule", "nope"]).is_err());
        let config = parse(&["src", "--disable-rule", "strip-pragmas"])
            .unwrap()
            .walker_config();
        assert_eq!(config.disabled_rules, vec!["strip-pragmas"]);
    }
}
