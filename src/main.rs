mod aggregator;
mod cancel;
mod config;
mod error;
mod hasher;
mod logging;
mod output;
mod pipeline;
mod scanner;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use crate::cancel::CancelToken;
use crate::config::{Admission, DEFAULT_JOBS, HashAlgorithm, ScanConfig};
use crate::error::ConfigError;

/// Duplicates found with `--action report-exit-code`
const EXIT_DUPLICATES: u8 = 1;
const EXIT_USAGE: u8 = 2;
/// Something was skipped with `--strict`
const EXIT_SKIPPED: u8 = 3;
const EXIT_INTERNAL: u8 = 4;

#[derive(Parser, Debug)]
#[command(name = "dupscan")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory to scan for duplicates
    #[arg(long = "search_path", visible_alias = "search-path", default_value = "./")]
    search_path: PathBuf,

    /// Minimum file size in kilobytes to consider (0 disables the filter)
    #[arg(long = "min_size_kb", visible_alias = "min-size-kb", default_value_t = 0)]
    min_size_kb: u64,

    /// Glob of file or directory names to skip (repeatable)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// File with one exclude glob per line (`#` starts a comment)
    #[arg(long)]
    exclude_file: Option<PathBuf>,

    /// Maximum number of files hashed at the same time
    #[arg(short, long, default_value_t = DEFAULT_JOBS)]
    jobs: usize,

    /// How hashing slots are handed out
    #[arg(long, value_enum, default_value_t = Admission::Steady)]
    admission: Admission,

    /// Content hash algorithm
    #[arg(long = "hash", value_enum, default_value_t = HashAlgorithm::Sha1)]
    algorithm: HashAlgorithm,

    /// Confirm hash matches byte for byte before reporting them
    #[arg(long)]
    verify: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    /// What to do once the scan is done
    #[arg(short, long, value_enum, default_value_t = Action::Report)]
    action: Action,

    /// Exit with a non-zero code if any file had to be skipped
    #[arg(long)]
    strict: bool,

    /// Hide the progress spinner
    #[arg(long)]
    no_progress: bool,

    /// Log scan summaries, not just problems
    #[arg(short, long)]
    verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON output for scripting
    Json,
}

/// What to do with found duplicates
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Action {
    /// Just report duplicates (default, exit code 0)
    Report,
    /// Report duplicates and exit with code 1 if any were found
    ReportExitCode,
}

impl Cli {
    fn scan_config(&self) -> Result<ScanConfig, ConfigError> {
        let mut patterns = self.exclude.clone();
        if let Some(path) = &self.exclude_file {
            patterns.extend(config::read_exclude_file(path)?);
        }

        let mut config = ScanConfig::new(&self.search_path)
            .with_min_size_kb(self.min_size_kb)
            .with_excludes(&patterns)?;
        config.jobs = self.jobs;
        config.admission = self.admission;
        config.algorithm = self.algorithm;
        config.verify = self.verify;
        config.validate()?;
        Ok(config)
    }
}

fn progress_bar(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {pos} files hashed ({elapsed})") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match cli.scan_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Usage: dupscan --search_path=/some/path");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let cancel = CancelToken::new();
    if let Err(e) = cancel.install_ctrlc_handler() {
        tracing::warn!("cannot install Ctrl-C handler: {e}");
    }

    let human = matches!(cli.format, OutputFormat::Human);
    let progress = progress_bar(human && !cli.no_progress);

    let outcome = pipeline::run_scan(&config, &cancel, &progress, |finding| {
        if human {
            progress.suspend(|| output::print_finding(finding));
        }
    });
    progress.finish_and_clear();

    let report = match outcome {
        Ok(outcome) => {
            if outcome.walk.errors > 0 {
                tracing::info!(
                    "{} directory entries could not be read",
                    outcome.walk.errors
                );
            }
            tracing::debug!(batches = outcome.pool.batches, "hasher pool stats");
            outcome.report
        }
        Err(e) => {
            tracing::error!("scan failed: {e}");
            return ExitCode::from(EXIT_INTERNAL);
        }
    };

    match cli.format {
        OutputFormat::Human => report.print_human(),
        OutputFormat::Json => report.print_json(),
    }

    if cli.strict && report.stats.files_skipped > 0 {
        return ExitCode::from(EXIT_SKIPPED);
    }
    if matches!(cli.action, Action::ReportExitCode) && report.has_duplicates() {
        return ExitCode::from(EXIT_DUPLICATES);
    }
    ExitCode::SUCCESS
}
