use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::builder::TypedValueParser;
use clap::{Args, Parser, Subcommand};
use console::style;
use log::{info, warn};

use folder_twins::config::{DEFAULT_CHUNK_SIZE, DEFAULT_PROGRESS_INTERVAL, DEFAULT_WORKERS};
use folder_twins::logging::init_logging;
use folder_twins::progress::ProgressMode;
use folder_twins::utils::format_duration;
use folder_twins::{
    report, CompareMode, DuplicateFinder, EngineConfig, EngineError, Fingerprinter,
    TreeComparator, WorkPool,
};

const EXIT_CONFIG_ERROR: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(
    name = "twins",
    version,
    about = "Find duplicate files in a folder, or compare two folders",
    long_about = "Group files by size, fingerprint only the files that could have a twin, and report duplicates or differences as CSV."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args)]
struct GlobalArgs {
    /// Increase log detail (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log progress lines instead of drawing a progress bar
    #[arg(long, global = true)]
    no_progress: bool,

    /// Number of worker threads
    #[arg(
        short,
        long,
        global = true,
        env = "TWINS_WORKERS",
        default_value_t = DEFAULT_WORKERS,
        value_parser = clap::value_parser!(u64).range(1..).map(|n| n as usize)
    )]
    workers: usize,

    /// Read chunk size in bytes
    #[arg(
        long,
        global = true,
        env = "TWINS_CHUNK_SIZE",
        default_value_t = DEFAULT_CHUNK_SIZE,
        value_parser = clap::value_parser!(u64).range(1..).map(|n| n as usize)
    )]
    chunk_size: usize,

    /// Report progress every N completed files
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_PROGRESS_INTERVAL,
        value_parser = clap::value_parser!(u64).range(1..).map(|n| n as usize)
    )]
    progress_interval: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Find groups of identical files in one folder
    Dupes {
        /// Folder to scan for duplicates
        folder: PathBuf,

        /// Output CSV file
        #[arg(short, long, default_value = "duplicates.csv")]
        output: PathBuf,

        /// Minimum file size in bytes to consider
        #[arg(short, long, default_value_t = 0)]
        min_size: u64,
    },
    /// Compare two folders file by file
    Compare {
        /// First folder to compare
        folder1: PathBuf,

        /// Second folder to compare
        folder2: PathBuf,

        /// Output CSV file
        #[arg(short, long, default_value = "comparison_results.csv")]
        output: PathBuf,

        /// Also list files that are identical in both folders
        #[arg(long)]
        include_identical: bool,

        /// Compare BLAKE3 checksums instead of streaming bytes
        #[arg(long)]
        checksum: bool,
    },
}

impl GlobalArgs {
    fn progress_mode(&self) -> ProgressMode {
        if self.quiet {
            ProgressMode::Silent
        } else if self.no_progress {
            ProgressMode::Log
        } else {
            ProgressMode::Bar
        }
    }

    fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_workers(self.workers)
            .with_chunk_size(self.chunk_size)
            .with_progress_interval(self.progress_interval)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose, cli.global.quiet);

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    }) {
        warn!("Could not install Ctrl+C handler: {}", e);
    }

    match run(cli, cancel) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", style(format!("Error: {:#}", err)).red());
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn run(cli: Cli, cancel: Arc<AtomicBool>) -> Result<ExitCode> {
    let mut config = cli.global.engine_config();
    let progress = cli.global.progress_mode();

    match cli.command {
        Command::Dupes {
            folder,
            output,
            min_size,
        } => {
            config = config.with_min_size(min_size);
            config.validate()?;
            find_duplicates(&config, &folder, &output, progress, cancel)
        }
        Command::Compare {
            folder1,
            folder2,
            output,
            include_identical,
            checksum,
        } => {
            config.validate()?;
            let mode = if checksum {
                CompareMode::Digest
            } else {
                CompareMode::Bytes
            };
            compare_folders(
                &config,
                (folder1.as_path(), folder2.as_path()),
                &output,
                include_identical,
                mode,
                progress,
                cancel,
            )
        }
    }
}

/// Fail before any work starts if a root cannot be scanned.
fn ensure_directory(path: &Path) -> Result<(), EngineError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(EngineError::InvalidRoot {
            path: path.to_path_buf(),
        })
    }
}

fn find_duplicates(
    config: &EngineConfig,
    folder: &Path,
    output: &Path,
    progress: ProgressMode,
    cancel: Arc<AtomicBool>,
) -> Result<ExitCode> {
    ensure_directory(folder)?;

    let started = Instant::now();
    let pool = WorkPool::from_config(config)?.with_cancel_flag(cancel);
    let fingerprinter = Fingerprinter::new(config.chunk_size);
    let finder = DuplicateFinder::new(config, &pool, &fingerprinter);

    let observer = progress.observer("Checksummed");
    let report = finder.find(folder, observer.as_ref())?;

    if pool.is_cancelled() {
        eprintln!("{}", style("Interrupted, no report written").yellow());
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }

    info!("Writing results to: {}", output.display());
    report::save_duplicates(&report, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if progress != ProgressMode::Silent {
        report::print_duplicate_summary(&report)?;
        println!("  Finished in {}", format_duration(started.elapsed()));
    }
    Ok(ExitCode::SUCCESS)
}

fn compare_folders(
    config: &EngineConfig,
    (folder1, folder2): (&Path, &Path),
    output: &Path,
    include_identical: bool,
    mode: CompareMode,
    progress: ProgressMode,
    cancel: Arc<AtomicBool>,
) -> Result<ExitCode> {
    ensure_directory(folder1)?;
    ensure_directory(folder2)?;

    let started = Instant::now();
    let pool = WorkPool::from_config(config)?.with_cancel_flag(cancel);
    let fingerprinter = Fingerprinter::new(config.chunk_size);
    let comparator = TreeComparator::new(config, &pool, &fingerprinter, mode)
        .include_identical(include_identical);

    let observer = progress.observer("Compared");
    let report = comparator.compare(folder1, folder2, observer.as_ref())?;

    if pool.is_cancelled() {
        eprintln!("{}", style("Interrupted, no report written").yellow());
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }

    info!("Writing results to: {}", output.display());
    report::save_comparison(&report, mode, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if progress != ProgressMode::Silent {
        report::print_comparison_summary(&report)?;
        println!("  Finished in {}", format_duration(started.elapsed()));
    }
    Ok(ExitCode::SUCCESS)
}
