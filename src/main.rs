//! filesift - Sort a directory tree into per-extension buckets.
//!
//! Usage:
//!   sift --source <PATH> [--output <PATH>]   Copy every file to <output>/<ext>/<name>
//!   sift --help                              Show help

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use itertools::Itertools;
use tracing_subscriber::EnvFilter;

use filesift_ops::{SortConfig, SortSummary, Sorter};

#[derive(Parser)]
#[command(
    name = "filesift",
    version,
    about = "Sort a folder into per-extension buckets (threads, no recursion)",
    long_about = "filesift walks the source tree with a fixed pool of workers and copies \
                  every file to <output>/<extension>/<name>, preserving timestamps.\n\n\
                  Unreadable folders and failed copies are logged and skipped."
)]
struct Cli {
    /// Source folder
    #[arg(short, long)]
    source: PathBuf,

    /// Output folder
    #[arg(short, long, default_value = "dist")]
    output: PathBuf,

    /// Number of workers (0 = one per CPU)
    #[arg(short, long, default_value = "0")]
    workers: usize,

    /// Follow symbolic links instead of skipping them
    #[arg(long)]
    follow_symlinks: bool,

    /// Summary format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = SortConfig::builder()
        .source(cli.source)
        .output(cli.output)
        .workers(cli.workers)
        .follow_symlinks(cli.follow_symlinks)
        .build()
        .wrap_err("Invalid arguments")?;

    let summary = Sorter::new(config).run().wrap_err("Sorting failed")?;

    match cli.format {
        OutputFormat::Text => print_summary(&summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "filesift=debug,warn" } else { "filesift=info,warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .with_thread_names(true)
        .init();
}

/// Print a human-readable run summary.
fn print_summary(summary: &SortSummary) {
    println!();
    println!("{}", "─".repeat(60));
    println!(" {} -> {}", summary.source.display(), summary.output.display());
    println!(
        " {} files ({}) in {} buckets",
        summary.files_copied,
        format_size(summary.bytes_copied),
        summary.buckets.len()
    );
    println!(
        " {} directories with {} workers in {:.2}s",
        summary.dirs_scanned,
        summary.workers,
        summary.elapsed.as_secs_f64()
    );
    println!("{}", "─".repeat(60));
    println!();

    for (bucket, count) in summary
        .buckets
        .iter()
        .sorted_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)))
    {
        println!("   {:<20} {:>8} files", bucket.as_str(), count);
    }

    if !summary.warnings.is_empty() {
        println!();
        println!(
            "{} warning(s): {} directories skipped, {} files failed, {} symlinks skipped",
            summary.warnings.len(),
            summary.dirs_skipped,
            summary.files_failed,
            summary.symlinks_skipped
        );
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
