//! dropdigest - SHA-256 digests for dropped files and folder trees.
//!
//! Usage:
//!   dropdigest <PATH>...                 Digest every file under the paths
//!   dropdigest --format json <PATH>...   Emit records as JSON
//!   dropdigest --help                    Show help

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use dropdigest_core::{
    DigestRecord, DropConfig, DropSummary, DropWarning, FileFailure, FsConfig, ReportEvent,
};
use dropdigest_digest::{render_event, start_drop};
use dropdigest_scan::fs::FsDrop;

#[derive(Parser)]
#[command(
    name = "dropdigest",
    version,
    about = "Drop files and folders, get a SHA-256 digest for every file",
    long_about = "dropdigest walks the given files and folder trees breadth-first and \
                  prints one line per file with its size and SHA-256 digest.\n\n\
                  All paths given on one invocation form a single drop."
)]
struct Cli {
    /// Files and directories to digest
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Number of files read and hashed at once
    #[arg(short = 'j', long, default_value = "1")]
    max_concurrent: usize,

    /// Directory entries requested per listing batch
    #[arg(short, long, default_value = "100")]
    batch_size: usize,

    /// Follow symbolic links
    #[arg(short = 'L', long)]
    follow_symlinks: bool,

    /// Skip hidden files and directories
    #[arg(long)]
    no_hidden: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything a drop reported, for JSON output.
#[derive(Debug, Default, Serialize)]
struct JsonReport {
    records: Vec<DigestRecord>,
    failures: Vec<FileFailure>,
    summary: Option<DropSummary>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let fs_config = FsConfig::builder()
        .batch_size(cli.batch_size)
        .follow_symlinks(cli.follow_symlinks)
        .include_hidden(!cli.no_hidden)
        .build()
        .context("Invalid filesystem options")?;
    let drop_config = DropConfig::builder()
        .max_concurrent_reads(cli.max_concurrent)
        .build()
        .context("Invalid drop options")?;

    let backend = FsDrop::new(fs_config);
    let payload = backend
        .entries(&cli.paths)
        .await
        .context("Invalid path")?;

    tracing::info!(paths = cli.paths.len(), entries = payload.len(), "drop started");
    let rx = start_drop(payload, drop_config);
    let success = match cli.format {
        OutputFormat::Text => {
            let mut summary = print_text(rx)
                .await
                .ok_or_else(|| eyre!("drop ended without a summary"))?;
            summary.warnings.extend(backend.warnings());
            print_summary(&summary);
            summary.is_success()
        }
        OutputFormat::Json => {
            let mut report = collect_json(rx).await;
            let summary = report
                .summary
                .as_mut()
                .ok_or_else(|| eyre!("drop ended without a summary"))?;
            summary.warnings.extend(backend.warnings());
            let success = summary.is_success();

            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{json}");
            success
        }
    };

    tracing::info!(success, "drop finished");
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn print_text(mut rx: mpsc::Receiver<ReportEvent>) -> Option<DropSummary> {
    while let Some(event) = rx.recv().await {
        if let Some(line) = render_event(&event) {
            println!("{line}");
        }
        if let ReportEvent::Finished(summary) = event {
            return Some(summary);
        }
    }
    None
}

async fn collect_json(mut rx: mpsc::Receiver<ReportEvent>) -> JsonReport {
    let mut report = JsonReport::default();
    while let Some(event) = rx.recv().await {
        match event {
            ReportEvent::Record { record, .. } => report.records.push(record),
            ReportEvent::Failed { failure, .. } => report.failures.push(failure),
            ReportEvent::Finished(summary) => {
                report.summary = Some(summary);
                break;
            }
            ReportEvent::Started { .. } | ReportEvent::Skipped { .. } => {}
        }
    }
    report
}

fn print_summary(summary: &DropSummary) {
    eprintln!();
    eprintln!("{}", "─".repeat(60));
    eprintln!(
        " {} files, {} digested, {} failed",
        summary.files_total, summary.files_reported, summary.files_failed
    );
    eprintln!(" Hashed {}", format_size(summary.bytes_hashed));
    eprintln!(" Finished in {:.2}s", summary.elapsed.as_secs_f64());
    eprintln!("{}", "─".repeat(60));

    if summary.has_warnings() {
        eprintln!();
        eprintln!("{} warning(s) during drop", summary.warnings.len());
        for warning in summary.warnings.iter().take(10) {
            print_warning(warning);
        }
    }
}

fn print_warning(warning: &DropWarning) {
    eprintln!("  {}: {}", warning.path, warning.message);
}

/// Format bytes as human-readable size.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
