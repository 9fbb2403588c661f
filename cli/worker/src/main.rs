//! dl-worker CLI
//!
//! Queue-driven NDJSON to Parquet ingestion worker.

use clap::Parser;
use dl_cli_common::{format_bytes, format_number, format_rate, init_logging};

mod args;
mod run;

use args::Cli;

/// Exit status when at least one file exhausted its attempts.
const EXIT_PARTIAL_FAILURE: i32 = 4;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Held until exit so the file appender flushes.
    let log_guard = init_logging(args.log_level, args.log_dir.as_deref())?;

    let stats = run::execute(args).await?;

    eprintln!();
    eprintln!("Worker stopped ({:?}):", stats.stop_reason);
    eprintln!("  Polls:           {}", format_number(stats.polls));
    eprintln!("  Messages:        {}", format_number(stats.messages_received));
    eprintln!("  Files processed: {}", format_number(stats.files_succeeded));
    eprintln!("  Files failed:    {}", format_number(stats.files_failed));
    eprintln!("  Duplicates:      {}", format_number(stats.duplicates_skipped));
    eprintln!("  Records written: {}", format_number(stats.records_written));
    eprintln!("  Bytes read:      {}", format_bytes(stats.bytes_read));
    eprintln!("  Bytes written:   {}", format_bytes(stats.bytes_written));

    if let Some(secs) = stats.duration_secs() {
        eprintln!("  Duration:        {:.2}s", secs);
        if let Some(rate) = format_rate(stats.files_succeeded, secs, "files") {
            eprintln!("  Throughput:      {}", rate);
        }
    }

    if stats.receive_errors > 0 || stats.ack_failures > 0 {
        eprintln!(
            "  Errors:          {} receive, {} acknowledge",
            stats.receive_errors, stats.ack_failures
        );
    }

    if stats.has_failures() {
        drop(log_guard);
        std::process::exit(EXIT_PARTIAL_FAILURE);
    }

    Ok(())
}
