//! CPU stress generator for the chaos demo
//!
//! Pins every available core at 100% for a bounded duration so the status
//! agent has something to react to.

mod workers;

use clap::{error::ErrorKind, Parser};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;
use workers::{available_cores, run_workers, WorkerSpec};

const DEFAULT_DURATION_SECS: u64 = 60;

/// Saturate all CPU cores for a fixed duration
#[derive(Debug, Parser)]
#[command(name = "cpu-stress")]
#[command(version, about = "Saturate all CPU cores for a fixed duration", long_about = None)]
struct Cli {
    /// How long every worker keeps its core busy
    #[arg(value_name = "duration_in_seconds", default_value_t = DEFAULT_DURATION_SECS)]
    duration: u64,
}

fn program_name() -> String {
    std::env::args()
        .next()
        .as_deref()
        .and_then(|arg0| std::path::Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cpu-stress".to_string())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(_) => {
            eprintln!("Usage: {} [duration_in_seconds]", program_name());
            return ExitCode::from(1);
        }
    };

    let cores = available_cores();
    println!("Starting chaos demo on {cores} CPU cores");
    println!("Duration: {} seconds", cli.duration);

    match run_workers(WorkerSpec::from_secs(cli.duration), cores) {
        Ok(report) => {
            println!(
                "Chaos finished after {:.1}s on {} workers. System cooling down.",
                report.elapsed.as_secs_f64(),
                report.workers
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Load generation failed");
            ExitCode::from(1)
        }
    }
}
