mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use framewise_core::{BatchReport, ItemOutcome, Pipeline};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::Cli;

/// Install the log subscriber. `RUST_LOG` wins over the verbosity flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn print_summary(report: &BatchReport) {
    for item in &report.items {
        match item {
            ItemOutcome::Written {
                input,
                output,
                frames,
            } => println!(
                "  ok    {} -> {} ({} frame{})",
                input.display(),
                output.display(),
                frames,
                if *frames == 1 { "" } else { "s" }
            ),
            ItemOutcome::Skipped { input, error } => {
                println!("  skip  {}: {}", input.display(), error)
            }
        }
    }
    println!(
        "{} written, {} skipped -> {}",
        report.written(),
        report.skipped(),
        report.output_dir.display()
    );
}

fn run(cli: Cli) -> Result<bool> {
    let config = cli.command.into_config()?;
    info!(input = %config.input.display(), operation = config.operation.name(), "configured");

    let report = Pipeline::new(config)
        .run()
        .context("Batch failed")?;
    print_summary(&report);
    Ok(report.is_complete())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
