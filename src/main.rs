//! chatterbox-driver CLI entry point.

use anyhow::{Context, Result};
use chatterbox_driver::backend::create_provider;
use chatterbox_driver::cli::Args;
use chatterbox_driver::engine::{DriverError, RunReport, load_and_run};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let plan = args.plan();

    let provider = create_provider(&args.host, args.port)
        .context("Failed to create model server client")?;

    println!("Loading model on {}...", args.device);
    let report = load_and_run(&provider, args.device, &plan).map_err(|e| {
        let context = match &e {
            DriverError::ModelLoad { .. } => {
                format!("Failed to load model from {}:{}", args.host, args.port)
            }
            _ => "Synthesis run aborted".to_string(),
        };
        anyhow::Error::new(e).context(context)
    })?;
    print_report(&report);

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &RunReport) {
    println!("  Sample rate: {} Hz", report.sample_rate);
    for outcome in &report.outputs {
        println!("Audio saved to: {}", outcome.output.display());
        match &outcome.audio_prompt {
            Some(prompt) => println!("  Voice prompt: {}", prompt.display()),
            None => println!("  Voice prompt: none"),
        }
        println!("  Duration: {:.2}s", outcome.duration_secs);
    }
}
