// Replays a CSV of historical records against a running predict endpoint
// to simulate a live data stream.

use anyhow::Context;
use clap::Parser;
use fraudwatch::simulator::{simulate_data_stream, ExecutionMode, SimulatorOptions};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "simulate", version, about = "Simulate a real-time data stream to the inference API")]
struct Args {
    /// Path to the input CSV file
    #[arg(long)]
    input_file: String,

    /// Predict endpoint URL
    #[arg(long)]
    endpoint: String,

    /// Delay between requests in seconds (sequential mode only)
    #[arg(long, default_value_t = 1.0, value_parser = parse_delay, allow_negative_numbers = true)]
    delay: f64,

    /// Optional file to write logs to instead of stderr
    #[arg(long)]
    log_file: Option<String>,

    /// Execution mode
    #[arg(long, value_enum, default_value_t = ExecutionMode::Sequential)]
    execution_mode: ExecutionMode,
}

/// The delay feeds `Duration::from_secs_f64`, which panics on negative or
/// non-finite input; reject those at the CLI boundary instead.
fn parse_delay(s: &str) -> Result<f64, String> {
    let delay: f64 = s.parse().map_err(|e| format!("invalid delay: {e}"))?;
    if !delay.is_finite() || delay < 0.0 {
        return Err(format!(
            "delay must be a non-negative number of seconds, got {s}"
        ));
    }
    Ok(delay)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match &args.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {path}"))?;
            tracing_subscriber::fmt()
                .with_writer(std::sync::Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => tracing_subscriber::fmt::init(),
    }

    let options = SimulatorOptions {
        input_file: args.input_file,
        endpoint: args.endpoint,
        delay: Duration::from_secs_f64(args.delay),
        mode: args.execution_mode,
    };

    let summary = simulate_data_stream(&options)
        .await
        .context("simulation failed")?;

    tracing::info!(
        sent = summary.sent,
        failed = summary.failed,
        skipped = summary.skipped,
        "simulation completed"
    );
    Ok(())
}
