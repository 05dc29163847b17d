// Periodically regenerates the feature-drift and prediction-drift reports.
// Runs until killed, or until a report generation fails.

use clap::Parser;
use fraudwatch::drift::{run_refresh_loop, RefreshConfig};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "drift_monitor", version, about = "Periodic drift report refresher")]
struct Args {
    /// Path to the reference feature dataset
    #[arg(long)]
    reference_data_path: String,

    /// Path to the current feature dataset
    #[arg(long)]
    current_data_path: String,

    /// Path to the reference prediction dataset
    #[arg(long)]
    reference_prediction_path: String,

    /// Path to the current prediction dataset
    #[arg(long)]
    current_prediction_path: String,

    /// Output path for the feature drift report
    #[arg(long)]
    drift_report_path: String,

    /// Output path for the prediction drift report
    #[arg(long)]
    prediction_drift_report_path: String,

    /// Seconds between refreshes
    #[arg(long, default_value_t = 3600)]
    interval: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = RefreshConfig {
        reference_data_path: args.reference_data_path,
        current_data_path: args.current_data_path,
        reference_prediction_path: args.reference_prediction_path,
        current_prediction_path: args.current_prediction_path,
        drift_report_path: args.drift_report_path,
        prediction_drift_report_path: args.prediction_drift_report_path,
        interval: Duration::from_secs(args.interval),
    };

    run_refresh_loop(&config).await?;
    Ok(())
}
