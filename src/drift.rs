//! Periodic drift-report refresh.
//!
//! Regenerates both reports, sleeps the configured interval, repeats. A
//! generation error propagates out and ends the loop; there is no restart
//! policy, so stopping or crashing the process is the only exit.

use crate::errors::ServeResult;
use crate::report;
use std::time::Duration;

/// Paths and cadence for the refresh loop.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub reference_data_path: String,
    pub current_data_path: String,
    pub reference_prediction_path: String,
    pub current_prediction_path: String,
    pub drift_report_path: String,
    pub prediction_drift_report_path: String,
    pub interval: Duration,
}

/// Regenerate both report artifacts once.
pub fn refresh_drift_reports(config: &RefreshConfig) -> ServeResult<()> {
    report::generate_feature_drift_report(
        &config.reference_data_path,
        &config.current_data_path,
        &config.drift_report_path,
    )?;
    report::generate_target_drift_report(
        &config.reference_prediction_path,
        &config.current_prediction_path,
        &config.prediction_drift_report_path,
    )?;

    tracing::info!("drift reports refreshed");
    Ok(())
}

/// Refresh forever. Returns only when a generation fails.
pub async fn run_refresh_loop(config: &RefreshConfig) -> ServeResult<()> {
    loop {
        refresh_drift_reports(config)?;
        tracing::info!(seconds = config.interval.as_secs(), "sleeping before next refresh");
        tokio::time::sleep(config.interval).await;
    }
}
