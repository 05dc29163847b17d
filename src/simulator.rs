//! Replays historical CSV rows against a running predict endpoint to
//! simulate live traffic.
//!
//! Pre-flight checks (file, URL, health) are hard stops. Per-row failures
//! are not: an invalid row is skipped, a send that exhausts its retries is
//! recorded, and the stream continues either way.

use crate::errors::{ServeError, ServeResult};
use crate::schema::{self, InputRecord};
use reqwest::Url;
use serde_json::{Map, Number, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Attempts per row before the failure is recorded.
const MAX_ATTEMPTS: u32 = 3;
/// Wait between attempts.
const RETRY_WAIT: Duration = Duration::from_secs(2);
/// Worker pool size in parallel mode.
const POOL_SIZE: usize = 5;
/// Health-check timeout.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Ground-truth column dropped from source rows before sending.
const LABEL_COLUMN: &str = "Class";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExecutionMode {
    Sequential,
    Parallel,
}

#[derive(Debug, Clone)]
pub struct SimulatorOptions {
    pub input_file: String,
    pub endpoint: String,
    /// Delay after each successful send, sequential mode only.
    pub delay: Duration,
    pub mode: ExecutionMode,
}

/// Outcome counters for one replay run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimulationSummary {
    /// Rows sent and acknowledged by the endpoint.
    pub sent: usize,
    /// Rows that exhausted their retries.
    pub failed: usize,
    /// Rows dropped by schema validation before any send.
    pub skipped: usize,
}

/// Run the full replay: pre-flight checks, then one send per valid row.
pub async fn simulate_data_stream(options: &SimulatorOptions) -> ServeResult<SimulationSummary> {
    validate_file(&options.input_file)?;
    let endpoint = validate_endpoint_url(&options.endpoint)?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    check_api_health(&client, &endpoint).await?;

    let rows = read_rows(&options.input_file)?;
    tracing::info!(rows = rows.len(), endpoint = %endpoint, "starting replay");

    let mut summary = SimulationSummary::default();
    let mut records = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        match schema::validate(row) {
            Ok(record) => records.push(record),
            Err(violations) => {
                tracing::error!(row = index, %violations, "invalid input row, skipping");
                summary.skipped += 1;
            }
        }
    }

    match options.mode {
        ExecutionMode::Sequential => {
            for record in &records {
                match api_request(&client, &endpoint, record).await {
                    Ok(response) => {
                        tracing::info!(?response, "API response");
                        summary.sent += 1;
                        tokio::time::sleep(options.delay).await;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "send failed after retries");
                        summary.failed += 1;
                    }
                }
            }
        }
        ExecutionMode::Parallel => {
            let semaphore = Arc::new(Semaphore::new(POOL_SIZE));
            let mut tasks = JoinSet::new();

            for record in records {
                let permit = semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| ServeError::prediction("worker pool closed"))?;
                let client = client.clone();
                let endpoint = endpoint.clone();

                tasks.spawn(async move {
                    let result = api_request(&client, &endpoint, &record).await;
                    drop(permit);
                    result
                });
            }

            // Results arrive in completion order, not submission order.
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(Ok(response)) => {
                        tracing::info!(?response, "API response");
                        summary.sent += 1;
                    }
                    Ok(Err(e)) => {
                        tracing::error!(error = %e, "send failed after retries");
                        summary.failed += 1;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "send task panicked");
                        summary.failed += 1;
                    }
                }
            }
        }
    }

    tracing::info!(
        sent = summary.sent,
        failed = summary.failed,
        skipped = summary.skipped,
        "replay complete"
    );
    Ok(summary)
}

/// Source must exist and be a `.csv` file.
pub fn validate_file(path: impl AsRef<Path>) -> ServeResult<()> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ServeError::validation(format!(
            "file not found: {}",
            path.display()
        )));
    }
    if path.extension().and_then(|e| e.to_str()) != Some("csv") {
        return Err(ServeError::validation(format!(
            "file must be a CSV: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Endpoint must parse as an http(s) URL with a host.
pub fn validate_endpoint_url(endpoint: &str) -> ServeResult<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| ServeError::validation(format!("invalid endpoint URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ServeError::validation(format!(
            "invalid endpoint URL: {endpoint}"
        )));
    }
    Ok(url)
}

/// Ping `/health` on the endpoint's origin. Any non-200 or connection
/// failure aborts the run before a single row is sent.
pub async fn check_api_health(client: &reqwest::Client, endpoint: &Url) -> ServeResult<()> {
    let mut health_url = endpoint.clone();
    health_url.set_path("/health");
    health_url.set_query(None);

    let response = client
        .get(health_url.clone())
        .timeout(HEALTH_TIMEOUT)
        .send()
        .await
        .map_err(|e| ServeError::network("health check", e))?;

    if !response.status().is_success() {
        return Err(ServeError::validation(format!(
            "API health check failed with status {}",
            response.status()
        )));
    }
    tracing::info!(url = %health_url, "API is healthy");
    Ok(())
}

/// POST one record, retrying up to [`MAX_ATTEMPTS`] with a fixed wait.
pub async fn api_request(
    client: &reqwest::Client,
    endpoint: &Url,
    record: &InputRecord,
) -> ServeResult<Value> {
    let mut last_err = None;

    for attempt in 1..=MAX_ATTEMPTS {
        let outcome = async {
            let response = client.post(endpoint.clone()).json(record).send().await?;
            let response = response.error_for_status()?;
            response.json::<Value>().await
        }
        .await;

        match outcome {
            Ok(body) => return Ok(body),
            Err(e) => {
                tracing::warn!(attempt, error = %e, "API request error");
                last_err = Some(e);
                if attempt < MAX_ATTEMPTS {
                    tokio::time::sleep(RETRY_WAIT).await;
                }
            }
        }
    }

    Err(ServeError::network(
        "predict request",
        last_err.expect("at least one attempt was made"),
    ))
}

/// Read all rows as JSON objects, dropping the ground-truth label column.
/// Numeric cells become numbers; anything else is kept as a string so that
/// schema validation rejects it.
pub fn read_rows(path: impl AsRef<Path>) -> ServeResult<Vec<Map<String, Value>>> {
    let mut reader =
        csv::Reader::from_path(path.as_ref()).map_err(|e| ServeError::csv("opening source", e))?;
    let headers = reader
        .headers()
        .map_err(|e| ServeError::csv("reading headers", e))?
        .clone();

    if headers.iter().any(|h| h == LABEL_COLUMN) {
        tracing::warn!("'{LABEL_COLUMN}' column found in input, dropping it for inference");
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| ServeError::csv("reading row", e))?;
        let mut row = Map::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            if header == LABEL_COLUMN {
                continue;
            }
            let value = match cell.parse::<f64>().ok().and_then(Number::from_f64) {
                Some(n) => Value::Number(n),
                None => Value::String(cell.to_string()),
            };
            row.insert(header.to_string(), value);
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_file() {
        assert!(validate_file("no/such/stream.csv").is_err());
    }

    #[test]
    fn rejects_wrong_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.txt");
        std::fs::write(&path, "Time,Amount\n1,2\n").unwrap();
        assert!(validate_file(&path).is_err());
    }

    #[test]
    fn accepts_existing_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.csv");
        std::fs::write(&path, "Time,Amount\n1,2\n").unwrap();
        assert!(validate_file(&path).is_ok());
    }

    #[test]
    fn endpoint_url_validation() {
        assert!(validate_endpoint_url("http://localhost:8000/predict").is_ok());
        assert!(validate_endpoint_url("not a url").is_err());
        assert!(validate_endpoint_url("ftp://host/predict").is_err());
    }

    #[test]
    fn read_rows_drops_label_column_and_parses_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.csv");
        std::fs::write(&path, "Time,Amount,Class\n100.0,50.0,1\n").unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].contains_key("Class"));
        assert_eq!(rows[0]["Time"], serde_json::json!(100.0));
    }

    #[test]
    fn read_rows_keeps_non_numeric_cells_as_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.csv");
        std::fs::write(&path, "Time,Amount\nabc,50.0\n").unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows[0]["Time"], serde_json::json!("abc"));
    }
}
