//! Append-only CSV log of served predictions.
//!
//! Columns are `prediction_timestamp`, the 30 input fields in declared
//! order, `prediction`, `probability`. The header is written only when the
//! file is created. The exists-check and the append are two separate
//! filesystem operations with no lock between them, so concurrent writers
//! can race on header creation or interleave rows; that weakness is
//! accepted, not guarded.

use crate::errors::{ServeError, ServeResult};
use crate::schema::{InputRecord, PredictionResponse, FEATURE_ORDER};
use std::fs::OpenOptions;
use std::path::Path;

/// Append one prediction to `destination`, creating parent directories,
/// the file, and the header row as needed.
pub fn log_prediction(
    record: &InputRecord,
    response: &PredictionResponse,
    destination: impl AsRef<Path>,
) -> ServeResult<()> {
    let destination = destination.as_ref();

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ServeError::io("creating log directory", e))?;
        }
    }

    let file_exists = destination.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(destination)
        .map_err(|e| ServeError::io("opening prediction log", e))?;

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

    if !file_exists {
        let mut header = vec!["prediction_timestamp"];
        header.extend(FEATURE_ORDER);
        header.extend(["prediction", "probability"]);
        writer
            .write_record(&header)
            .map_err(|e| ServeError::csv("writing log header", e))?;
    }

    let mut row = vec![response.prediction_timestamp.clone()];
    row.extend(record.to_feature_vector().iter().map(|v| v.to_string()));
    row.push(response.prediction.to_string());
    row.push(response.probability.to_string());
    writer
        .write_record(&row)
        .map_err(|e| ServeError::csv("writing log row", e))?;

    writer
        .flush()
        .map_err(|e| ServeError::io("flushing prediction log", e))?;

    tracing::debug!(path = %destination.display(), "logged prediction");
    Ok(())
}
