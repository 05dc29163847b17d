//! Dataset comparison reports.
//!
//! Compares a reference CSV against a current CSV column by column and
//! writes a static HTML artifact for manual inspection. Drift per column is
//! measured with the population stability index over ten reference-quantile
//! bins; 0.2 is the conventional alarm level.

use crate::errors::{ServeError, ServeResult};
use chrono::Utc;
use std::path::Path;

/// PSI at or above this flags a column as drifted.
const PSI_THRESHOLD: f64 = 0.2;
/// Quantile bins taken from the reference distribution.
const BIN_COUNT: usize = 10;
/// Floor for bin proportions so the PSI log term stays finite.
const PROPORTION_FLOOR: f64 = 1e-4;

/// Drift summary for one shared column.
#[derive(Debug, Clone)]
pub struct ColumnDrift {
    pub column: String,
    pub reference_mean: f64,
    pub current_mean: f64,
    pub reference_std: f64,
    pub current_std: f64,
    pub psi: f64,
    pub drifted: bool,
}

/// Generate the feature-drift report between two feature datasets.
pub fn generate_feature_drift_report(
    reference_path: impl AsRef<Path>,
    current_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> ServeResult<()> {
    generate_report(reference_path, current_path, output_path, "Feature Drift Report")
}

/// Generate the target-drift report between two prediction datasets.
pub fn generate_target_drift_report(
    reference_path: impl AsRef<Path>,
    current_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> ServeResult<()> {
    generate_report(
        reference_path,
        current_path,
        output_path,
        "Prediction Drift Report",
    )
}

fn generate_report(
    reference_path: impl AsRef<Path>,
    current_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    title: &str,
) -> ServeResult<()> {
    let reference = load_numeric_columns(reference_path.as_ref())?;
    let current = load_numeric_columns(current_path.as_ref())?;

    let rows = compare(&reference, &current);
    let html = render_html(title, &rows);

    let output_path = output_path.as_ref();
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ServeError::io("creating report directory", e))?;
        }
    }
    std::fs::write(output_path, html).map_err(|e| ServeError::io("writing report", e))?;

    tracing::info!(report = %output_path.display(), columns = rows.len(), "report generated");
    Ok(())
}

/// Compare every column present in both datasets, in reference order.
pub fn compare(
    reference: &[(String, Vec<f64>)],
    current: &[(String, Vec<f64>)],
) -> Vec<ColumnDrift> {
    reference
        .iter()
        .filter_map(|(name, ref_values)| {
            let cur_values = current
                .iter()
                .find(|(cur_name, _)| cur_name == name)
                .map(|(_, values)| values)?;
            if ref_values.is_empty() || cur_values.is_empty() {
                return None;
            }

            let psi = population_stability_index(ref_values, cur_values);
            Some(ColumnDrift {
                column: name.clone(),
                reference_mean: mean(ref_values),
                current_mean: mean(cur_values),
                reference_std: std_dev(ref_values),
                current_std: std_dev(cur_values),
                psi,
                drifted: psi >= PSI_THRESHOLD,
            })
        })
        .collect()
}

/// PSI over quantile bins of the reference distribution.
fn population_stability_index(reference: &[f64], current: &[f64]) -> f64 {
    let mut sorted = reference.to_vec();
    sorted.sort_by(f64::total_cmp);

    // Interior bin edges at the reference deciles, deduplicated so constant
    // or near-constant columns do not produce empty bins.
    let mut edges: Vec<f64> = (1..BIN_COUNT)
        .map(|i| sorted[(i * sorted.len() / BIN_COUNT).min(sorted.len() - 1)])
        .collect();
    edges.dedup_by(|a, b| a == b);

    let bin_of = |value: f64| edges.iter().filter(|edge| value > **edge).count();
    let bins = edges.len() + 1;

    let proportions = |values: &[f64]| {
        let mut counts = vec![0usize; bins];
        for &value in values {
            counts[bin_of(value)] += 1;
        }
        counts
            .into_iter()
            .map(|c| (c as f64 / values.len() as f64).max(PROPORTION_FLOOR))
            .collect::<Vec<f64>>()
    };

    let ref_props = proportions(reference);
    let cur_props = proportions(current);

    ref_props
        .iter()
        .zip(&cur_props)
        .map(|(r, c)| (c - r) * (c / r).ln())
        .sum()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Load each column that contains at least one numeric cell, keeping header
/// order. Non-numeric cells within a numeric column are ignored.
pub fn load_numeric_columns(path: &Path) -> ServeResult<Vec<(String, Vec<f64>)>> {
    let mut reader =
        csv::Reader::from_path(path).map_err(|e| ServeError::csv("opening dataset", e))?;
    let headers = reader
        .headers()
        .map_err(|e| ServeError::csv("reading headers", e))?
        .clone();

    let mut columns: Vec<(String, Vec<f64>)> = headers
        .iter()
        .map(|h| (h.to_string(), Vec::new()))
        .collect();

    for result in reader.records() {
        let record = result.map_err(|e| ServeError::csv("reading row", e))?;
        for (index, cell) in record.iter().enumerate() {
            if let Ok(value) = cell.parse::<f64>() {
                columns[index].1.push(value);
            }
        }
    }

    columns.retain(|(_, values)| !values.is_empty());
    Ok(columns)
}

fn render_html(title: &str, rows: &[ColumnDrift]) -> String {
    let drifted = rows.iter().filter(|r| r.drifted).count();
    let generated = Utc::now().to_rfc3339();

    let mut body = String::new();
    for row in rows {
        let status = if row.drifted { "DRIFT" } else { "ok" };
        body.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{:.4}</td><td>{:.4}</td><td>{:.4}</td><td>{:.4}</td><td>{:.4}</td><td>{}</td></tr>\n",
            if row.drifted { "drifted" } else { "stable" },
            row.column,
            row.reference_mean,
            row.current_mean,
            row.reference_std,
            row.current_std,
            row.psi,
            status,
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title>\n\
         <style>body{{font-family:sans-serif}}table{{border-collapse:collapse}}\
         td,th{{border:1px solid #999;padding:4px 8px}}tr.drifted{{background:#fdd}}</style>\
         </head>\n<body>\n<h1>{title}</h1>\n\
         <p>Generated {generated}. {drifted} of {} columns drifted (PSI &ge; {PSI_THRESHOLD}).</p>\n\
         <table>\n<tr><th>column</th><th>ref mean</th><th>cur mean</th>\
         <th>ref std</th><th>cur std</th><th>PSI</th><th>status</th></tr>\n{body}</table>\n\
         </body></html>\n",
        rows.len(),
    )
}
