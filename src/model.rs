//! Classifier artifact loading and scoring.
//!
//! The serving binary loads one JSON artifact at startup and never reloads
//! it; swapping the model means restarting the process. The artifact carries
//! the trained feature order alongside the weights, and load verifies that
//! order against [`crate::schema::FEATURE_ORDER`] up front. Scoring is
//! positional, so an ordering mismatch would not fail loudly later; it would
//! silently corrupt every prediction.

use crate::errors::{ServeError, ServeResult};
use crate::schema::FEATURE_ORDER;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// On-disk shape of a trained classifier: one-vs-rest logistic weights
/// plus the metadata the trainer records when exporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub model_id: String,
    /// Feature order used at training time.
    pub feature_names: Vec<String>,
    /// Class ids, aligned with the rows of `coefficients`.
    pub classes: Vec<i64>,
    /// One weight row per class.
    pub coefficients: Vec<Vec<f64>>,
    /// One intercept per class.
    pub intercepts: Vec<f64>,
    pub trained_at: Option<DateTime<Utc>>,
}

/// A classifier loaded and shape-checked, ready for concurrent read-only use.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    artifact: ClassifierArtifact,
}

impl LoadedModel {
    /// Load and verify a classifier artifact. Any failure here is fatal for
    /// the serving process.
    pub fn load(path: impl AsRef<Path>) -> ServeResult<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let contents = fs::read_to_string(path)
            .map_err(|e| ServeError::model_load(&display, e.to_string()))?;
        let artifact: ClassifierArtifact = serde_json::from_str(&contents)
            .map_err(|e| ServeError::model_load(&display, format!("invalid artifact: {e}")))?;

        Self::from_artifact(artifact).map_err(|e| match e {
            ServeError::Prediction { message } => ServeError::model_load(&display, message),
            other => other,
        })
    }

    /// Build a model from an in-memory artifact, verifying its shape.
    pub fn from_artifact(artifact: ClassifierArtifact) -> ServeResult<Self> {
        if artifact.classes.is_empty() || artifact.coefficients.is_empty() {
            return Err(ServeError::prediction(
                "artifact has no classes or coefficients; model cannot classify",
            ));
        }
        if artifact.classes.len() != artifact.coefficients.len()
            || artifact.classes.len() != artifact.intercepts.len()
        {
            return Err(ServeError::prediction(format!(
                "inconsistent artifact: {} classes, {} coefficient rows, {} intercepts",
                artifact.classes.len(),
                artifact.coefficients.len(),
                artifact.intercepts.len()
            )));
        }
        for (i, row) in artifact.coefficients.iter().enumerate() {
            if row.len() != artifact.feature_names.len() {
                return Err(ServeError::prediction(format!(
                    "coefficient row {} has {} weights for {} features",
                    i,
                    row.len(),
                    artifact.feature_names.len()
                )));
            }
        }
        // The scoring path is positional. Refuse any artifact whose trained
        // order differs from the declared input order.
        if artifact.feature_names != FEATURE_ORDER {
            return Err(ServeError::prediction(
                "artifact feature order does not match the declared input schema",
            ));
        }

        Ok(Self { artifact })
    }

    pub fn model_id(&self) -> &str {
        &self.artifact.model_id
    }

    pub fn classes(&self) -> &[i64] {
        &self.artifact.classes
    }

    /// Per-class probabilities for one feature vector, softmax-normalized.
    pub fn predict_proba(&self, features: &[f64]) -> ServeResult<Vec<f64>> {
        if features.len() != self.artifact.feature_names.len() {
            return Err(ServeError::prediction(format!(
                "expected {} features, got {}",
                self.artifact.feature_names.len(),
                features.len()
            )));
        }

        let scores: Vec<f64> = self
            .artifact
            .coefficients
            .iter()
            .zip(&self.artifact.intercepts)
            .map(|(row, intercept)| {
                intercept + row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>()
            })
            .collect();

        if scores.iter().any(|s| !s.is_finite()) {
            return Err(ServeError::prediction(
                "non-finite score; input or weights out of range",
            ));
        }

        // Softmax with max-subtraction to keep the exponentials bounded.
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        Ok(exps.into_iter().map(|e| e / total).collect())
    }

    /// Class id with the highest probability.
    pub fn predict_label(&self, features: &[f64]) -> ServeResult<i64> {
        let probabilities = self.predict_proba(features)?;
        let best = probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .ok_or_else(|| ServeError::prediction("empty probability vector"))?;
        Ok(self.artifact.classes[best])
    }
}
