//! Prediction engine: bridges a validated record and the loaded classifier.

use crate::errors::{ServeError, ServeResult};
use crate::model::LoadedModel;
use crate::schema::InputRecord;
use serde::Serialize;

/// Engine output before the serving layer attaches a timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub prediction: i64,
    pub probability: f64,
}

/// Score one record. The record's fields are mapped into the trained
/// feature order before the model sees them; probability is the maximum
/// class probability.
pub fn get_prediction(model: &LoadedModel, record: &InputRecord) -> ServeResult<Prediction> {
    let features = record.to_feature_vector();

    // One scoring pass: the winning class supplies both the label and the
    // confidence.
    let probabilities = model.predict_proba(&features)?;
    let (best, confidence) = probabilities
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .ok_or_else(|| ServeError::prediction("empty probability vector"))?;

    Ok(Prediction {
        prediction: model.classes()[best],
        probability: *confidence,
    })
}
