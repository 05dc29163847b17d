//! HTTP serving surface: health check plus the predict operation.
//!
//! The classifier is loaded before the router exists and handed to every
//! handler through shared state; there is no ambient registry and no way to
//! reach `predict` without a loaded model. Dropping the state releases the
//! model at shutdown.

use crate::engine;
use crate::errors::{ServeError, ServeResult};
use crate::model::LoadedModel;
use crate::prediction_log::log_prediction;
use crate::schema::{self, PredictionResponse};
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{SecondsFormat, Utc};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared, read-only request-handling state.
pub struct AppState {
    pub model: LoadedModel,
    pub log_path: PathBuf,
}

/// Build the serving router around an already-loaded model.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[axum::debug_handler]
async fn predict(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<serde_json::Value>,
) -> ServeResult<Json<PredictionResponse>> {
    let map = payload
        .as_object()
        .ok_or_else(|| ServeError::validation("request body must be a JSON object"))?;

    let record = schema::validate(map)?;

    let prediction = engine::get_prediction(&state.model, &record)?;
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

    let response = PredictionResponse {
        prediction: prediction.prediction,
        probability: prediction.probability,
        prediction_timestamp: timestamp,
    };

    log_prediction(&record, &response, &state.log_path)?;

    tracing::info!(
        model = state.model.model_id(),
        label = response.prediction,
        probability = response.probability,
        "served prediction"
    );

    Ok(Json(response))
}
