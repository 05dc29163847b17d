//! Structured error handling for the fraudwatch services.
//!
//! One enum covers the whole taxonomy: client input faults, server-side
//! prediction faults, startup faults, and the transient network failures
//! the simulator retries.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Main error type for the fraudwatch crate.
#[derive(Error, Debug)]
pub enum ServeError {
    /// Malformed, missing, or mistyped input fields. Surfaced to the
    /// caller as 422 and never retried.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// The classifier is not available to the handler. Server fault,
    /// distinct from any client-input error.
    #[error("Model is not loaded")]
    ModelUnavailable,

    /// The model artifact could not be loaded at startup. Fatal; the
    /// process must not serve traffic in this state.
    #[error("Failed to load model from {path}: {message}")]
    ModelLoad { path: String, message: String },

    /// The loaded model could not score a record.
    #[error("Prediction failed: {message}")]
    Prediction { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Network operation failed: {operation}")]
    Network {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("CSV operation failed: {operation}")]
    Csv {
        operation: String,
        #[source]
        source: csv::Error,
    },
}

/// Shorthand for Result with ServeError.
pub type ServeResult<T> = Result<T, ServeError>;

impl ServeError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn model_load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn prediction(message: impl Into<String>) -> Self {
        Self::Prediction {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn network(operation: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            operation: operation.into(),
            source,
        }
    }

    pub fn csv(operation: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            operation: operation.into(),
            source,
        }
    }
}

#[derive(Serialize)]
struct ErrBody {
    error: String,
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = match self {
            ServeError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ServeError::Network { .. } => StatusCode::BAD_GATEWAY,
            // Everything else is a server-side failure
            ServeError::ModelUnavailable
            | ServeError::ModelLoad { .. }
            | ServeError::Prediction { .. }
            | ServeError::Config { .. }
            | ServeError::Io { .. }
            | ServeError::Csv { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<std::io::Error> for ServeError {
    fn from(err: std::io::Error) -> Self {
        ServeError::io("io_operation", err)
    }
}

impl From<reqwest::Error> for ServeError {
    fn from(err: reqwest::Error) -> Self {
        ServeError::network("http_request", err)
    }
}

impl From<csv::Error> for ServeError {
    fn from(err: csv::Error) -> Self {
        ServeError::csv("csv_operation", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ServeError::validation("V10: missing field");
        assert!(err.to_string().contains("Validation failed"));

        let err = ServeError::model_load("models/clf.json", "no such file");
        assert!(err.to_string().contains("models/clf.json"));
    }

    #[test]
    fn test_error_chaining() {
        use std::error::Error;

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ServeError::io("reading model artifact", io_err);

        assert!(err.source().is_some());
        assert!(err.to_string().contains("I/O operation failed"));
    }
}
