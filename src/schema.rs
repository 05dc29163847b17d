//! Input schema for one inference request.
//!
//! An [`InputRecord`] carries exactly the 30 numeric fields the classifier
//! was trained on: the elapsed-time field, the 28 anonymized PCA components,
//! and the transaction amount. Validation is all-or-nothing and reports
//! every offending field, not just the first.

use crate::errors::ServeError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Feature order the classifier was trained on. The model is positional:
/// any record sent for scoring must be laid out in exactly this order.
pub const FEATURE_ORDER: [&str; 30] = [
    "Time", "V1", "V2", "V3", "V4", "V5", "V6", "V7", "V8", "V9", "V10", "V11", "V12", "V13",
    "V14", "V15", "V16", "V17", "V18", "V19", "V20", "V21", "V22", "V23", "V24", "V25", "V26",
    "V27", "V28", "Amount",
];

/// One validated inference request. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct InputRecord {
    pub time: f64,
    pub v1: f64,
    pub v2: f64,
    pub v3: f64,
    pub v4: f64,
    pub v5: f64,
    pub v6: f64,
    pub v7: f64,
    pub v8: f64,
    pub v9: f64,
    pub v10: f64,
    pub v11: f64,
    pub v12: f64,
    pub v13: f64,
    pub v14: f64,
    pub v15: f64,
    pub v16: f64,
    pub v17: f64,
    pub v18: f64,
    pub v19: f64,
    pub v20: f64,
    pub v21: f64,
    pub v22: f64,
    pub v23: f64,
    pub v24: f64,
    pub v25: f64,
    pub v26: f64,
    pub v27: f64,
    pub v28: f64,
    pub amount: f64,
}

impl InputRecord {
    /// Field values in [`FEATURE_ORDER`].
    pub fn to_feature_vector(&self) -> [f64; 30] {
        [
            self.time, self.v1, self.v2, self.v3, self.v4, self.v5, self.v6, self.v7, self.v8,
            self.v9, self.v10, self.v11, self.v12, self.v13, self.v14, self.v15, self.v16,
            self.v17, self.v18, self.v19, self.v20, self.v21, self.v22, self.v23, self.v24,
            self.v25, self.v26, self.v27, self.v28, self.amount,
        ]
    }
}

/// Why a single field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Missing,
    NotNumeric,
    Unexpected,
}

/// One offending field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub kind: ViolationKind,
}

/// The full set of violations for one rejected record.
#[derive(Debug, Clone)]
pub struct SchemaViolations(pub Vec<FieldViolation>);

impl fmt::Display for SchemaViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|v| {
                let reason = match v.kind {
                    ViolationKind::Missing => "missing field",
                    ViolationKind::NotNumeric => "expected a number",
                    ViolationKind::Unexpected => "unexpected field",
                };
                format!("{}: {}", v.field, reason)
            })
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl From<SchemaViolations> for ServeError {
    fn from(violations: SchemaViolations) -> Self {
        ServeError::validation(violations.to_string())
    }
}

/// Validate an arbitrary JSON object against the declared schema.
///
/// Every declared field must be present and numeric; fields outside the
/// declared set are rejected. On failure the result enumerates all
/// violations so a caller can report them in one pass.
pub fn validate(map: &Map<String, Value>) -> Result<InputRecord, SchemaViolations> {
    let mut violations = Vec::new();

    for field in FEATURE_ORDER {
        match map.get(field) {
            None => violations.push(FieldViolation {
                field: field.to_string(),
                kind: ViolationKind::Missing,
            }),
            Some(Value::Number(_)) => {}
            Some(_) => violations.push(FieldViolation {
                field: field.to_string(),
                kind: ViolationKind::NotNumeric,
            }),
        }
    }

    for key in map.keys() {
        if !FEATURE_ORDER.contains(&key.as_str()) {
            violations.push(FieldViolation {
                field: key.clone(),
                kind: ViolationKind::Unexpected,
            });
        }
    }

    if !violations.is_empty() {
        return Err(SchemaViolations(violations));
    }

    // All fields verified present and numeric, so deserialization cannot fail
    // on shape; map any residual error (e.g. a NaN literal) to a violation on
    // the record as a whole.
    serde_json::from_value(Value::Object(map.clone())).map_err(|e| {
        SchemaViolations(vec![FieldViolation {
            field: format!("record ({e})"),
            kind: ViolationKind::NotNumeric,
        }])
    })
}

/// Wire shape of a served prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: i64,
    pub probability: f64,
    pub prediction_timestamp: String,
}
