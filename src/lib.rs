//! Library root for the `fraudwatch` crate: a small model-serving scaffold
//! with a traffic simulator and periodic drift reporting.

// Core error handling
pub mod errors;

// Configuration
pub mod config;

// Input schema & validation
pub mod schema;

// Classifier artifact & scoring
pub mod engine;
pub mod model;

// Prediction log
pub mod prediction_log;

// Web server interface
pub mod server;

// Traffic replay
pub mod simulator;

// Drift reporting
pub mod drift;
pub mod report;
