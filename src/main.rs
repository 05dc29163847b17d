// fraudwatch - serving binary
// Loads the classifier once, then serves /health and /predict until killed.

use clap::Parser;
use fraudwatch::config::load_config;
use fraudwatch::model::LoadedModel;
use fraudwatch::server::{build_router, AppState};
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "fraudwatch", version, about = "Fraud classifier serving API")]
struct Args {
    /// Host/IP to bind (overrides config)
    #[arg(long)]
    host: Option<String>,
    /// Port to bind (overrides config)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut config = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            exit(1);
        }
    };
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    // Load the model exactly once. Startup aborts rather than serving
    // traffic without a classifier.
    let model = match LoadedModel::load(&config.model_path) {
        Ok(model) => {
            tracing::info!(model = model.model_id(), path = %config.model_path, "model loaded");
            model
        }
        Err(e) => {
            eprintln!("Fatal: {e}");
            exit(1);
        }
    };

    let state = Arc::new(AppState {
        model,
        log_path: PathBuf::from(&config.log_path),
    });
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {addr}: {e}");
            exit(1);
        }
    };

    println!("fraudwatch API listening on http://{addr}");
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {e}");
        exit(1);
    }
}
