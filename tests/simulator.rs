// End-to-end simulator runs against an in-process serving endpoint.
use fraudwatch::model::{ClassifierArtifact, LoadedModel};
use fraudwatch::schema::FEATURE_ORDER;
use fraudwatch::server::{build_router, AppState};
use fraudwatch::simulator::{simulate_data_stream, ExecutionMode, SimulatorOptions};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn test_model() -> LoadedModel {
    let features = FEATURE_ORDER.len();
    let artifact = ClassifierArtifact {
        model_id: "logreg_sim_test".to_string(),
        feature_names: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
        classes: vec![0, 1],
        coefficients: vec![vec![0.0; features], vec![0.01; features]],
        intercepts: vec![0.5, -0.5],
        trained_at: None,
    };
    LoadedModel::from_artifact(artifact).expect("test artifact should be valid")
}

/// Spawn the serving app on an ephemeral port; returns its predict URL.
async fn spawn_server(dir: &TempDir) -> String {
    let state = Arc::new(AppState {
        model: test_model(),
        log_path: dir.path().join("predictions.csv"),
    });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port should bind");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/predict")
}

/// One CSV row per entry in `rows`; each entry supplies (Time, Amount) with
/// all V-columns fixed at 0.1. `with_class` appends a ground-truth column.
fn write_stream_csv(dir: &TempDir, rows: &[(f64, f64)], with_class: bool) -> String {
    let mut header: Vec<String> = FEATURE_ORDER.iter().map(|s| s.to_string()).collect();
    if with_class {
        header.push("Class".to_string());
    }

    let mut contents = header.join(",") + "\n";
    for (time, amount) in rows {
        let mut cells = vec![time.to_string()];
        cells.extend(std::iter::repeat("0.1".to_string()).take(28));
        cells.push(amount.to_string());
        if with_class {
            cells.push("0".to_string());
        }
        contents += &(cells.join(",") + "\n");
    }

    let path = dir.path().join("stream.csv");
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().to_string()
}

#[tokio::test]
async fn one_row_csv_yields_exactly_one_send() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = spawn_server(&dir).await;
    let input_file = write_stream_csv(&dir, &[(100.0, 25.0)], false);

    let summary = simulate_data_stream(&SimulatorOptions {
        input_file,
        endpoint,
        delay: Duration::ZERO,
        mode: ExecutionMode::Sequential,
    })
    .await
    .expect("simulation should complete");

    assert_eq!(summary.sent, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.skipped, 0);

    // The endpoint logged exactly that one prediction.
    let log = std::fs::read_to_string(dir.path().join("predictions.csv")).unwrap();
    assert_eq!(log.lines().count(), 2); // header + 1 row
}

#[tokio::test]
async fn k_valid_rows_yield_k_sends_sequentially() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = spawn_server(&dir).await;
    let input_file = write_stream_csv(&dir, &[(1.0, 10.0), (2.0, 20.0), (3.0, 30.0)], true);

    let summary = simulate_data_stream(&SimulatorOptions {
        input_file,
        endpoint,
        delay: Duration::ZERO,
        mode: ExecutionMode::Sequential,
    })
    .await
    .unwrap();

    assert_eq!(summary.sent, 3);
    assert_eq!(summary.skipped, 0);
}

#[tokio::test]
async fn parallel_mode_sends_every_row() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = spawn_server(&dir).await;
    let rows: Vec<(f64, f64)> = (0..12).map(|i| (i as f64, 10.0 * i as f64)).collect();
    let input_file = write_stream_csv(&dir, &rows, false);

    let summary = simulate_data_stream(&SimulatorOptions {
        input_file,
        endpoint,
        delay: Duration::ZERO,
        mode: ExecutionMode::Parallel,
    })
    .await
    .unwrap();

    assert_eq!(summary.sent, 12);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn invalid_rows_are_skipped_and_the_stream_continues() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = spawn_server(&dir).await;

    // Second row has a non-numeric Time cell.
    let input_file = write_stream_csv(&dir, &[(1.0, 10.0), (2.0, 20.0)], false);
    let broken = std::fs::read_to_string(&input_file)
        .unwrap()
        .replace("\n2,", "\nnot-a-number,");
    std::fs::write(&input_file, broken).unwrap();

    let summary = simulate_data_stream(&SimulatorOptions {
        input_file,
        endpoint,
        delay: Duration::ZERO,
        mode: ExecutionMode::Sequential,
    })
    .await
    .unwrap();

    assert_eq!(summary.sent, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);
}

/// Healthy endpoint whose predict operation always fails server-side.
async fn spawn_always_failing_server() -> String {
    use axum::{http::StatusCode, routing::{get, post}, Json, Router};

    let app = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({ "status": "ok" })) }))
        .route(
            "/predict",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port should bind");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/predict")
}

#[tokio::test]
async fn exhausted_retries_are_recorded_and_the_run_continues() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = spawn_always_failing_server().await;
    let input_file = write_stream_csv(&dir, &[(1.0, 10.0), (2.0, 20.0)], false);

    // Every send fails all three attempts; both failures are recorded and
    // the run still completes cleanly.
    let summary = simulate_data_stream(&SimulatorOptions {
        input_file,
        endpoint,
        delay: Duration::ZERO,
        mode: ExecutionMode::Sequential,
    })
    .await
    .expect("row failures must not abort the run");

    assert_eq!(summary.sent, 0);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.skipped, 0);
}

#[tokio::test]
async fn failing_health_check_stops_the_run_before_any_send() {
    let dir = tempfile::tempdir().unwrap();
    let input_file = write_stream_csv(&dir, &[(1.0, 10.0)], false);

    // Reserve a port, then release it so nothing is listening there.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = simulate_data_stream(&SimulatorOptions {
        input_file,
        endpoint: format!("http://{addr}/predict"),
        delay: Duration::ZERO,
        mode: ExecutionMode::Sequential,
    })
    .await;

    assert!(result.is_err());
    // Nothing reached the (nonexistent) endpoint, so no log was created.
    assert!(!dir.path().join("predictions.csv").exists());
}

#[tokio::test]
async fn missing_source_file_is_a_hard_stop() {
    let result = simulate_data_stream(&SimulatorOptions {
        input_file: "no/such/stream.csv".to_string(),
        endpoint: "http://127.0.0.1:1/predict".to_string(),
        delay: Duration::ZERO,
        mode: ExecutionMode::Sequential,
    })
    .await;

    assert!(result.is_err());
}
