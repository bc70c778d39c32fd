use super::*;

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_cors_enabled() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let mut app = TestApp::new().await;
    let mut config = (*app.state.config).clone();
    config.api.cors_enabled = false;
    app.state.config = Arc::new(config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be absent when CORS is disabled"
    );
}

#[test]
fn test_cors_layer_with_specific_origins() {
    // Builds without panicking for valid and unparsable origins alike
    let _ = build_cors_layer(&["http://localhost:3000".to_string(), "\n".to_string()]);
    let _ = build_cors_layer(&[]);
}

#[tokio::test]
async fn test_api_server_spawns() {
    let mut app = TestApp::new().await;

    let mut config = (*app.state.config).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    app.state.config = Arc::new(config);

    let api_handle = tokio::spawn(start_api_server(app.state.clone()));

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished(), "server should still be running");

    api_handle.abort();
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app.get("/search/text-query").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_serve_stops_on_shutdown_signal() {
    let mut app = TestApp::new().await;

    let mut config = (*app.state.config).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    app.state.config = Arc::new(config);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(serve(app.state.clone(), async move {
        stop_rx.await.ok();
    }));

    tokio::time::sleep(Duration::from_millis(50)).await;
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}
