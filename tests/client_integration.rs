//! Typed client against a real listener.

use chrono::Utc;
use tokio::net::TcpListener;

use notebook_api::config::Config;
use notebook_api::contract::{API_TITLE, HEALTH_PATH};
use notebook_api::{create_router, ApiClient, ClientError};

/// Serves the router on an ephemeral port and returns its base URL.
async fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(&Config::default());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_client_health() {
    let client = ApiClient::new(spawn_server().await);

    let before = Utc::now();
    let health = tokio_test::assert_ok!(client.health().await);

    assert!(health.is_ok());
    let timestamp = health.parsed_timestamp().unwrap();
    assert!((timestamp - before).num_seconds().abs() <= 5);
}

#[tokio::test]
async fn test_client_openapi() {
    let client = ApiClient::new(spawn_server().await);

    let doc = tokio_test::assert_ok!(client.openapi().await);

    assert_eq!(doc["info"]["title"], API_TITLE);
    assert!(doc["paths"][HEALTH_PATH].is_object());
}

#[tokio::test]
async fn test_client_reports_unexpected_status() {
    // Point the client one path segment too deep so /health becomes a 404
    let base = format!("{}/missing", spawn_server().await);
    let client = ApiClient::new(base);

    let err = tokio_test::assert_err!(client.health().await);

    match err {
        ClientError::Status { status, path } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(path, HEALTH_PATH);
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_client_connection_error() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(format!("http://{}", addr));

    let err = tokio_test::assert_err!(client.health().await);
    assert!(matches!(err, ClientError::Http(_)));
}
