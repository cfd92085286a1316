//! Integration tests for the HTTP server, health endpoint, and graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use lead_relay::config::model::{
    SheetsSettings, Settings, TelegramSettings, DEFAULT_SHEETS_API_BASE, DEFAULT_SHEET_RANGE,
    DEFAULT_TELEGRAM_API_BASE, DEFAULT_TOKEN_URI,
};
use lead_relay::health::HealthResponse;
use lead_relay::server::{self, AppState};

fn test_settings(telegram: bool) -> Settings {
    Settings {
        telegram: TelegramSettings {
            bot_token: telegram.then(|| "123:ABC".to_string()),
            chat_id: telegram.then(|| "-1001".to_string()),
            api_base: DEFAULT_TELEGRAM_API_BASE.into(),
        },
        sheets: SheetsSettings {
            service_account_email: None,
            private_key: None,
            sheet_id: None,
            range: DEFAULT_SHEET_RANGE.into(),
            api_base: DEFAULT_SHEETS_API_BASE.into(),
            token_uri: DEFAULT_TOKEN_URI.into(),
        },
        channel_timeout: Duration::from_secs(10),
    }
}

async fn start_test_server(telegram: bool) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let settings = test_settings(telegram);
    let client = server::build_http_client();
    let state = Arc::new(AppState::new(
        server::build_channels(&settings, &client),
        settings.channel_timeout,
    ));

    let router = server::build_router(state, 65_536);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    (addr, shutdown_tx)
}

#[tokio::test]
async fn health_endpoint_reports_channels() {
    let (addr, shutdown) = start_test_server(true).await;

    let url = format!("http://{addr}/health");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 200);

    let health: HealthResponse = resp.json().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.channels.len(), 2);
    assert_eq!(health.channels[0].service, "Telegram");
    assert!(health.channels[0].configured);
    assert_eq!(health.channels[1].service, "Google Sheets");
    assert!(!health.channels[1].configured);
    assert_eq!(health.stats.submissions_delivered, 0);
    assert_eq!(health.stats.submissions_failed, 0);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn health_is_degraded_without_channels() {
    let (addr, shutdown) = start_test_server(false).await;

    let url = format!("http://{addr}/health");
    let health: HealthResponse = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert_eq!(health.status, "degraded");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn health_version_matches_crate() {
    let (addr, shutdown) = start_test_server(true).await;

    let url = format!("http://{addr}/health");
    let health: HealthResponse = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));

    let _ = shutdown.send(());
}

#[tokio::test]
async fn unknown_path_returns_404() {
    let (addr, shutdown) = start_test_server(true).await;

    let url = format!("http://{addr}/nonexistent");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 404);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let (addr, shutdown) = start_test_server(true).await;

    let url = format!("http://{addr}/api/sendMessage");
    let resp = reqwest::Client::new()
        .post(&url)
        .header("content-type", "application/json")
        .body(vec![b' '; 70_000])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn graceful_shutdown_works() {
    let (addr, shutdown) = start_test_server(true).await;

    // Verify server is running
    let url = format!("http://{addr}/health");
    assert!(reqwest::get(&url).await.is_ok());

    // Send shutdown
    let _ = shutdown.send(());

    // Give it a moment to shut down
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    // Server should no longer accept connections
    let result = reqwest::get(&url).await;
    assert!(result.is_err());
}
