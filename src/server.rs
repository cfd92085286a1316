//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding the delivery
//! channels, counters, and uptime), [`build_channels`] for wiring the
//! senders from [`Settings`], [`build_router`] for constructing the Axum
//! router with middleware layers, [`build_http_client`] for the
//! connection-pooled hyper client, and [`shutdown_signal`] for
//! SIGTERM / Ctrl+C handling.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::{any, get};
use axum::Router;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::channels::sheets::SheetsChannel;
use crate::channels::telegram::TelegramChannel;
use crate::channels::Channel;
use crate::config::model::Settings;
use crate::health::health_handler;
use crate::submission;

pub const SUBMIT_PATH: &str = "/api/sendMessage";

#[derive(Debug)]
pub struct Stats {
    pub delivered: AtomicU64,
    pub failed: AtomicU64,
    pub rejected: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }
}

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, http_body_util::Full<bytes::Bytes>>;

pub struct AppState {
    /// Delivery channels in declaration order; failure messages are
    /// aggregated in this order.
    pub channels: Vec<Arc<dyn Channel>>,
    pub channel_timeout: Duration,
    pub start_time: Instant,
    pub stats: Stats,
}

impl AppState {
    #[must_use]
    pub fn new(channels: Vec<Arc<dyn Channel>>, channel_timeout: Duration) -> Self {
        Self {
            channels,
            channel_timeout,
            start_time: Instant::now(),
            stats: Stats::new(),
        }
    }

    #[must_use]
    pub fn any_configured(&self) -> bool {
        self.channels.iter().any(|c| c.is_configured())
    }
}

#[must_use]
pub fn build_http_client() -> HttpClient {
    // Sentry's reqwest transport can pull in a second provider; pin ring.
    // Errors only mean a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

/// Telegram first, then Google Sheets.
#[must_use]
pub fn build_channels(settings: &Settings, client: &HttpClient) -> Vec<Arc<dyn Channel>> {
    vec![
        Arc::new(TelegramChannel::new(
            client.clone(),
            settings.telegram.clone(),
        )),
        Arc::new(SheetsChannel::new(client.clone(), settings.sheets.clone())),
    ]
}

pub fn build_router(state: Arc<AppState>, max_body: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(SUBMIT_PATH, any(submission::submit_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body)),
        )
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
