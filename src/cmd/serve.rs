//! `lead-relay serve`: start the submission endpoint.
//!
//! Builds the channel settings, wires the senders onto a shared HTTP
//! client, and runs the Axum server until SIGTERM / Ctrl+C.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::cli::ServeArgs;
use crate::config::model::Settings;
use crate::error::LeadRelayError;
use crate::logging;
use crate::server::{self, AppState};

pub async fn execute(args: ServeArgs) -> Result<(), LeadRelayError> {
    let log_format = logging::resolve_format(args.pretty, args.json);

    #[cfg(feature = "sentry-integration")]
    let _sentry_guard = args
        .sentry_dsn
        .as_ref()
        .and_then(|dsn| crate::sentry_integration::init(dsn, args.sentry_environment.as_deref()));

    logging::init(&args.log_level, log_format);

    let settings = Settings::from_args(&args.channels);
    for status in settings.channel_statuses() {
        if status.configured {
            tracing::info!(service = %status.service, "channel configured");
        } else {
            tracing::warn!(
                service = %status.service,
                missing = ?status.missing,
                "channel not configured, submissions will skip it"
            );
        }
    }
    if !settings.any_configured() {
        tracing::error!("no delivery channel configured, every submission will fail");
    }

    let http_client = server::build_http_client();
    let channels = server::build_channels(&settings, &http_client);
    let state = Arc::new(AppState::new(channels, settings.channel_timeout));

    let router = server::build_router(state, args.max_body);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        path = server::SUBMIT_PATH,
        timeout_ms = u64::try_from(settings.channel_timeout.as_millis()).unwrap_or(u64::MAX),
        "lead-relay started"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("lead-relay stopped");
    Ok(())
}
