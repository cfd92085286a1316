//! Delivery channels: the external services a lead is forwarded to.
//!
//! Every destination implements [`Channel`]. [`attempt`] wraps a single
//! delivery with the configured-check and the per-channel timeout and
//! folds the result into a [`ChannelOutcome`], so a slow or failing
//! service never surfaces as an error to its siblings.

pub mod google_auth;
pub mod sheets;
pub mod telegram;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::StatusCode;

use crate::error::DeliveryError;
use crate::server::HttpClient;
use crate::submission::format::FormattedLead;

pub const TELEGRAM: &str = "Telegram";
pub const GOOGLE_SHEETS: &str = "Google Sheets";

// async_trait is required here because channels are held as Arc<dyn Channel>
// and native async fn in traits does not support dyn dispatch.
#[async_trait]
pub trait Channel: Send + Sync {
    fn service(&self) -> &'static str;

    /// Whether every value the channel needs is present.
    fn is_configured(&self) -> bool;

    async fn deliver(&self, lead: &FormattedLead) -> Result<(), DeliveryError>;

    /// Localized, actionable message for a failed delivery.
    fn user_message(&self, error: &DeliveryError) -> String {
        match error {
            DeliveryError::Timeout(_) => format!(
                "Сервер {} не отвечает, попробуйте позже.",
                self.service()
            ),
            other => format!("Ошибка отправки в {}: {}", self.service(), other.detail()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    Success { service: &'static str },
    Failed { service: &'static str, message: String },
    Skipped { service: &'static str },
}

impl ChannelOutcome {
    #[must_use]
    pub const fn service(&self) -> &'static str {
        match self {
            Self::Success { service } | Self::Failed { service, .. } | Self::Skipped { service } => {
                service
            }
        }
    }
}

/// Deliver `lead` through one channel, bounded by `timeout`.
#[allow(clippy::cast_possible_truncation)]
pub async fn attempt(
    channel: &dyn Channel,
    lead: &FormattedLead,
    timeout: Duration,
    correlation_id: &str,
) -> ChannelOutcome {
    let service = channel.service();

    if !channel.is_configured() {
        tracing::info!(
            correlation_id = %correlation_id,
            service,
            "channel not configured, skipping"
        );
        return ChannelOutcome::Skipped { service };
    }

    let start = Instant::now();
    let result = match tokio::time::timeout(timeout, channel.deliver(lead)).await {
        Ok(result) => result,
        Err(_) => Err(DeliveryError::Timeout(timeout)),
    };
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => {
            tracing::info!(
                correlation_id = %correlation_id,
                service,
                latency_ms,
                "lead delivered"
            );
            ChannelOutcome::Success { service }
        }
        Err(e) => {
            tracing::warn!(
                correlation_id = %correlation_id,
                service,
                error = %e,
                latency_ms,
                "delivery failed"
            );
            ChannelOutcome::Failed {
                service,
                message: channel.user_message(&e),
            }
        }
    }
}

/// A POST body with its content type and optional bearer token.
pub(crate) struct Post<'a> {
    pub uri: &'a str,
    pub content_type: &'static str,
    pub bearer: Option<&'a str>,
    pub body: Bytes,
}

/// Send a POST through the shared client and collect the whole response.
pub(crate) async fn post(
    client: &HttpClient,
    req: Post<'_>,
) -> Result<(StatusCode, Bytes), DeliveryError> {
    let mut builder = hyper::Request::builder()
        .method(hyper::Method::POST)
        .uri(req.uri)
        .header(hyper::header::CONTENT_TYPE, req.content_type)
        .header(hyper::header::ACCEPT, "application/json");

    if let Some(token) = req.bearer {
        builder = builder.header(hyper::header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = builder
        .body(Full::new(req.body))
        .map_err(|e| DeliveryError::Transport(e.to_string()))?;

    let response = client
        .request(request)
        .await
        .map_err(|e| DeliveryError::Transport(e.to_string()))?;

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| DeliveryError::Transport(format!("body read error: {e}")))?
        .to_bytes();

    Ok((status, body))
}
