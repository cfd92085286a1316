//! Lead submission endpoint.
//!
//! [`submit_handler`] is the Axum handler behind `/api/sendMessage`. It
//! validates the form, renders it once ([`format`]), fans the rendered
//! lead out to every channel concurrently ([`dispatch`]), and turns the
//! collected outcomes into a single response ([`Aggregate`]).

pub mod format;
pub mod model;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::channels::{self, Channel, ChannelOutcome};
use crate::server::AppState;
use format::FormattedLead;
use model::SubmissionPayload;

pub const MSG_METHOD_NOT_ALLOWED: &str = "Method Not Allowed";
pub const MSG_REQUIRED_FIELDS: &str = "Имя и телефон обязательны.";
pub const MSG_NOT_CONFIGURED: &str =
    "Не удалось отправить заявку. Причина: неверная конфигурация сервера.";
pub const MSG_INTERNAL: &str = "Произошла внутренняя ошибка сервера.";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessBody {
    pub success: bool,
    pub services: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FailureBody {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ServiceError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceError {
    pub service: String,
    pub message: String,
}

/// Outcomes of one request, grouped by kind, each in channel order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub succeeded: Vec<&'static str>,
    pub failed: Vec<ServiceError>,
    pub skipped: Vec<&'static str>,
}

impl Aggregate {
    #[must_use]
    pub fn from_outcomes(outcomes: Vec<ChannelOutcome>) -> Self {
        let mut agg = Self::default();
        for outcome in outcomes {
            match outcome {
                ChannelOutcome::Success { service } => agg.succeeded.push(service),
                ChannelOutcome::Failed { service, message } => agg.failed.push(ServiceError {
                    service: service.to_string(),
                    message,
                }),
                ChannelOutcome::Skipped { service } => agg.skipped.push(service),
            }
        }
        agg
    }
}

impl IntoResponse for Aggregate {
    /// Any success wins; otherwise every failure message is reported,
    /// or the configuration error when nothing was even attempted.
    fn into_response(self) -> Response {
        if !self.succeeded.is_empty() {
            let body = SuccessBody {
                success: true,
                services: self.succeeded.iter().map(ToString::to_string).collect(),
            };
            return (StatusCode::OK, Json(body)).into_response();
        }

        if self.failed.is_empty() {
            return not_configured_response();
        }

        let message = self
            .failed
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        let body = FailureBody {
            success: false,
            message,
            errors: self.failed,
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

fn message_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            message: message.to_string(),
        }),
    )
        .into_response()
}

fn not_configured_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(FailureBody {
            success: false,
            message: MSG_NOT_CONFIGURED.to_string(),
            errors: Vec::new(),
        }),
    )
        .into_response()
}

/// Run every channel concurrently and wait for all of them.
///
/// Outcomes are returned in channel order. A panicking channel task is
/// reported as `Failed`; it never cancels its siblings.
pub async fn dispatch(
    channels: &[Arc<dyn Channel>],
    lead: Arc<FormattedLead>,
    timeout: Duration,
    correlation_id: &str,
) -> Vec<ChannelOutcome> {
    let handles: Vec<_> = channels
        .iter()
        .map(|channel| {
            let channel = Arc::clone(channel);
            let lead = Arc::clone(&lead);
            let cid = correlation_id.to_string();
            let service = channel.service();
            let handle = tokio::spawn(async move {
                channels::attempt(channel.as_ref(), &lead, timeout, &cid).await
            });
            (service, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (service, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                tracing::error!(
                    correlation_id = %correlation_id,
                    service,
                    error = %join_err,
                    "channel task panicked"
                );
                ChannelOutcome::Failed {
                    service,
                    message: MSG_INTERNAL.to_string(),
                }
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

pub async fn submit_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    req_headers: HeaderMap,
    body: Bytes,
) -> Response {
    let correlation_id = req_headers
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

    let mut response = handle_submission(&state, &method, &body, &correlation_id).await;
    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert("x-correlation-id", value);
    }
    response
}

async fn handle_submission(
    state: &AppState,
    method: &Method,
    body: &Bytes,
    correlation_id: &str,
) -> Response {
    if *method != Method::POST {
        return message_response(StatusCode::METHOD_NOT_ALLOWED, MSG_METHOD_NOT_ALLOWED);
    }

    let submission = match serde_json::from_slice::<SubmissionPayload>(body)
        .map_err(|e| e.to_string())
        .and_then(|payload| payload.validate().map_err(|f| format!("missing {f}")))
    {
        Ok(submission) => submission,
        Err(reason) => {
            tracing::info!(
                correlation_id = %correlation_id,
                reason = %reason,
                "submission rejected"
            );
            state.stats.rejected.fetch_add(1, Ordering::Relaxed);
            return message_response(StatusCode::BAD_REQUEST, MSG_REQUIRED_FIELDS);
        }
    };

    if !state.any_configured() {
        tracing::error!(
            correlation_id = %correlation_id,
            "no delivery channel configured, set Telegram and/or Google Sheets credentials"
        );
        state.stats.failed.fetch_add(1, Ordering::Relaxed);
        return not_configured_response();
    }

    tracing::info!(
        correlation_id = %correlation_id,
        extended = submission.show_extended(),
        channels = state.channels.len(),
        "submission received"
    );

    let lead = Arc::new(format::format_lead(&submission, chrono::Utc::now()));
    let outcomes = dispatch(
        &state.channels,
        lead,
        state.channel_timeout,
        correlation_id,
    )
    .await;

    let aggregate = Aggregate::from_outcomes(outcomes);
    if !aggregate.succeeded.is_empty() && !aggregate.failed.is_empty() {
        tracing::warn!(
            correlation_id = %correlation_id,
            delivered = ?aggregate.succeeded,
            failed = aggregate.failed.len(),
            "partial delivery"
        );
    }

    let response = aggregate.into_response();
    if response.status().is_success() {
        state.stats.delivered.fetch_add(1, Ordering::Relaxed);
    } else {
        state.stats.failed.fetch_add(1, Ordering::Relaxed);
    }
    response
}
