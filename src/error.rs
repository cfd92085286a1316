//! Error types for lead-relay.
//!
//! [`LeadRelayError`] covers process-level failures (startup, CLI
//! subcommands). [`DeliveryError`] is the per-channel failure produced
//! while talking to Telegram or Google Sheets; it never reaches the HTTP
//! layer directly but is folded into a
//! [`ChannelOutcome`](crate::channels::ChannelOutcome) by the sender.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LeadRelayError {
    #[error("No delivery channel is configured.\n\n  {hint}")]
    NoChannelConfigured { hint: String },

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),
}

/// Why a single channel could not deliver a lead.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("no response within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected with status {status}: {description}")]
    Rejected { status: u16, description: String },

    #[error("invalid credentials: {0}")]
    Credentials(String),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl DeliveryError {
    /// Provider-supplied (or transport) text, suitable for appending to a
    /// user-facing message.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Rejected { description, .. } => description.clone(),
            other => other.to_string(),
        }
    }
}
