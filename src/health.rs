//! `GET /health` endpoint handler.
//!
//! Returns a [`HealthResponse`] JSON payload containing the server
//! version and build, uptime, per-channel configuration, and cumulative
//! submission counters.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::config::model::ChannelStatus;
use crate::server::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub build: BuildInfo,
    pub uptime_seconds: u64,
    pub channels: Vec<ChannelStatus>,
    pub stats: StatsResponse,
}

#[derive(Serialize, Deserialize)]
pub struct BuildInfo {
    pub git_commit: String,
    pub profile: String,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub submissions_delivered: u64,
    pub submissions_failed: u64,
    pub submissions_rejected: u64,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let channels: Vec<ChannelStatus> = state
        .channels
        .iter()
        .map(|c| ChannelStatus {
            service: c.service().to_string(),
            configured: c.is_configured(),
            missing: Vec::new(),
        })
        .collect();

    // Running without any channel is allowed but every submission fails
    let status = if channels.iter().any(|c| c.configured) {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: BuildInfo {
            git_commit: env!("LEAD_RELAY_GIT_SHORT").to_string(),
            profile: env!("LEAD_RELAY_BUILD_PROFILE").to_string(),
        },
        uptime_seconds: state.start_time.elapsed().as_secs(),
        channels,
        stats: StatsResponse {
            submissions_delivered: state.stats.delivered.load(Ordering::Relaxed),
            submissions_failed: state.stats.failed.load(Ordering::Relaxed),
            submissions_rejected: state.stats.rejected.load(Ordering::Relaxed),
        },
    })
}
