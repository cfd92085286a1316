//! `lead-relay health`: check the health of a running instance.
//!
//! Sends a `GET /health` request to the specified URL and displays
//! the response as formatted text or raw JSON.

use http_body_util::BodyExt;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::cli::HealthArgs;
use crate::error::LeadRelayError;
use crate::health::HealthResponse;

pub async fn execute(args: HealthArgs) -> Result<(), LeadRelayError> {
    let url = format!("{}/health", args.url.trim_end_matches('/'));
    let uri: hyper::Uri =
        url.parse().map_err(
            |e: hyper::http::uri::InvalidUri| LeadRelayError::UriParse {
                source: Box::new(e),
            },
        )?;

    let connector = hyper_util::client::legacy::connect::HttpConnector::new();
    let client = Client::builder(TokioExecutor::new()).build(connector);

    let req = hyper::Request::builder()
        .uri(uri)
        .body(http_body_util::Full::new(bytes::Bytes::new()))
        .map_err(|e| LeadRelayError::HttpRequest {
            source: Box::new(e),
        })?;

    let response = tokio::time::timeout(std::time::Duration::from_secs(10), client.request(req))
        .await
        .map_err(|_| LeadRelayError::HttpRequest {
            source: "health check timed out after 10s".into(),
        })?
        .map_err(|e| LeadRelayError::HttpRequest {
            source: Box::new(e),
        })?;

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| LeadRelayError::HttpRequest {
            source: Box::new(e),
        })?
        .to_bytes();

    if !status.is_success() {
        return Err(LeadRelayError::HealthCheckFailed(status));
    }

    if args.json {
        println!("{}", String::from_utf8_lossy(&body));
        return Ok(());
    }

    match serde_json::from_slice::<HealthResponse>(&body) {
        Ok(health) => print!("{}", format_health(&args.url, &health)),
        Err(e) => {
            eprintln!("Failed to parse health response: {e}");
            println!("{}", String::from_utf8_lossy(&body));
        }
    }

    Ok(())
}

fn format_health(url: &str, health: &HealthResponse) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    let mark = if health.status == "healthy" {
        '\u{2713}'
    } else {
        '\u{2717}'
    };
    // write! to String is infallible
    let _ = writeln!(out, "{mark} lead-relay is {} ({url})", health.status);
    let _ = writeln!(
        out,
        "  version:        {} ({}, {})",
        health.version, health.build.git_commit, health.build.profile
    );
    let _ = writeln!(out, "  uptime:         {}", format_uptime(health.uptime_seconds));
    for channel in &health.channels {
        let state = if channel.configured {
            "configured"
        } else {
            "not configured"
        };
        let _ = writeln!(out, "  {:<15} {state}", format!("{}:", channel.service));
    }
    let _ = writeln!(
        out,
        "  submissions:    {} delivered, {} failed, {} rejected",
        health.stats.submissions_delivered,
        health.stats.submissions_failed,
        health.stats.submissions_rejected
    );
    out
}

fn format_uptime(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}
