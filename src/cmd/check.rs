//! `lead-relay check`: report which delivery channels are configured.
//!
//! Resolves the same flags and environment variables as `serve` and
//! prints the per-channel status as text or JSON. Secret values are
//! never printed, only the names of missing variables.

use crate::cli::{CheckArgs, OutputFormat};
use crate::config::model::{ChannelStatus, Settings};
use crate::error::LeadRelayError;

pub fn execute(args: &CheckArgs) -> Result<(), LeadRelayError> {
    let settings = Settings::from_args(&args.channels);
    let statuses = settings.channel_statuses();

    match args.format {
        OutputFormat::Text => print!("{}", format_report(&statuses)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "ready": settings.any_configured(),
                "channels": statuses,
                "sheet_range": settings.sheets.range,
                "timeout_ms": u64::try_from(settings.channel_timeout.as_millis())
                    .unwrap_or(u64::MAX),
            })
        ),
    }

    if settings.any_configured() {
        Ok(())
    } else {
        Err(LeadRelayError::NoChannelConfigured {
            hint: "Set TELEGRAM_BOT_TOKEN + TELEGRAM_CHAT_ID and/or \
                   GOOGLE_SERVICE_ACCOUNT_EMAIL + GOOGLE_PRIVATE_KEY + GOOGLE_SHEET_ID."
                .into(),
        })
    }
}

#[must_use]
pub fn format_report(statuses: &[ChannelStatus]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for status in statuses {
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        if status.configured {
            let _ = writeln!(buf, "\u{2713} {}", status.service);
        } else {
            let _ = writeln!(
                buf,
                "\u{2717} {} (missing {})",
                status.service,
                status.missing.join(", ")
            );
        }
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_missing_variables() {
        let report = format_report(&[
            ChannelStatus {
                service: "Telegram".into(),
                configured: true,
                missing: vec![],
            },
            ChannelStatus {
                service: "Google Sheets".into(),
                configured: false,
                missing: vec!["GOOGLE_PRIVATE_KEY".into(), "GOOGLE_SHEET_ID".into()],
            },
        ]);
        assert_eq!(
            report,
            "\u{2713} Telegram\n\u{2717} Google Sheets (missing GOOGLE_PRIVATE_KEY, GOOGLE_SHEET_ID)\n"
        );
    }
}
