//! Channel settings built once at start-up.
//!
//! Each channel has an explicit [`is_configured`](TelegramSettings::is_configured)
//! predicate; a channel whose required values are missing is skipped at
//! delivery time rather than failing the process.

use std::time::Duration;

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_SHEET_RANGE: &str = "Sheet1!A1";
pub const DEFAULT_CHANNEL_TIMEOUT_MS: u64 = 10_000;

#[derive(Clone)]
pub struct Settings {
    pub telegram: TelegramSettings,
    pub sheets: SheetsSettings,
    pub channel_timeout: Duration,
}

#[derive(Clone)]
pub struct TelegramSettings {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub api_base: String,
}

#[derive(Clone)]
pub struct SheetsSettings {
    pub service_account_email: Option<String>,
    pub private_key: Option<String>,
    pub sheet_id: Option<String>,
    pub range: String,
    pub api_base: String,
    pub token_uri: String,
}

/// Configuration state of one channel, safe to print or serialize.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChannelStatus {
    pub service: String,
    pub configured: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

fn missing_vars(required: &[(&'static str, &Option<String>)]) -> Vec<String> {
    required
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(var, _)| (*var).to_string())
        .collect()
}

impl TelegramSettings {
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }

    #[must_use]
    pub fn missing(&self) -> Vec<String> {
        missing_vars(&[
            ("TELEGRAM_BOT_TOKEN", &self.bot_token),
            ("TELEGRAM_CHAT_ID", &self.chat_id),
        ])
    }
}

impl SheetsSettings {
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.service_account_email.is_some()
            && self.private_key.is_some()
            && self.sheet_id.is_some()
    }

    #[must_use]
    pub fn missing(&self) -> Vec<String> {
        missing_vars(&[
            ("GOOGLE_SERVICE_ACCOUNT_EMAIL", &self.service_account_email),
            ("GOOGLE_PRIVATE_KEY", &self.private_key),
            ("GOOGLE_SHEET_ID", &self.sheet_id),
        ])
    }
}

impl Settings {
    #[must_use]
    pub fn channel_statuses(&self) -> Vec<ChannelStatus> {
        vec![
            ChannelStatus {
                service: crate::channels::TELEGRAM.into(),
                configured: self.telegram.is_configured(),
                missing: self.telegram.missing(),
            },
            ChannelStatus {
                service: crate::channels::GOOGLE_SHEETS.into(),
                configured: self.sheets.is_configured(),
                missing: self.sheets.missing(),
            },
        ]
    }

    #[must_use]
    pub const fn any_configured(&self) -> bool {
        self.telegram.is_configured() || self.sheets.is_configured()
    }
}

impl std::fmt::Debug for Settings {
    // Secrets stay out of logs; only report what is configured
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("telegram", &self.telegram.is_configured())
            .field("sheets", &self.sheets.is_configured())
            .field("sheet_range", &self.sheets.range)
            .field("channel_timeout", &self.channel_timeout)
            .finish()
    }
}
