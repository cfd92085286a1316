//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (serve, check, health), and their associated argument
//! structs. Every flag has an environment variable equivalent so the
//! service can be configured entirely from a container or serverless
//! environment.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::model::{
    DEFAULT_CHANNEL_TIMEOUT_MS, DEFAULT_SHEETS_API_BASE, DEFAULT_SHEET_RANGE,
    DEFAULT_TELEGRAM_API_BASE, DEFAULT_TOKEN_URI,
};

#[derive(Parser)]
#[command(
    name = "lead-relay",
    version,
    about = "Lead-capture form relay to Telegram and Google Sheets",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        lead-relay check                     Show which channels are configured\n  \
        lead-relay serve                     Start on 0.0.0.0:3000\n  \
        lead-relay serve -p 8080 --pretty    Local dev mode"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the submission endpoint
    Serve(Box<ServeArgs>),

    /// Report channel configuration without starting
    Check(CheckArgs),

    /// Check health of a running instance
    Health(HealthArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        lead-relay serve                                   Read channels from env\n  \
        lead-relay serve -p 8080 --pretty                  Local dev mode\n  \
        lead-relay serve --channel-timeout-ms 5000         Shorter per-channel timeout")]
pub struct ServeArgs {
    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[command(flatten)]
    pub channels: ChannelArgs,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Observability --
    /// Sentry DSN (enables error tracking)
    #[cfg(feature = "sentry-integration")]
    #[arg(long, env = "SENTRY_DSN", help_heading = "Observability")]
    pub sentry_dsn: Option<String>,

    /// Sentry environment tag
    #[cfg(feature = "sentry-integration")]
    #[arg(long, env = "SENTRY_ENVIRONMENT", help_heading = "Observability")]
    pub sentry_environment: Option<String>,

    // -- Tuning --
    /// Max request body size in bytes
    #[arg(
        long,
        env = "MAX_BODY_SIZE",
        default_value_t = 65_536,
        help_heading = "Tuning"
    )]
    pub max_body: usize,
}

/// Credentials and endpoints for the delivery channels.
#[derive(Args, Clone)]
pub struct ChannelArgs {
    /// Telegram bot token
    #[arg(
        long,
        env = "TELEGRAM_BOT_TOKEN",
        hide_env_values = true,
        help_heading = "Telegram"
    )]
    pub telegram_bot_token: Option<String>,

    /// Telegram chat that receives lead notifications
    #[arg(long, env = "TELEGRAM_CHAT_ID", help_heading = "Telegram")]
    pub telegram_chat_id: Option<String>,

    /// Telegram Bot API base URL
    #[arg(
        long,
        env = "TELEGRAM_API_BASE",
        default_value = DEFAULT_TELEGRAM_API_BASE,
        help_heading = "Telegram"
    )]
    pub telegram_api_base: String,

    /// Google service account e-mail
    #[arg(long, env = "GOOGLE_SERVICE_ACCOUNT_EMAIL", help_heading = "Google Sheets")]
    pub google_service_account_email: Option<String>,

    /// Google service account private key (PKCS#8 PEM, `\n` escapes allowed)
    #[arg(
        long,
        env = "GOOGLE_PRIVATE_KEY",
        hide_env_values = true,
        help_heading = "Google Sheets"
    )]
    pub google_private_key: Option<String>,

    /// Spreadsheet ID
    #[arg(long, env = "GOOGLE_SHEET_ID", help_heading = "Google Sheets")]
    pub google_sheet_id: Option<String>,

    /// A1 range rows are appended to
    #[arg(
        long,
        env = "GOOGLE_SHEET_RANGE",
        default_value = DEFAULT_SHEET_RANGE,
        help_heading = "Google Sheets"
    )]
    pub google_sheet_range: String,

    /// Google Sheets API base URL
    #[arg(
        long,
        env = "GOOGLE_SHEETS_API_BASE",
        default_value = DEFAULT_SHEETS_API_BASE,
        help_heading = "Google Sheets"
    )]
    pub google_sheets_api_base: String,

    /// OAuth2 token endpoint for the service account
    #[arg(
        long,
        env = "GOOGLE_TOKEN_URI",
        default_value = DEFAULT_TOKEN_URI,
        help_heading = "Google Sheets"
    )]
    pub google_token_uri: String,

    /// Per-channel delivery timeout in milliseconds
    #[arg(
        long,
        env = "CHANNEL_TIMEOUT_MS",
        default_value_t = DEFAULT_CHANNEL_TIMEOUT_MS,
        help_heading = "Tuning"
    )]
    pub channel_timeout_ms: u64,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub channels: ChannelArgs,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:3000")]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
