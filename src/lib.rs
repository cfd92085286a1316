//! lead-relay forwards landing-page lead submissions to Telegram and
//! Google Sheets.
//!
//! A single `POST /api/sendMessage` endpoint validates the form, renders
//! it once into a chat message and a spreadsheet row, and fans the lead
//! out to every configured channel concurrently. Any successful channel
//! makes the submission succeed; failures are reported only when no
//! channel delivered.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (serve, check, health).
//! - [`config`] -- Channel settings from flags / environment variables.
//! - [`channels`] -- The [`Channel`](channels::Channel) trait, Telegram and
//!   Google Sheets senders, and the timeout-bounded delivery wrapper.
//! - [`submission`] -- Payload validation, message formatting, fan-out
//!   and outcome aggregation behind the HTTP handler.
//! - [`error`] -- Error types using `thiserror`.
//! - [`health`] -- `GET /health` endpoint handler.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`server`] -- Axum server setup, shared application state, HTTP client,
//!   and graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `sentry-integration` | Sentry error tracking |

// Binary crate: public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod channels;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod server;
pub mod submission;

#[cfg(feature = "sentry-integration")]
pub mod sentry_integration;
