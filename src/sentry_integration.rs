//! Optional Sentry error reporting.
//!
//! Panics and `error!` events are reported; lower levels ride along as
//! breadcrumbs through the tracing layer installed in `logging`. Leads
//! carry names and phone numbers, so default PII stays off and request
//! bodies are never attached.

/// Start the Sentry client. Returns `None` when the DSN does not parse,
/// in which case reporting stays disabled and the server runs normally.
///
/// The guard flushes pending events on drop; hold it for the whole process.
pub fn init(dsn: &str, environment: Option<&str>) -> Option<sentry::ClientInitGuard> {
    let dsn = match dsn.parse::<sentry::types::Dsn>() {
        Ok(dsn) => dsn,
        Err(e) => {
            tracing::warn!(error = %e, "SENTRY_DSN is invalid, error reporting disabled");
            return None;
        }
    };

    let guard = sentry::init(sentry::ClientOptions {
        dsn: Some(dsn),
        environment: environment.map(|e| e.to_owned().into()),
        release: Some(concat!("lead-relay@", env!("CARGO_PKG_VERSION")).into()),
        send_default_pii: false,
        attach_stacktrace: true,
        ..Default::default()
    });

    sentry::configure_scope(|scope| {
        scope.set_tag("submit_path", crate::server::SUBMIT_PATH);
    });

    Some(guard)
}
