//! Logging and tracing infrastructure for elfview.
//!
//! The decoder itself only emits `tracing` events; installing a subscriber
//! is left to the application. The helpers here install a reasonable one
//! with either human-readable or JSON output, filtered through `RUST_LOG`.

use serde::{Deserialize, Serialize};
use std::sync::Once;
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

static INIT: Once = Once::new();

/// Output format of the global subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber in the given format.
///
/// Only the first call has any effect. If another subscriber is already
/// installed, it is left in place.
pub fn init_tracing_with(format: LogFormat) {
    INIT.call_once(|| {
        let installed = match format {
            LogFormat::Pretty => {
                let fmt_layer = fmt::layer()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true);
                tracing_subscriber::registry()
                    .with(env_filter())
                    .with(fmt_layer)
                    .try_init()
            }
            LogFormat::Json => {
                let fmt_layer = fmt::layer()
                    .json()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true);
                tracing_subscriber::registry()
                    .with(env_filter())
                    .with(fmt_layer)
                    .try_init()
            }
        };

        if installed.is_ok() {
            debug!(?format, "elfview tracing initialized");
        }
    });
}

/// Initialize the global tracing subscriber with human-readable output.
pub fn init_tracing() {
    init_tracing_with(LogFormat::Pretty);
}

/// Initialize tracing with JSON output for structured logging.
pub fn init_tracing_json() {
    init_tracing_with(LogFormat::Json);
}

/// Macro for creating decoder spans
#[macro_export]
macro_rules! span_trace {
    ($name:expr) => {
        tracing::info_span!($name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Macro for logging and returning errors
#[macro_export]
macro_rules! log_error {
    ($err:expr) => {{
        let e = $err;
        tracing::error!(error = %e, "Decoding failed");
        e
    }};
    ($err:expr, $msg:expr) => {{
        let e = $err;
        tracing::error!(error = %e, message = $msg, "Decoding failed");
        e
    }};
}
