//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process.
///
/// JSON output by default (set `LOG_FORMAT=pretty` for local dev), filter
/// configurable via `RUST_LOG`. Safe to call multiple times (subsequent
/// calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("exportdesk=info,tower_http=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("pretty") => {
            let _ = builder.pretty().try_init();
        }
        _ => {
            let _ = builder.json().try_init();
        }
    }
}
