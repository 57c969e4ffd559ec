use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter};

/// Set to `true` to log in JSON.
const JSON_LOG_ENV: &str = "AUTOINJECT_JSON_LOG";

/// Logs go to stderr so the printed manifest can be piped, filtered by `RUST_LOG`.
pub(crate) fn init_tracing_registry() {
    let json_log = std::env::var(JSON_LOG_ENV)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(false);

    if json_log {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE)
                    .json(),
            )
            .with(EnvFilter::from_default_env())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }
}
