//! Tracing setup for relay hosts.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Directive used when `RUST_LOG` is absent or unusable.
fn relay_directive(relay_log: Option<&str>) -> String {
    let level = match relay_log.map(str::trim) {
        Some("debug") => "debug",
        Some("trace") => "trace",
        Some("warn") | Some("warning") => "warn",
        Some("error") => "error",
        _ => "info",
    };
    format!("relay={level},relay_lambda={level}")
}

/// Pick the filter: a non-empty, parseable `RUST_LOG` wins, anything else
/// falls back to the `RELAY_LOG` level for the relay crates.
fn build_filter(rust_log: Option<&str>, relay_log: Option<&str>) -> EnvFilter {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            // No subscriber yet, so stderr is the only place this can go.
            Err(e) => eprintln!("ignoring invalid RUST_LOG {directives:?}: {e}"),
        }
    }
    EnvFilter::new(relay_directive(relay_log))
}

/// Initialize tracing from RUST_LOG, RELAY_LOG and LOG_FORMAT.
///
/// Logs go to stderr; the bootstrap child shares the same streams.
/// Calling this twice is harmless.
pub fn init_tracing() {
    let rust_log = std::env::var("RUST_LOG").ok();
    let relay_log = std::env::var("RELAY_LOG").ok();
    let filter = build_filter(rust_log.as_deref(), relay_log.as_deref());

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
}
