//! Tracing subscriber setup.

use scoreline_settings::LoggingSettings;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over the configured level. Subsequent calls
/// are no-ops.
pub fn init_subscriber(settings: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    // try_init is a no-op if a global subscriber is already set
    let _ = if settings.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
}
