//! Logging bootstrap shared by the server and the CLI.

use catalog_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise the configured level applies.
pub fn filter(settings: &TelemetrySettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level))
}

/// Install the global subscriber. Calling it twice is harmless; the first install wins.
pub fn init(settings: &TelemetrySettings) {
    let builder = tracing_subscriber::fmt().with_env_filter(filter(settings));

    let installed = match settings.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if installed.is_ok() {
        tracing::info!(
            target: "catalog-telemetry",
            format = ?settings.log_format,
            "telemetry initialized"
        );
    }
}

/// Subscriber that writes to stderr, used by interactive commands so log
/// lines never mix with program output.
pub fn init_stderr(settings: &TelemetrySettings) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(settings))
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_does_not_panic() {
        let settings = TelemetrySettings::default();
        init(&settings);
        init(&settings);
        init_stderr(&settings);
    }

    #[test]
    fn configured_level_is_used_as_fallback() {
        let settings = TelemetrySettings {
            log_level: "warn".to_string(),
            ..TelemetrySettings::default()
        };
        // A valid directive always yields a filter, even when RUST_LOG is unset.
        let rendered = filter(&settings).to_string();
        assert!(!rendered.is_empty());
    }
}
