use tracing_subscriber::EnvFilter;

use crate::cli::LogFormat;

/// Directive used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber. Logs go to stderr so stdout carries only answers.
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    let _ = match format {
        LogFormat::Pretty => builder.with_target(false).try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };
}
