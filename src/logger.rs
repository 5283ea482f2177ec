//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, before any component logs.

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Initialise the global tracing subscriber, writing to stderr.
///
/// `level` accepts standard level strings: `"error"`, `"warn"`, `"info"`,
/// `"debug"`, `"trace"`. If `prefer_level` is `true` (a `-v` flag was given
/// on the command line), `level` wins; otherwise `RUST_LOG` takes precedence
/// and `level` is the fallback.
pub fn init(level: &str, prefer_level: bool) -> Result<(), AppError> {
    let filter = if prefer_level {
        EnvFilter::try_new(level)
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))
    }
    .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(())
}
