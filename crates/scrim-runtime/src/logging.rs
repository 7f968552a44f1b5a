#![forbid(unsafe_code)]

//! JSON log output for hosts without their own subscriber.
//!
//! ```ignore
//! scrim_runtime::logging::init("scrim_modal=debug")?;
//! ```
//!
//! `RUST_LOG` takes precedence over the directive passed to [`init`].

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Error returned when a global subscriber is already installed.
#[derive(Debug)]
pub struct LoggingInitError(String);

impl std::fmt::Display for LoggingInitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to install tracing subscriber: {}", self.0)
    }
}

impl std::error::Error for LoggingInitError {}

/// Install a global JSON subscriber filtered by `RUST_LOG`, or by
/// `default_directive` when the variable is unset or invalid.
///
/// # Errors
///
/// Returns [`LoggingInitError`] if a global subscriber is already set.
pub fn init(default_directive: &str) -> Result<(), LoggingInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_current_span(true))
        .try_init()
        .map_err(|e| LoggingInitError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_fails() {
        let _ = init("scrim_modal=debug");
        let err = init("scrim_modal=debug").unwrap_err();
        assert!(err.to_string().starts_with("failed to install tracing subscriber"));
    }
}
