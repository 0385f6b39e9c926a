//! Logging setup
//!
//! Diagnostics go to stderr so they never mix with table or JSON output on
//! stdout. The filter comes from `CCA_LOG` when set, otherwise from the
//! verbosity flag.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV: &str = "CCA_LOG";

/// Errors that may occur while initializing logging
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(String),
}

/// Filter used when `CCA_LOG` is not set
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "cca=debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber; later calls fail with `SetGlobal`
pub fn init(verbose: bool) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| LoggingError::SetGlobal(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "cca=debug");
        assert_eq!(default_directive(false), "warn");
    }

    #[test]
    fn test_second_init_is_reported() {
        let _ = init(false);
        assert!(matches!(init(false), Err(LoggingError::SetGlobal(_))));
    }
}
