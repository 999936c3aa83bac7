use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// The environment variable holding the log filter directives.
pub const LOG_ENV: &str = "CARDSCAN_LOG";

const DEFAULT_FILTER: &str = "info";

/// Where log lines go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogTarget {
    /// Nothing is logged. Used when the terminal itself is the canvas.
    Disabled,
    Stderr,
    File(PathBuf),
}

/// Errors that can occur when setting up logging
#[derive(thiserror::Error, Debug)]
pub enum LoggingError {
    #[error("failed to open log file '{0}': {1}")]
    Open(PathBuf, #[source] io::Error),

    #[error("failed to install the log subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global subscriber for `target`.
pub fn init(target: &LogTarget) -> Result<(), LoggingError> {
    let filter = || EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    match target {
        LogTarget::Disabled => Ok(()),
        LogTarget::Stderr => {
            tracing_subscriber::registry().with(filter()).with(fmt::layer().with_writer(io::stderr)).try_init()?;
            Ok(())
        }
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            tracing_subscriber::registry()
                .with(filter())
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()?;
            Ok(())
        }
    }
}

fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new().create(true).append(true).open(path).map_err(|e| LoggingError::Open(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_is_appended() {
        let dir = tempfile::tempdir().expect("no tempdir");
        let path = dir.path().join("cardscan.log");
        std::fs::write(&path, "existing\n").expect("write failed");
        open_log_file(&path).expect("open failed");
        assert_eq!(std::fs::read_to_string(&path).expect("read failed"), "existing\n");
    }

    #[test]
    fn test_unwritable_log_file() {
        let dir = tempfile::tempdir().expect("no tempdir");
        let result = open_log_file(&dir.path().join("missing").join("cardscan.log"));
        assert!(matches!(result, Err(LoggingError::Open(_, _))));
    }

    #[test]
    fn test_disabled_installs_nothing() {
        init(&LogTarget::Disabled).expect("init failed");
    }
}
