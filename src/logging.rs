use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{EnrichError, Result};

/// Initializes the logging system with both console and file output.
/// The returned guard flushes the file writer when dropped, so keep it alive
/// for the whole run. Fails if the log directory cannot be created or a
/// subscriber is already installed.
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard> {
    // Ensure logs directory exists
    fs::create_dir_all(log_dir).map_err(|e| {
        EnrichError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to create log directory '{}': {}", log_dir.display(), e),
        ))
    })?;

    // Create a non-blocking file appender for daily log rotation
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("record-enricher.log")
        .build(log_dir)
        .map_err(|e| EnrichError::Config(format!("Failed to open log file in '{}': {}", log_dir.display(), e)))?;
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Create a JSON layer for file logging
    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    // Console goes to stderr so stdout stays free for the document
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    // Respect RUST_LOG if set; otherwise info for our crate
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("record_enricher=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| EnrichError::Config(format!("Failed to install log subscriber: {}", e)))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_uncreatable_log_dir_is_an_error() {
        let file = NamedTempFile::new().unwrap();
        let err = init_logging(&file.path().join("logs")).unwrap_err();
        assert!(matches!(err, EnrichError::Io(_)));
        assert!(err.to_string().contains("log directory"));
    }
}
