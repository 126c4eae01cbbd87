// covidsync/src/utils/logging.rs
use anyhow::{Context, Result};
use flexi_logger::{DeferredNow, FileSpec, Logger, LoggerHandle, WriteMode};
use log::Record;
use std::io::Write;
use std::path::Path;

use crate::config::LogConfig;

/// Starts the file logger. The returned handle must outlive every log call.
pub fn init(log_config: &LogConfig) -> Result<LoggerHandle> {
    Logger::try_with_env_or_str(&log_config.level)
        .with_context(|| format!("Invalid log specification '{}'", log_config.level))?
        .log_to_file(file_spec(&log_config.file))
        .append()
        .write_mode(WriteMode::Direct)
        .format_for_files(line_format)
        .start()
        .with_context(|| format!("Failed to start logging to {}", log_config.file.display()))
}

/// Single fixed-name file: no timestamp in the name, no rotation.
fn file_spec(path: &Path) -> FileSpec {
    let mut spec = FileSpec::default().suppress_timestamp();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        spec = spec.directory(dir);
    }
    if let Some(stem) = path.file_stem() {
        spec = spec.basename(stem.to_string_lossy());
    }
    // extensionless names keep flexi_logger's default ".log" suffix
    if let Some(ext) = path.extension() {
        spec = spec.suffix(ext.to_string_lossy());
    }
    spec
}

/// `2024-01-31 08:00:00,123: INFO - message`
pub fn line_format(
    w: &mut dyn Write,
    now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{}: {} - {}",
        now.now().format("%Y-%m-%d %H:%M:%S,%3f"),
        record.level(),
        record.args()
    )
}
