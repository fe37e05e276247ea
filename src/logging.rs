//! Logging subsystem helpers.
//!
//! Provides log-file rotation, default path resolution, and level
//! conversion. The actual `tracing-subscriber` setup lives in
//! `main.rs` because `tracing-subscriber` is only a binary dependency.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tether_config::LogLevel;

/// Maximum size of a single log file before rotation (10 MB).
pub const DEFAULT_MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum number of rotated log files to retain.
pub const DEFAULT_MAX_LOG_FILES: u32 = 5;

/// Return the platform-specific default log file path.
///
/// * macOS: `$HOME/Library/Logs/tether/tether.log`
/// * Linux: `$HOME/.local/share/tether/tether.log`
/// * Windows: `%APPDATA%/tether/logs/tether.log`
/// * Fallback: `/tmp/tether/tether.log`
pub fn default_log_file_path() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Logs/tether/tether.log");
        }
    }
    #[cfg(target_os = "linux")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".local/share/tether/tether.log");
        }
    }
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("tether\\logs\\tether.log");
        }
    }
    PathBuf::from("/tmp/tether/tether.log")
}

/// Ensure the parent directory of a log file exists, creating it if necessary.
pub fn ensure_log_dir(log_path: &Path) -> io::Result<()> {
    if let Some(parent) = log_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Rotate log files when the current file exceeds `max_size` bytes.
///
/// Rotation scheme:
/// ```text
///   tether.log   → tether.log.1
///   tether.log.1 → tether.log.2
///   …
///   tether.log.<max_files> is deleted
/// ```
///
/// Does nothing when the file does not exist or is smaller than `max_size`.
pub fn rotate_log_files(log_path: &Path, max_size: u64, max_files: u32) -> io::Result<()> {
    if !log_path.exists() {
        return Ok(());
    }
    let metadata = fs::metadata(log_path)?;
    if metadata.len() < max_size {
        return Ok(());
    }

    // Delete the oldest rotated file.
    let oldest = rotated_path(log_path, max_files);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }

    // Shift existing rotated files upward.
    for i in (1..max_files).rev() {
        let from = rotated_path(log_path, i);
        let to = rotated_path(log_path, i + 1);
        if from.exists() {
            fs::rename(&from, &to)?;
        }
    }

    // Rotate the current log to .1
    let first_rotated = rotated_path(log_path, 1);
    fs::rename(log_path, &first_rotated)?;

    Ok(())
}

/// Convert a configured [`LogLevel`] to a `tracing`-compatible filter
/// string.
pub fn level_filter(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

// ── internal helpers ────────────────────────────────────────────────────────

fn rotated_path(base: &Path, index: u32) -> PathBuf {
    let name = base.file_name().unwrap_or_default().to_string_lossy();
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("{}.{}", name, index))
}

// ── tests ───────────────────────────────────────────────────────────────────
