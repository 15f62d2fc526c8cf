//! Shared tracing initialization.
//!
//! The CLI and any embedding process append structured logs to the same
//! `market.log` in the data directory, so one file shows page loads,
//! enrichment outcomes and fallbacks across runs.

use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Initialize tracing to `{data_dir}/market.log` (append mode).
pub fn init_file_tracing(data_dir: &Path) {
    std::fs::create_dir_all(data_dir).ok();
    let log_path = data_dir.join("market.log");

    // Open in APPEND mode — multiple processes may write to the same file.
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .unwrap_or_else(|_| {
            let null = if cfg!(windows) { "NUL" } else { "/dev/null" };
            std::fs::File::create(null).expect("Cannot create log fallback")
        });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(log_file))
        .with_target(true)
        .with_ansi(false)
        .init();
}

/// Initialize tracing to stderr (interactive CLI use).
pub fn init_stderr_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
