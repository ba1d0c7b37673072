// src/logging.rs
//! Log setup: stdout always, plus an append-only log file when configured

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init(level: &str, logfile: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file, open_error) = match logfile.map(open_logfile) {
        Some(Ok(file)) => (Some(file), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    subscriber(env_filter, file).try_init()?;

    if let (Some(path), Some(e)) = (logfile, open_error) {
        tracing::warn!("Could not open log file {}, logging to stdout only: {}", path.display(), e);
    }

    Ok(())
}

/// Stdout follows `env_filter`; the log file always gets info and above.
fn subscriber(env_filter: EnvFilter, file: Option<File>) -> impl Subscriber + Send + Sync + 'static {
    let file_layer = file.map(|f| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(f))
            .with_filter(LevelFilter::INFO)
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(env_filter))
        .with(file_layer)
}

fn open_logfile(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_logfile_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("check.log");
        std::fs::write(&path, "first\n").unwrap();

        let mut file = open_logfile(&path).unwrap();
        std::io::Write::write_all(&mut file, b"second\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    fn log_to_file(console_level: &str) -> String {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("check.log");
        let file = open_logfile(&path).unwrap();

        tracing::subscriber::with_default(subscriber(EnvFilter::new(console_level), Some(file)), || {
            tracing::debug!("debug line");
            tracing::info!("info line");
            tracing::error!("error line");
        });

        std::fs::read_to_string(&path).unwrap()
    }

    #[test]
    fn test_logfile_keeps_info_when_console_is_quiet() {
        let contents = log_to_file("error");
        assert!(contents.contains("info line"));
        assert!(contents.contains("error line"));
        assert!(!contents.contains("debug line"));
    }

    #[test]
    fn test_logfile_skips_debug_when_console_is_verbose() {
        let contents = log_to_file("debug");
        assert!(contents.contains("info line"));
        assert!(!contents.contains("debug line"));
    }

    #[test]
    fn test_open_logfile_in_missing_dir_fails() {
        assert!(open_logfile(Path::new("/nonexistent/dir/check.log")).is_err());
    }
}
