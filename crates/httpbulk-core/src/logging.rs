//! Optional tracing setup for applications embedding the executor.
//!
//! The library itself only emits `tracing` events; nothing is printed unless
//! the host installs a subscriber, either its own or one of these helpers.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "info,httpbulk_core=debug";

/// Appends to the log file; falls back to stderr if the handle can't be cloned.
enum LogSink {
    File(fs::File),
    Stderr,
}

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::File(f) => f.write(buf),
            LogSink::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File(f) => f.flush(),
            LogSink::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct SharedFile(fs::File);

impl<'a> MakeWriter<'a> for SharedFile {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(LogSink::File)
            .unwrap_or(LogSink::Stderr)
    }
}

/// `RUST_LOG` if set, else `info,httpbulk_core=debug`.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Default log location: `~/.local/state/httpbulk/httpbulk.log`.
pub fn default_log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("httpbulk")?;
    Ok(xdg_dirs.get_state_home().join("httpbulk.log"))
}

/// Install a global subscriber writing to [`default_log_path`].
/// Returns Err (e.g. unwritable state dir, subscriber already set) so the
/// caller can fall back to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    init_logging_at(&default_log_path()?)
}

/// Install a global subscriber appending to `log_file_path`.
pub fn init_logging_at(log_file_path: &Path) -> Result<()> {
    if let Some(dir) = log_file_path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("open {}", log_file_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(BoxMakeWriter::new(SharedFile(file)))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("install subscriber: {}", e))?;

    tracing::info!("httpbulk logging initialized at {}", log_file_path.display());
    Ok(())
}

/// Log to stderr only. A no-op if a global subscriber is already installed.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_log_path_is_under_httpbulk() {
        if let Ok(path) = default_log_path() {
            assert!(path.ends_with("httpbulk.log"));
        }
    }

    #[test]
    fn default_directives_parse() {
        assert!(DEFAULT_DIRECTIVES.parse::<EnvFilter>().is_ok());
    }
}
