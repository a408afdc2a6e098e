use crate::error::Result;
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

const LOG_FILE_NAME: &str = "teddycloud-starter.log";

/// Where log events go and how verbose they are
#[derive(Debug, Clone, Default)]
pub struct LogSettings {
    pub debug: bool,
    /// Daily rotated file in this directory instead of stderr
    pub log_dir: Option<PathBuf>,
}

impl LogSettings {
    fn default_level(&self) -> &'static str {
        match (self.debug, self.log_dir.is_some()) {
            (true, _) => "debug",
            (false, true) => "info",
            (false, false) => "warn",
        }
    }
}

/// Keeps the non-blocking log writer flushing until dropped
#[derive(Default)]
pub struct ObservabilityGuard {
    log_guard: Option<WorkerGuard>,
}

impl ObservabilityGuard {
    pub fn writes_to_file(&self) -> bool {
        self.log_guard.is_some()
    }
}

/// Initialize logging
///
/// Stderr output stays at `warn` unless debugging so log lines do not
/// interleave with the interactive prompts.
pub fn init_observability(settings: &LogSettings) -> Result<ObservabilityGuard> {
    let mut guard = ObservabilityGuard::default();
    let filter = create_env_filter(settings.default_level());

    match &settings.log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let (non_blocking, worker_guard) = build_file_writer(dir);
            guard.log_guard = Some(worker_guard);
            init_subscriber_with_writer(non_blocking, false, filter);
        }
        None => init_subscriber_with_writer(std::io::stderr, true, filter),
    }

    Ok(guard)
}

/// RUST_LOG takes precedence over the level derived from the flags
fn create_env_filter(default_level: &str) -> EnvFilter {
    let directive = std::env::var("RUST_LOG")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default_level.to_string());

    EnvFilter::try_new(&directive).unwrap_or_else(|_| {
        eprintln!("Failed to parse filter directive: {directive}. Falling back to: {default_level}");
        EnvFilter::new(default_level)
    })
}

fn init_subscriber_with_writer<W>(writer: W, use_ansi: bool, filter: EnvFilter)
where
    W: for<'a> fmt::MakeWriter<'a> + Send + Sync + 'static,
{
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(use_ansi)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .ok();
}

fn build_file_writer(dir: &std::path::Path) -> (NonBlocking, WorkerGuard) {
    let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
    tracing_appender::non_blocking(file_appender)
}
