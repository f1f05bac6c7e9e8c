//! Logging setup shared by the kernel crates and the `turbo-sim` binary.

use std::sync::Once;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

static INIT: Once = Once::new();

/// Default filter when `RUST_LOG` is unset: info-level for this workspace, warn elsewhere.
pub fn get_default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,turbo_core=info,turbo_codec=info,turbo_channel=info,turbo_sim=info"))
}

/// Installs a stdout subscriber plus, if `logfile` is given, a non-blocking file appender.
///
/// Returns the file appender's `WorkerGuard`: the caller must hold it for the lifetime of
/// the process, otherwise buffered log lines are dropped on exit rather than flushed.
pub fn setup_logging_default(logfile: Option<String>) -> Option<WorkerGuard> {
    let mut guard = None;

    INIT.call_once(|| {
        let stdout_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_filter(get_default_filter());

        if let Some(path) = logfile {
            let dir = std::path::Path::new(&path)
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let filename = std::path::Path::new(&path)
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| "turbo-sim.log".to_string());

            let file_appender = tracing_appender::rolling::never(dir, filename);
            let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
            guard = Some(file_guard);

            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(get_default_filter());

            tracing_subscriber::registry()
                .with(stdout_layer)
                .with(file_layer)
                .init();
        } else {
            tracing_subscriber::registry().with(stdout_layer).init();
        }
    });

    guard
}
