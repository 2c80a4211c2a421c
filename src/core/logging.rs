use std::fs;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::core::errors::OutlineError;

const LOG_FILE_NAME: &str = "doc-outline.log";
const DEFAULT_DIRECTIVE: &str = "info";

static FILE_WRITER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber: human-readable output on stderr plus a
/// daily-rotated plain-text file in `log_dir`. `RUST_LOG` overrides the
/// default `info` level.
///
/// Returns `false` when a subscriber was already installed, in which case
/// nothing changes.
pub fn init(log_dir: &Path) -> Result<bool, OutlineError> {
    fs::create_dir_all(log_dir).map_err(|e| OutlineError::io(log_dir, e))?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(DEFAULT_DIRECTIVE)
            .map_err(|e| OutlineError::Config(format!("invalid log filter: {}", e)))?,
    };

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .is_ok();

    if installed {
        let _ = FILE_WRITER_GUARD.set(guard);
    }
    Ok(installed)
}
