//! Tracing setup for the `auto-ease` binary
//!
//! Events go to stderr so that stdout only carries reports. With a log
//! directory set, the same events are also appended to a daily file.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{EaseError, EaseResult};

pub const LOG_FILE_PREFIX: &str = "auto-ease.log";

#[derive(Debug, Clone)]
pub struct LogOptions {
    /// `EnvFilter` directives, e.g. `info` or `auto_ease=debug`
    pub level: String,
    /// Directory for daily log files; `None` logs to stderr only
    pub dir: Option<PathBuf>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

/// Flushes the log file when dropped
#[must_use]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber. Unparsable levels fall back to `info`.
pub fn init_tracing(options: &LogOptions) -> EaseResult<LogGuard> {
    let filter = EnvFilter::try_new(&options.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match &options.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let (writer, guard) =
                tracing_appender::non_blocking(rolling::daily(dir, LOG_FILE_PREFIX));
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| EaseError::invalid(format!("tracing already initialised: {e}")))?;

    Ok(LogGuard { _file: guard })
}
