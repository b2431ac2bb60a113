use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ReportError, ReportResult};

/// Console output plus an appended plain-text copy in `log_file`.
pub fn init_tracing(log_file: Option<&Path>) -> ReportResult<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,gscan=info".into());

    let file_layer = match log_file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir).map_err(|err| {
                    ReportError::config(format!("failed to create log dir {}: {err}", dir.display()))
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| {
                    ReportError::config(format!("failed to open log file {}: {err}", path.display()))
                })?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()
        .map_err(|err| ReportError::config(format!("failed to install tracing subscriber: {err}")))
}
