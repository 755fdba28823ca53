use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::app::config::LoggingSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

pub fn resolve_log_format(format: &str) -> LogFormat {
    match format.trim().to_lowercase().as_str() {
        "pretty" => LogFormat::Pretty,
        "json" => LogFormat::Json,
        _ if cfg!(debug_assertions) => LogFormat::Pretty,
        _ => LogFormat::Json,
    }
}

// Logs go to stderr; stdout belongs to the front-end.
pub fn init_logging(settings: &LoggingSettings) {
    let fallback = if settings.level.trim().is_empty() {
        "info".to_string()
    } else {
        settings.level.trim().to_lowercase()
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match resolve_log_format(&settings.format) {
        LogFormat::Pretty => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .json()
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

pub fn new_trace_id() -> String {
    Uuid::new_v4().to_string()
}
