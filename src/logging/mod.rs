//! Logging infrastructure - structured tracing around bridge calls
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Configurable level, overridable through `RUST_LOG`
//! - Optional JSON output
//! - Optional file output through a non-blocking appender

use once_cell::sync::OnceCell;
use std::io;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::errors::BridgeError;

/// Global logging state
static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Log file path; stderr when unset
    pub log_path: Option<String>,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_path: None,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // CALLBRIDGE_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level_str) = std::env::var("CALLBRIDGE_LOG_LEVEL") {
            config.level = level_str.parse().unwrap_or(Level::INFO);
        }

        // CALLBRIDGE_LOG_FILE: path to log file
        if let Ok(path) = std::env::var("CALLBRIDGE_LOG_FILE") {
            config.log_path = Some(path);
        }

        config.json_format = std::env::var("CALLBRIDGE_LOG_JSON").is_ok();
        config.show_spans = std::env::var("CALLBRIDGE_LOG_SPANS").is_ok();

        config
    }

    /// Verbose config for debugging a host namespace
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            log_path: None,
            json_format: false,
            show_spans: true,
        }
    }
}

/// Initialize logging with configuration from the environment
pub fn init() -> Option<WorkerGuard> {
    init_with_config(LogConfig::from_env())
}

/// Initialize logging with custom configuration
///
/// Only the first call installs a subscriber. When logging to a file the
/// returned guard must be kept alive until shutdown so buffered lines flush.
pub fn init_with_config(config: LogConfig) -> Option<WorkerGuard> {
    let mut guard = None;
    LOGGER_INITIALIZED.get_or_init(|| {
        guard = install(&config);
    });
    guard
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

fn install(config: &LogConfig) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "callbridge={}",
            config.level.as_str().to_lowercase()
        ))
    });

    let span_events = if config.show_spans {
        FmtSpan::ENTER | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let (writer, guard) = match config.log_path.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .map(|name| name.to_os_string())
                .unwrap_or_else(|| "callbridge.log".into());
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(io::stderr), None),
    };

    let layer = fmt::layer()
        .with_writer(writer)
        .with_span_events(span_events)
        .with_target(true)
        .with_line_number(cfg!(debug_assertions));

    // Another subscriber may already be installed by the host application
    let _ = if config.json_format {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init()
    };

    guard
}

// ============================================================================
// Bridge events
// ============================================================================

/// Log dispatch of a resolved function
pub fn log_call_start(function: &str, arg_count: usize, no_args: bool) {
    use tracing::debug;
    debug!(
        event = "call_start",
        function = function,
        args = arg_count,
        no_args = no_args,
        "Dispatching call"
    );
}

/// Log a call whose result converted cleanly
pub fn log_call_complete(function: &str, duration_us: u64) {
    use tracing::debug;
    debug!(
        event = "call_complete",
        function = function,
        duration_us = duration_us,
        "Call completed"
    );
}

/// Log a failed call as reported to the UI layer
pub fn log_bridge_error(error: &BridgeError) {
    use tracing::warn;
    if error.kind().is_conversion() {
        warn!(
            event = "conversion_error",
            function = %error.function,
            kind = error.kind().code(),
            error = %error.description,
            "Call result could not be converted"
        );
    } else {
        warn!(
            event = "dispatch_error",
            function = %error.function,
            kind = error.kind().code(),
            error = %error.description,
            "Call failed"
        );
    }
}
