use std::time::SystemTime;

use crate::log::log_level::LogLevel;

/// A single log line travelling from a [`LoggerHandle`](super::logger_handle::LoggerHandle)
/// to the logger worker.
#[derive(Debug, Clone)]
pub struct LogMsg {
    /// Severity of the line.
    pub level: LogLevel,
    /// Wall-clock timestamp in milliseconds since the UNIX epoch.
    pub ts_ms: u128,
    /// Rendered message.
    pub text: String,
    /// Module path that produced the line.
    pub target: &'static str,
}

impl LogMsg {
    /// Creates a message stamped with the current time.
    pub fn now(level: LogLevel, text: impl Into<String>, target: &'static str) -> Self {
        Self {
            level,
            ts_ms: now_millis(),
            text: text.into(),
            target,
        }
    }
}

/// Milliseconds since the UNIX epoch, or 0 if the clock is before it.
pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
