use crate::log::log_level::LogLevel;

/// Destination for log lines emitted by sessions and the logger itself.
///
/// Implementations must never block the packet path for long; the crate calls
/// `log` inline from `protect`/`unprotect`.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, msg: &str, target: &'static str);
}
