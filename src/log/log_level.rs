/// Defines the severity levels for log messages.
///
/// Levels are ordered from the most verbose (`Trace`) to the most severe (`Error`),
/// so a sink can filter with a plain comparison against its minimum level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Per-packet detail (protect/unprotect success, index estimation).
    Trace,
    /// Stream setup detail useful while debugging key negotiation.
    Debug,
    /// Session and stream lifecycle.
    Info,
    /// Rejected packets and protocol events (replay, auth failure, key limits).
    Warn,
    /// Failures that leave a stream or session unusable.
    Error,
}

impl LogLevel {
    /// Parses a level name as written in the `[logging]` config section.
    ///
    /// Matching is case-insensitive; `warning` is accepted as an alias of `warn`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}
