use std::sync::mpsc;

use crate::log::{log_level::LogLevel, log_msg::LogMsg, log_sink::LogSink};

/// Lightweight, cloneable handle to a logger queue.
///
/// `LoggerHandle` enqueues [`LogMsg`] into a bounded `SyncSender`. Calls to
/// [`try_log`](Self::try_log) never block: if the queue is full the line is dropped,
/// so a slow disk can never stall `protect`/`unprotect`.
///
/// # Examples
/// ```ignore
/// let (handle, rx) = LoggerHandle::channel(64);
/// let session = Session::create(&policies, Arc::new(handle))?;
/// ```
#[derive(Clone)]
pub struct LoggerHandle {
    pub(super) tx: mpsc::SyncSender<LogMsg>,
    pub(super) min_level: LogLevel,
}

impl LogSink for LoggerHandle {
    #[inline]
    fn log(&self, level: LogLevel, msg: &str, target: &'static str) {
        let _ = self.try_log(level, msg, target);
    }
}

impl LoggerHandle {
    /// Creates a detached handle plus the receiving end of its queue.
    ///
    /// Useful when the application drains log lines itself instead of running a
    /// [`Logger`](super::logger::Logger) worker.
    #[must_use]
    pub fn channel(cap: usize) -> (Self, mpsc::Receiver<LogMsg>) {
        let (tx, rx) = mpsc::sync_channel(cap);
        (
            Self {
                tx,
                min_level: LogLevel::Trace,
            },
            rx,
        )
    }

    /// Returns a copy of this handle that drops lines below `level`.
    #[must_use]
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Attempts to enqueue a log message without blocking.
    ///
    /// Lines below the handle's minimum level are discarded and reported as `Ok(())`.
    ///
    /// # Errors
    /// - `Err(TrySendError::Full(_))` when the bounded queue is at capacity.
    /// - `Err(TrySendError::Disconnected(_))` when the receiver has been dropped.
    pub fn try_log<S: Into<String>>(
        &self,
        level: LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), mpsc::TrySendError<LogMsg>> {
        if level < self.min_level {
            return Ok(());
        }
        self.tx.try_send(LogMsg::now(level, text, target))
    }
}
