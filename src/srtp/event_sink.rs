use std::sync::Arc;

use crate::log::log_sink::LogSink;
use crate::srtp::event::{EventRecord, SrtpEvent};
use crate::{sink_info, sink_warn};

/// Callback invoked synchronously, inside `protect`/`unprotect`, for every event.
///
/// It must not call back into the session that raised the event.
pub type EventHandler = Arc<dyn Fn(&EventRecord) + Send + Sync>;

/// Routes events to the installed handler, or to the log when none is installed.
pub(crate) struct EventSink {
    handler: Option<EventHandler>,
    logger: Arc<dyn LogSink>,
}

impl EventSink {
    pub(crate) fn new(logger: Arc<dyn LogSink>) -> Self {
        Self {
            handler: None,
            logger,
        }
    }

    pub(crate) fn install(&mut self, handler: Option<EventHandler>) {
        self.handler = handler;
    }

    pub(crate) fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    pub(crate) fn dispatch(&self, record: EventRecord) {
        match &self.handler {
            Some(h) => h(&record),
            None => self.report(&record),
        }
    }

    fn report(&self, r: &EventRecord) {
        match r.event {
            SrtpEvent::SsrcCollision => {
                sink_warn!(self.logger, "[SRTP] {} ssrc {:#010x}: SSRC collision", r.session, r.ssrc)
            }
            SrtpEvent::KeySoftLimit => {
                sink_info!(self.logger, "[SRTP] {} ssrc {:#010x}: key usage soft limit reached", r.session, r.ssrc)
            }
            SrtpEvent::KeyHardLimit => {
                sink_warn!(self.logger, "[SRTP] {} ssrc {:#010x}: key usage hard limit reached, stream expired", r.session, r.ssrc)
            }
            SrtpEvent::PacketIndexLimit => {
                sink_warn!(self.logger, "[SRTP] {} ssrc {:#010x}: packet index limit reached, stream expired", r.session, r.ssrc)
            }
        }
    }
}
