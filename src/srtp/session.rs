use std::collections::HashMap;
use std::sync::Arc;

use crate::log::{NoopLogSink, log_sink::LogSink};
use crate::srtp::{
    constants::SRTCP_INDEX_LEN,
    event::{EventRecord, SrtpEvent},
    event_sink::{EventHandler, EventSink},
    handles::{SessionId, StreamHandle},
    lifecycle,
    srtp_error::SrtpError,
    ssrc_selector::SsrcSelector,
    stream_context::{StreamContext, StreamDirection},
    stream_policy::StreamPolicy,
};
use crate::{sink_debug, sink_info};

struct Slot {
    generation: u32,
    stream: Option<StreamContext>,
}

/// A set of SRTP streams sharing one event handler and one logger.
///
/// Streams live in an arena addressed by [`StreamHandle`]; concrete SSRCs map to
/// slots, and at most one inbound and one outbound wildcard template spawn new
/// streams on first sight of an unknown SSRC.
///
/// A session is `Send` but not internally synchronised: wrap it in a mutex to share
/// it, which also serialises the per-stream state updates packets rely on.
pub struct Session {
    pub(super) id: SessionId,
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_ssrc: HashMap<u32, u32>,
    any_inbound: Option<StreamContext>,
    any_outbound: Option<StreamContext>,
    pub(super) events: EventSink,
    pub(super) logger: Arc<dyn LogSink>,
    deallocated: bool,
}

/// Raises events for one stream from inside the packet pipeline.
pub(super) struct Emitter<'a> {
    pub(super) events: &'a EventSink,
    pub(super) logger: &'a Arc<dyn LogSink>,
    pub(super) session: SessionId,
    pub(super) stream: StreamHandle,
    pub(super) ssrc: u32,
}

impl Emitter<'_> {
    pub(super) fn emit(&self, event: SrtpEvent) {
        self.events.dispatch(EventRecord {
            session: self.session,
            stream: self.stream,
            ssrc: self.ssrc,
            event,
        });
    }
}

impl Session {
    /// Creates a session from an ordered policy list, logging nowhere.
    pub fn create(policies: &[StreamPolicy]) -> Result<Self, SrtpError> {
        Self::create_with_logger(policies, Arc::new(NoopLogSink))
    }

    /// Creates a session from an ordered policy list.
    ///
    /// Policies are added in order, so the first offending entry decides the error.
    /// Nothing is kept if any entry fails.
    pub fn create_with_logger(
        policies: &[StreamPolicy],
        logger: Arc<dyn LogSink>,
    ) -> Result<Self, SrtpError> {
        if !lifecycle::is_initialized() {
            return Err(SrtpError::InitializationFailure(
                "library not initialised; call init() first".into(),
            ));
        }

        let mut session = Self {
            id: SessionId::next(),
            slots: Vec::new(),
            free: Vec::new(),
            by_ssrc: HashMap::new(),
            any_inbound: None,
            any_outbound: None,
            events: EventSink::new(Arc::clone(&logger)),
            logger,
            deallocated: false,
        };
        session
            .slots
            .try_reserve(policies.len())
            .map_err(|_| SrtpError::AllocationFailure)?;
        for policy in policies {
            session.add_stream(policy)?;
        }
        sink_info!(
            session.logger,
            "[SRTP] {} created with {} stream(s)",
            session.id,
            session.stream_count()
        );
        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Adds a stream, or installs a wildcard template.
    ///
    /// A session holds at most one `AnyInbound` and one `AnyOutbound` template; a second
    /// one, or an `Undefined` selector, is a `BadParameter`.
    pub fn add_stream(&mut self, policy: &StreamPolicy) -> Result<(), SrtpError> {
        self.ensure_live()?;
        match policy.ssrc {
            SsrcSelector::Specific(ssrc) => {
                if self.by_ssrc.contains_key(&ssrc) {
                    return Err(SrtpError::DuplicateStream(ssrc));
                }
                let ctx = StreamContext::from_policy(policy, ssrc, StreamDirection::Unknown)?;
                self.insert(ctx)?;
                sink_debug!(self.logger, "[SRTP] {} added ssrc {:#010x}", self.id, ssrc);
                Ok(())
            }
            SsrcSelector::AnyInbound => {
                if self.any_inbound.is_some() {
                    return Err(SrtpError::BadParameter(
                        "session already has an any-inbound policy".into(),
                    ));
                }
                let template = StreamContext::from_policy(policy, 0, StreamDirection::Receiver)?;
                self.any_inbound = Some(template);
                Ok(())
            }
            SsrcSelector::AnyOutbound => {
                if self.any_outbound.is_some() {
                    return Err(SrtpError::BadParameter(
                        "session already has an any-outbound policy".into(),
                    ));
                }
                let template = StreamContext::from_policy(policy, 0, StreamDirection::Sender)?;
                self.any_outbound = Some(template);
                Ok(())
            }
            SsrcSelector::Undefined => Err(SrtpError::BadParameter(
                "stream policy has no SSRC selector".into(),
            )),
        }
    }

    /// Removes the stream for one specific SSRC. Wildcard templates cannot be removed.
    pub fn remove_stream(&mut self, ssrc: impl Into<SsrcSelector>) -> Result<(), SrtpError> {
        self.ensure_live()?;
        let ssrc = match ssrc.into() {
            SsrcSelector::Specific(ssrc) => ssrc,
            other if other.is_wildcard() => {
                return Err(SrtpError::BadParameter(format!(
                    "wildcard policy {other:?} cannot be removed"
                )));
            }
            _ => {
                return Err(SrtpError::BadParameter(
                    "stream selector has no SSRC".into(),
                ));
            }
        };
        let slot = self.by_ssrc.remove(&ssrc).ok_or(SrtpError::NotFound(ssrc))?;
        let entry = &mut self.slots[slot as usize];
        entry.stream = None;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(slot);
        sink_info!(self.logger, "[SRTP] {} removed ssrc {:#010x}", self.id, ssrc);
        Ok(())
    }

    /// Drops every stream and template, wiping their keys.
    ///
    /// A second call fails with `DeallocationFailure`; so does every other operation
    /// afterwards.
    pub fn dealloc(&mut self) -> Result<(), SrtpError> {
        self.ensure_live()?;
        self.slots.clear();
        self.free.clear();
        self.by_ssrc.clear();
        self.any_inbound = None;
        self.any_outbound = None;
        self.deallocated = true;
        sink_info!(self.logger, "[SRTP] {} deallocated", self.id);
        Ok(())
    }

    /// Replaces the session's event handler; `None` restores the logging default.
    pub fn install_event_handler(&mut self, handler: Option<EventHandler>) {
        self.events.install(handler);
    }

    pub fn has_event_handler(&self) -> bool {
        self.events.has_handler()
    }

    pub fn stream_count(&self) -> usize {
        self.by_ssrc.len()
    }

    pub fn stream_handle(&self, ssrc: u32) -> Option<StreamHandle> {
        let slot = *self.by_ssrc.get(&ssrc)?;
        Some(StreamHandle {
            slot,
            generation: self.slots[slot as usize].generation,
        })
    }

    pub fn stream(&self, handle: StreamHandle) -> Option<&StreamContext> {
        self.slots
            .get(handle.slot as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.stream.as_ref())
    }

    pub fn has_wildcard(&self, selector: SsrcSelector) -> bool {
        match selector {
            SsrcSelector::AnyInbound => self.any_inbound.is_some(),
            SsrcSelector::AnyOutbound => self.any_outbound.is_some(),
            _ => false,
        }
    }

    /// Octets `protect` will append for `ssrc` (stream or outbound wildcard).
    pub fn protect_trailer_length(&self, ssrc: u32) -> Result<usize, SrtpError> {
        Ok(self.policy_source(ssrc)?.rtp_policy().tag_len())
    }

    /// Octets `protect_rtcp` will append for `ssrc`: index word plus tag.
    pub fn protect_rtcp_trailer_length(&self, ssrc: u32) -> Result<usize, SrtpError> {
        Ok(SRTCP_INDEX_LEN + self.policy_source(ssrc)?.rtcp_policy().tag_len())
    }

    /// Sets the rollover counter of an existing stream, e.g. one learned from signalling.
    pub fn set_stream_roc(&mut self, ssrc: u32, roc: u32) -> Result<(), SrtpError> {
        self.ensure_live()?;
        let handle = self.stream_handle(ssrc).ok_or(SrtpError::NotFound(ssrc))?;
        self.stream_slot_mut(handle)?.set_roc(roc);
        Ok(())
    }

    pub fn stream_roc(&self, ssrc: u32) -> Result<u32, SrtpError> {
        self.stream_handle(ssrc)
            .and_then(|h| self.stream(h))
            .map(StreamContext::roc)
            .ok_or(SrtpError::NotFound(ssrc))
    }

    // ------------------------------------------------------------ internals

    pub(super) fn ensure_live(&self) -> Result<(), SrtpError> {
        if self.deallocated {
            return Err(SrtpError::DeallocationFailure("session already deallocated"));
        }
        Ok(())
    }

    fn policy_source(&self, ssrc: u32) -> Result<&StreamContext, SrtpError> {
        self.stream_handle(ssrc)
            .and_then(|h| self.stream(h))
            .or(self.any_outbound.as_ref())
            .ok_or(SrtpError::NoSuchStream(ssrc))
    }

    /// Finds the stream for `ssrc`, spawning one from the wildcard template that matches
    /// `dir` if needed.
    pub(super) fn resolve(
        &mut self,
        ssrc: u32,
        dir: StreamDirection,
    ) -> Result<StreamHandle, SrtpError> {
        if let Some(handle) = self.stream_handle(ssrc) {
            return Ok(handle);
        }
        let template = match dir {
            StreamDirection::Sender => self.any_outbound.as_ref(),
            StreamDirection::Receiver => self.any_inbound.as_ref(),
            StreamDirection::Unknown => None,
        };
        let Some(template) = template else {
            return Err(SrtpError::NoSuchStream(ssrc));
        };
        let ctx = template.spawn(ssrc);
        let handle = self.insert(ctx)?;
        sink_info!(
            self.logger,
            "[SRTP] {} spawned ssrc {:#010x} from {:?} wildcard",
            self.id,
            ssrc,
            dir
        );
        Ok(handle)
    }

    /// Mutable stream plus an emitter for its events, borrowed side by side.
    pub(super) fn stream_and_emitter(
        &mut self,
        handle: StreamHandle,
    ) -> Result<(&mut StreamContext, Emitter<'_>), SrtpError> {
        let Self {
            id,
            slots,
            events,
            logger,
            ..
        } = self;
        let stream = slots
            .get_mut(handle.slot as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.stream.as_mut())
            .ok_or_else(|| SrtpError::BadParameter(format!("stale stream handle {handle}")))?;
        let emitter = Emitter {
            events,
            logger,
            session: *id,
            stream: handle,
            ssrc: stream.ssrc(),
        };
        Ok((stream, emitter))
    }

    fn stream_slot_mut(&mut self, handle: StreamHandle) -> Result<&mut StreamContext, SrtpError> {
        Ok(self.stream_and_emitter(handle)?.0)
    }

    fn insert(&mut self, ctx: StreamContext) -> Result<StreamHandle, SrtpError> {
        let ssrc = ctx.ssrc();
        self.by_ssrc
            .try_reserve(1)
            .map_err(|_| SrtpError::AllocationFailure)?;

        let handle = match self.free.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot as usize];
                entry.stream = Some(ctx);
                StreamHandle {
                    slot,
                    generation: entry.generation,
                }
            }
            None => {
                self.slots
                    .try_reserve(1)
                    .map_err(|_| SrtpError::AllocationFailure)?;
                let slot = u32::try_from(self.slots.len())
                    .map_err(|_| SrtpError::AllocationFailure)?;
                self.slots.push(Slot {
                    generation: 0,
                    stream: Some(ctx),
                });
                StreamHandle {
                    slot,
                    generation: 0,
                }
            }
        };
        self.by_ssrc.insert(ssrc, handle.slot);
        Ok(handle)
    }
}

impl From<u32> for SsrcSelector {
    fn from(ssrc: u32) -> Self {
        SsrcSelector::Specific(ssrc)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::srtp::{crypto_policy::CryptoPolicy, lifecycle::init};

    fn policy(ssrc: SsrcSelector) -> StreamPolicy {
        StreamPolicy::new(
            ssrc,
            CryptoPolicy::rtp_default(),
            CryptoPolicy::rtcp_default(),
            &[0x42; 30],
        )
    }

    fn session(policies: &[StreamPolicy]) -> Result<Session, SrtpError> {
        init(false).unwrap();
        Session::create(policies)
    }

    #[test]
    fn empty_policy_list_is_allowed() {
        let s = session(&[]).unwrap();
        assert_eq!(s.stream_count(), 0);
    }

    #[test]
    fn both_wildcards_may_coexist() {
        let s = session(&[
            policy(SsrcSelector::AnyInbound),
            policy(SsrcSelector::AnyOutbound),
        ])
        .unwrap();
        assert!(s.has_wildcard(SsrcSelector::AnyInbound));
        assert!(s.has_wildcard(SsrcSelector::AnyOutbound));
    }

    #[test]
    fn second_wildcard_of_same_direction_is_rejected() {
        let err = session(&[
            policy(SsrcSelector::AnyInbound),
            policy(SsrcSelector::AnyInbound),
        ])
        .err()
        .unwrap();
        assert!(matches!(err, SrtpError::BadParameter(_)));
    }

    #[test]
    fn undefined_selector_is_rejected() {
        assert!(matches!(
            session(&[policy(SsrcSelector::Undefined)]).err().unwrap(),
            SrtpError::BadParameter(_)
        ));
    }

    #[test]
    fn duplicate_specific_stream_is_rejected() {
        let mut s = session(&[policy(SsrcSelector::Specific(9))]).unwrap();
        assert_eq!(
            s.add_stream(&policy(SsrcSelector::Specific(9))),
            Err(SrtpError::DuplicateStream(9))
        );
    }

    #[test]
    fn bad_key_fails_creation() {
        let mut p = policy(SsrcSelector::Specific(1));
        p.key.truncate(4);
        assert!(matches!(
            session(&[p]).err().unwrap(),
            SrtpError::InitializationFailure(_)
        ));
    }

    #[test]
    fn remove_stream_rules() {
        let mut s = session(&[
            policy(SsrcSelector::Specific(5)),
            policy(SsrcSelector::AnyInbound),
        ])
        .unwrap();
        assert!(matches!(
            s.remove_stream(SsrcSelector::AnyInbound),
            Err(SrtpError::BadParameter(_))
        ));
        assert!(matches!(
            s.remove_stream(SsrcSelector::Undefined),
            Err(SrtpError::BadParameter(_))
        ));
        assert_eq!(s.remove_stream(6u32), Err(SrtpError::NotFound(6)));
        s.remove_stream(5u32).unwrap();
        assert_eq!(s.stream_count(), 0);
        assert_eq!(s.remove_stream(5u32), Err(SrtpError::NotFound(5)));
    }

    #[test]
    fn stale_handles_do_not_resolve() {
        let mut s = session(&[policy(SsrcSelector::Specific(5))]).unwrap();
        let old = s.stream_handle(5).unwrap();
        s.remove_stream(5u32).unwrap();
        s.add_stream(&policy(SsrcSelector::Specific(6))).unwrap();
        let new = s.stream_handle(6).unwrap();
        assert_eq!(old.slot, new.slot);
        assert!(s.stream(old).is_none());
        assert_eq!(s.stream(new).unwrap().ssrc(), 6);
    }

    #[test]
    fn resolve_spawns_from_matching_wildcard_only() {
        let mut s = session(&[policy(SsrcSelector::AnyOutbound)]).unwrap();
        assert_eq!(
            s.resolve(77, StreamDirection::Receiver),
            Err(SrtpError::NoSuchStream(77))
        );
        let h = s.resolve(77, StreamDirection::Sender).unwrap();
        assert_eq!(s.stream_count(), 1);
        assert_eq!(s.resolve(77, StreamDirection::Sender).unwrap(), h);
        assert_eq!(s.stream(h).unwrap().direction(), StreamDirection::Sender);
    }

    #[test]
    fn dealloc_twice_fails() {
        let mut s = session(&[policy(SsrcSelector::Specific(5))]).unwrap();
        s.dealloc().unwrap();
        assert_eq!(s.stream_count(), 0);
        assert!(matches!(s.dealloc(), Err(SrtpError::DeallocationFailure(_))));
        assert!(matches!(
            s.add_stream(&policy(SsrcSelector::Specific(5))),
            Err(SrtpError::DeallocationFailure(_))
        ));
    }

    #[test]
    fn trailer_lengths_follow_policy() {
        let mut p = policy(SsrcSelector::Specific(3));
        p.rtp = CryptoPolicy::aes_cm_128_hmac_sha1_32();
        let s = session(&[p, policy(SsrcSelector::AnyOutbound)]).unwrap();
        assert_eq!(s.protect_trailer_length(3).unwrap(), 4);
        assert_eq!(s.protect_rtcp_trailer_length(3).unwrap(), 14);
        assert_eq!(s.protect_trailer_length(99).unwrap(), 10);
    }

    #[test]
    fn stream_roc_can_be_set() {
        let mut s = session(&[policy(SsrcSelector::Specific(3))]).unwrap();
        s.set_stream_roc(3, 12).unwrap();
        assert_eq!(s.stream_roc(3).unwrap(), 12);
        assert_eq!(s.set_stream_roc(4, 1), Err(SrtpError::NotFound(4)));
    }
}
