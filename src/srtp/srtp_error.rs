use thiserror::Error;

/// Every failure the SRTP engine reports.
///
/// Per-packet failures ([`is_per_packet`](Self::is_per_packet)) leave the stream usable;
/// `KeyExpired` is terminal for the stream it names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SrtpError {
    #[error("allocation failure")]
    AllocationFailure,
    #[error("initialization failure: {0}")]
    InitializationFailure(String),
    #[error("deallocation failure: {0}")]
    DeallocationFailure(&'static str),
    #[error("bad parameter: {0}")]
    BadParameter(String),
    #[error("buffer too small: need {needed} bytes, capacity {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },
    #[error("stream for ssrc {0:#010x} already exists")]
    DuplicateStream(u32),
    #[error("no stream registered for ssrc {0:#010x}")]
    NotFound(u32),
    #[error("no stream or wildcard policy matches ssrc {0:#010x}")]
    NoSuchStream(u32),
    #[error("malformed packet: {0}")]
    ParseError(&'static str),
    #[error("sequence number {seq} out of range for ssrc {ssrc:#010x}")]
    SequenceOutOfRange { ssrc: u32, seq: u16 },
    #[error("authentication failed for ssrc {0:#010x}")]
    AuthFail(u32),
    #[error("replayed packet index {index} for ssrc {ssrc:#010x} (too old: {too_old})")]
    ReplayFail { ssrc: u32, index: u64, too_old: bool },
    #[error("keys for ssrc {0:#010x} have expired")]
    KeyExpired(u32),
}

impl SrtpError {
    /// True for failures that only affect the packet at hand.
    #[must_use]
    pub fn is_per_packet(&self) -> bool {
        matches!(
            self,
            Self::AuthFail(_)
                | Self::ReplayFail { .. }
                | Self::SequenceOutOfRange { .. }
                | Self::ParseError(_)
                | Self::BufferTooSmall { .. }
        )
    }
}
