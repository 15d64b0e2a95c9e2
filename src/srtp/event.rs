use crate::srtp::handles::{SessionId, StreamHandle};

/// Protocol events raised while protecting or unprotecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SrtpEvent {
    /// A stream was used both to send and to receive.
    SsrcCollision,
    /// The master key is nearing its packet budget; rekey soon.
    KeySoftLimit,
    /// The master key has used up its packet budget; the stream is now expired.
    KeyHardLimit,
    /// The stream's packet index space is exhausted; the stream is now expired.
    PacketIndexLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord {
    pub session: SessionId,
    pub stream: StreamHandle,
    pub ssrc: u32,
    pub event: SrtpEvent,
}
