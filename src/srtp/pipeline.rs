//! The four packet transforms, implemented on [`Session`].
//!
//! Every transform works in place on `buf[..len]`. Protecting appends the trailer
//! after `len` and needs `buf` to have room for it; unprotecting strips the trailer.
//! Each returns the new packet length.
//!
//! On any error the bytes of `buf` are unspecified, but stream state is only ever
//! committed once a packet has fully passed.

use byteorder::{BigEndian, ByteOrder};

use crate::srtp::{
    constants::{
        MAX_TAG_LEN, MAX_TRAILER_LEN, RTCP_HEADER_LEN, RTP_VERSION,
        SRTCP_E_BIT, SRTCP_INDEX_LEN, SRTCP_INDEX_MASK,
    },
    event::SrtpEvent,
    key_limit::KeyLimitEvent,
    session::{Emitter, Session},
    srtp_error::SrtpError,
    stream_context::{StreamContext, StreamDirection},
    utils::{constant_time_eq, get_rtp_header_len},
};
use crate::{sink_trace, sink_warn};

impl Session {
    /// Turns an RTP packet into SRTP.
    pub fn protect(&mut self, buf: &mut [u8], len: usize) -> Result<usize, SrtpError> {
        self.ensure_live()?;
        let packet = packet_slice(buf, len)?;
        let hdr_len = get_rtp_header_len(packet)?;
        check_version(packet)?;
        let seq = BigEndian::read_u16(&packet[2..4]);
        let ssrc = BigEndian::read_u32(&packet[8..12]);

        let handle = self.resolve(ssrc, StreamDirection::Sender)?;
        let (stream, emit) = self.stream_and_emitter(handle)?;
        admit(stream, &emit, StreamDirection::Sender)?;

        let est = stream.estimate_rtp(seq)?;
        if !stream.allow_repeat_tx() {
            stream.check_rtp_replay(est.index)?;
        }

        let tag_len = stream.rtp_policy().tag_len();
        let total = len + tag_len;
        ensure_capacity(buf, total)?;

        stream.crypt_rtp(est.index, &mut buf[hdr_len..len])?;
        if tag_len > 0 {
            let (body, trailer) = buf.split_at_mut(len);
            stream.rtp_tag(body, est.roc(), &mut trailer[..tag_len])?;
        }

        stream.commit_rtp(est);
        charge(stream, &emit, StreamContext::is_last_rtp_index(est));
        sink_trace!(
            emit.logger,
            "[SRTP] protect ssrc={:#010x} seq={} roc={} len={}",
            ssrc,
            seq,
            est.roc(),
            total
        );
        Ok(total)
    }

    /// Verifies and decrypts an SRTP packet back into RTP.
    pub fn unprotect(&mut self, buf: &mut [u8], len: usize) -> Result<usize, SrtpError> {
        self.ensure_live()?;
        let packet = packet_slice(buf, len)?;
        let hdr_len = get_rtp_header_len(packet)?;
        check_version(packet)?;
        let seq = BigEndian::read_u16(&packet[2..4]);
        let ssrc = BigEndian::read_u32(&packet[8..12]);

        let handle = self.resolve(ssrc, StreamDirection::Receiver)?;
        let (stream, emit) = self.stream_and_emitter(handle)?;
        admit(stream, &emit, StreamDirection::Receiver)?;

        let est = stream.estimate_rtp(seq)?;
        stream.check_rtp_replay(est.index).inspect_err(|e| {
            sink_warn!(emit.logger, "[SRTP] dropped ssrc={:#010x} seq={}: {}", ssrc, seq, e);
        })?;

        let tag_len = stream.rtp_policy().tag_len();
        if len < hdr_len + tag_len {
            return Err(SrtpError::ParseError("SRTP packet shorter than header plus tag"));
        }
        let body_len = len - tag_len;
        if tag_len > 0 {
            let mut expected = [0u8; MAX_TAG_LEN];
            stream.rtp_tag(&buf[..body_len], est.roc(), &mut expected[..tag_len])?;
            if !constant_time_eq(&expected[..tag_len], &buf[body_len..len]) {
                sink_warn!(emit.logger, "[SRTP] auth tag mismatch ssrc={:#010x} seq={}", ssrc, seq);
                return Err(SrtpError::AuthFail(ssrc));
            }
        }
        stream.crypt_rtp(est.index, &mut buf[hdr_len..body_len])?;

        stream.commit_rtp(est);
        charge(stream, &emit, StreamContext::is_last_rtp_index(est));
        sink_trace!(
            emit.logger,
            "[SRTP] unprotect ssrc={:#010x} seq={} roc={} len={}",
            ssrc,
            seq,
            est.roc(),
            body_len
        );
        Ok(body_len)
    }

    /// Turns an RTCP compound packet into SRTCP, appending the E/index word and tag.
    pub fn protect_rtcp(&mut self, buf: &mut [u8], len: usize) -> Result<usize, SrtpError> {
        self.ensure_live()?;
        let packet = packet_slice(buf, len)?;
        if packet.len() < RTCP_HEADER_LEN {
            return Err(SrtpError::ParseError("shorter than RTCP header"));
        }
        check_version(packet)?;
        let ssrc = BigEndian::read_u32(&packet[4..8]);

        let handle = self.resolve(ssrc, StreamDirection::Sender)?;
        let (stream, emit) = self.stream_and_emitter(handle)?;
        admit(stream, &emit, StreamDirection::Sender)?;

        let index = stream.next_rtcp_index().ok_or(SrtpError::KeyExpired(ssrc))?;
        let tag_len = stream.rtcp_policy().tag_len();
        let authed_len = len + SRTCP_INDEX_LEN;
        let total = authed_len + tag_len;
        ensure_capacity(buf, total)?;

        let encrypt = stream.rtcp_policy().sec_serv.conf();
        if encrypt {
            stream.crypt_rtcp(index, &mut buf[RTCP_HEADER_LEN..len])?;
        }
        let word = if encrypt { SRTCP_E_BIT | index } else { index };
        BigEndian::write_u32(&mut buf[len..authed_len], word);
        if tag_len > 0 {
            let (authed, trailer) = buf.split_at_mut(authed_len);
            stream.rtcp_tag(authed, &mut trailer[..tag_len])?;
        }

        stream.commit_rtcp_tx(index);
        charge(stream, &emit, index == SRTCP_INDEX_MASK);
        sink_trace!(emit.logger, "[SRTCP] protect ssrc={:#010x} index={} len={}", ssrc, index, total);
        Ok(total)
    }

    /// Verifies and decrypts an SRTCP packet, stripping its trailer.
    pub fn unprotect_rtcp(&mut self, buf: &mut [u8], len: usize) -> Result<usize, SrtpError> {
        self.ensure_live()?;
        let packet = packet_slice(buf, len)?;
        if packet.len() < RTCP_HEADER_LEN {
            return Err(SrtpError::ParseError("shorter than RTCP header"));
        }
        check_version(packet)?;
        let ssrc = BigEndian::read_u32(&packet[4..8]);

        let handle = self.resolve(ssrc, StreamDirection::Receiver)?;
        let (stream, emit) = self.stream_and_emitter(handle)?;
        admit(stream, &emit, StreamDirection::Receiver)?;

        let tag_len = stream.rtcp_policy().tag_len();
        if len < RTCP_HEADER_LEN + SRTCP_INDEX_LEN + tag_len {
            return Err(SrtpError::ParseError("SRTCP packet shorter than header plus trailer"));
        }
        let authed_len = len - tag_len;
        let body_len = authed_len - SRTCP_INDEX_LEN;
        let word = BigEndian::read_u32(&buf[body_len..authed_len]);
        let encrypted = word & SRTCP_E_BIT != 0;
        let index = word & SRTCP_INDEX_MASK;

        stream.check_rtcp_replay(index).inspect_err(|e| {
            sink_warn!(emit.logger, "[SRTCP] dropped ssrc={:#010x}: {}", ssrc, e);
        })?;

        if tag_len > 0 {
            let mut expected = [0u8; MAX_TAG_LEN];
            stream.rtcp_tag(&buf[..authed_len], &mut expected[..tag_len])?;
            if !constant_time_eq(&expected[..tag_len], &buf[authed_len..len]) {
                sink_warn!(emit.logger, "[SRTCP] auth tag mismatch ssrc={:#010x} index={}", ssrc, index);
                return Err(SrtpError::AuthFail(ssrc));
            }
        }
        if encrypted {
            if !stream.rtcp_policy().sec_serv.conf() {
                return Err(SrtpError::ParseError("encrypted SRTCP on a stream without confidentiality"));
            }
            stream.crypt_rtcp(index, &mut buf[RTCP_HEADER_LEN..body_len])?;
        }

        stream.commit_rtcp_rx(index);
        charge(stream, &emit, index == SRTCP_INDEX_MASK);
        sink_trace!(emit.logger, "[SRTCP] unprotect ssrc={:#010x} index={} len={}", ssrc, index, body_len);
        Ok(body_len)
    }

    /// [`protect`](Self::protect) on a growable buffer.
    pub fn protect_vec(&mut self, packet: &mut Vec<u8>) -> Result<(), SrtpError> {
        with_trailer_room(packet, |buf, len| self.protect(buf, len))
    }

    pub fn unprotect_vec(&mut self, packet: &mut Vec<u8>) -> Result<(), SrtpError> {
        let len = packet.len();
        let new_len = self.unprotect(packet, len)?;
        packet.truncate(new_len);
        Ok(())
    }

    /// [`protect_rtcp`](Self::protect_rtcp) on a growable buffer.
    pub fn protect_rtcp_vec(&mut self, packet: &mut Vec<u8>) -> Result<(), SrtpError> {
        with_trailer_room(packet, |buf, len| self.protect_rtcp(buf, len))
    }

    pub fn unprotect_rtcp_vec(&mut self, packet: &mut Vec<u8>) -> Result<(), SrtpError> {
        let len = packet.len();
        let new_len = self.unprotect_rtcp(packet, len)?;
        packet.truncate(new_len);
        Ok(())
    }
}

fn packet_slice(buf: &[u8], len: usize) -> Result<&[u8], SrtpError> {
    buf.get(..len).ok_or_else(|| {
        SrtpError::BadParameter(format!(
            "packet length {len} exceeds buffer of {} bytes",
            buf.len()
        ))
    })
}

fn check_version(packet: &[u8]) -> Result<(), SrtpError> {
    if packet[0] >> 6 != RTP_VERSION {
        return Err(SrtpError::ParseError("not an RTP version 2 packet"));
    }
    Ok(())
}

fn ensure_capacity(buf: &[u8], needed: usize) -> Result<(), SrtpError> {
    if buf.len() < needed {
        return Err(SrtpError::BufferTooSmall {
            needed,
            capacity: buf.len(),
        });
    }
    Ok(())
}

/// Direction bookkeeping and the expiry gate shared by all four transforms.
fn admit(
    stream: &mut StreamContext,
    emit: &Emitter<'_>,
    dir: StreamDirection,
) -> Result<(), SrtpError> {
    if stream.note_direction(dir) {
        emit.emit(SrtpEvent::SsrcCollision);
    }
    if stream.is_expired() {
        return Err(SrtpError::KeyExpired(stream.ssrc()));
    }
    Ok(())
}

/// Charges one packet to the master key and raises whatever limits it crossed.
fn charge(stream: &mut StreamContext, emit: &Emitter<'_>, index_exhausted: bool) {
    match stream.record_key_use() {
        KeyLimitEvent::Normal => {}
        KeyLimitEvent::SoftLimit => emit.emit(SrtpEvent::KeySoftLimit),
        KeyLimitEvent::HardLimit => {
            stream.expire();
            emit.emit(SrtpEvent::KeyHardLimit);
        }
    }
    if index_exhausted {
        stream.expire();
        emit.emit(SrtpEvent::PacketIndexLimit);
    }
}

fn with_trailer_room(
    packet: &mut Vec<u8>,
    op: impl FnOnce(&mut [u8], usize) -> Result<usize, SrtpError>,
) -> Result<(), SrtpError> {
    let len = packet.len();
    packet
        .try_reserve(MAX_TRAILER_LEN)
        .map_err(|_| SrtpError::AllocationFailure)?;
    packet.resize(len + MAX_TRAILER_LEN, 0);
    match op(packet.as_mut_slice(), len) {
        Ok(new_len) => {
            packet.truncate(new_len);
            Ok(())
        }
        Err(e) => {
            packet.truncate(len);
            Err(e)
        }
    }
}
