use std::sync::Arc;

use crate::srtp::{
    constants::{MAX_RTP_INDEX, SRTCP_INDEX_MASK},
    crypto_policy::{CryptoPolicy, PacketKind},
    key_limit::{KeyLimitEvent, KeyUsage},
    key_material::KeyMaterial,
    replay_window::{ReplayCheck, ReplayWindow},
    rollover_counter::{IndexEstimate, RolloverCounter},
    session_keys::SessionKeys,
    srtp_error::SrtpError,
    stream_policy::StreamPolicy,
    utils::{apply_keystream, compute_iv, compute_tag},
};

/// Which way a stream has carried traffic so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamDirection {
    Unknown,
    Sender,
    Receiver,
}

/// Per-SSRC cryptographic and sequencing state.
///
/// Owns the master key and both sets of derived session keys (wiped on drop), the RTP
/// rollover state and replay window, the SRTCP index and replay window, and a handle on
/// the key-usage counter it shares with every stream keyed from the same master key.
#[derive(Debug)]
pub struct StreamContext {
    ssrc: u32,
    direction: StreamDirection,
    rtp_policy: CryptoPolicy,
    rtcp_policy: CryptoPolicy,
    master: KeyMaterial,
    rtp_keys: SessionKeys,
    rtcp_keys: SessionKeys,
    rollover: RolloverCounter,
    rtp_window: ReplayWindow,
    rtcp_index: u32,
    rtcp_window: ReplayWindow,
    key_usage: Arc<KeyUsage>,
    allow_repeat_tx: bool,
    expired: bool,
    rtp_packets: u64,
    rtcp_packets: u64,
}

impl StreamContext {
    /// Validates `policy` and derives the session keys for both directions.
    pub(crate) fn from_policy(
        policy: &StreamPolicy,
        ssrc: u32,
        direction: StreamDirection,
    ) -> Result<Self, SrtpError> {
        policy.rtp.validate()?;
        policy.rtcp.validate()?;

        let key_len = policy.rtp.master_key_len();
        if policy.rtcp.master_key_len() != key_len {
            return Err(SrtpError::InitializationFailure(
                "RTP and RTCP policies need different master key sizes".into(),
            ));
        }
        let master = KeyMaterial::from_concatenated(&policy.key, key_len)?;
        let rtp_keys = master.derive(&policy.rtp, PacketKind::Rtp)?;
        let rtcp_keys = master.derive(&policy.rtcp, PacketKind::Rtcp)?;

        Ok(Self {
            ssrc,
            direction,
            rtp_policy: policy.rtp,
            rtcp_policy: policy.rtcp,
            master,
            rtp_keys,
            rtcp_keys,
            rollover: RolloverCounter::default(),
            rtp_window: ReplayWindow::new(),
            rtcp_index: 0,
            rtcp_window: ReplayWindow::new(),
            key_usage: Arc::new(KeyUsage::new(policy.key_limit)),
            allow_repeat_tx: policy.allow_repeat_tx,
            expired: false,
            rtp_packets: 0,
            rtcp_packets: 0,
        })
    }

    /// New stream for `ssrc` keyed like this one (used for wildcard templates).
    ///
    /// Sequencing state starts fresh; the key-usage counter stays shared because the
    /// master key is the same.
    pub(crate) fn spawn(&self, ssrc: u32) -> Self {
        Self {
            ssrc,
            direction: self.direction,
            rtp_policy: self.rtp_policy,
            rtcp_policy: self.rtcp_policy,
            master: self.master.clone(),
            rtp_keys: self.rtp_keys.clone(),
            rtcp_keys: self.rtcp_keys.clone(),
            rollover: RolloverCounter::default(),
            rtp_window: ReplayWindow::new(),
            rtcp_index: 0,
            rtcp_window: ReplayWindow::new(),
            key_usage: Arc::clone(&self.key_usage),
            allow_repeat_tx: self.allow_repeat_tx,
            expired: self.expired,
            rtp_packets: 0,
            rtcp_packets: 0,
        }
    }

    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    pub fn direction(&self) -> StreamDirection {
        self.direction
    }

    pub fn rtp_policy(&self) -> &CryptoPolicy {
        &self.rtp_policy
    }

    pub fn rtcp_policy(&self) -> &CryptoPolicy {
        &self.rtcp_policy
    }

    /// Current RTP rollover counter.
    pub fn roc(&self) -> u32 {
        self.rollover.roc()
    }

    /// Highest RTP packet index accepted so far.
    pub fn highest_index(&self) -> Option<u64> {
        self.rollover.highest_index()
    }

    /// Last SRTCP index sent by this stream.
    pub fn rtcp_index(&self) -> u32 {
        self.rtcp_index
    }

    /// Highest SRTCP index accepted from the peer.
    pub fn highest_rtcp_index(&self) -> Option<u32> {
        self.rtcp_window.top().map(|i| i as u32)
    }

    pub fn rtp_packets(&self) -> u64 {
        self.rtp_packets
    }

    pub fn rtcp_packets(&self) -> u64 {
        self.rtcp_packets
    }

    /// Packets charged against the master key, across all streams sharing it.
    pub fn key_usage(&self) -> u64 {
        self.key_usage.used()
    }

    pub fn is_expired(&self) -> bool {
        self.expired || self.key_usage.is_exhausted()
    }

    pub(crate) fn allow_repeat_tx(&self) -> bool {
        self.allow_repeat_tx
    }

    pub(crate) fn expire(&mut self) {
        self.expired = true;
    }

    pub(crate) fn set_roc(&mut self, roc: u32) {
        self.rollover.set_roc(roc);
        self.rtp_window = ReplayWindow::new();
    }

    /// Records the direction of use. Returns true if it contradicts an earlier use.
    pub(crate) fn note_direction(&mut self, dir: StreamDirection) -> bool {
        match self.direction {
            StreamDirection::Unknown => {
                self.direction = dir;
                false
            }
            current => current != dir,
        }
    }

    pub(crate) fn record_key_use(&self) -> KeyLimitEvent {
        self.key_usage.record()
    }

    // ---------------------------------------------------------------- RTP

    pub(crate) fn estimate_rtp(&self, seq: u16) -> Result<IndexEstimate, SrtpError> {
        self.rollover
            .estimate(seq)
            .ok_or(SrtpError::SequenceOutOfRange {
                ssrc: self.ssrc,
                seq,
            })
    }

    pub(crate) fn check_rtp_replay(&self, index: u64) -> Result<(), SrtpError> {
        replay_result(self.ssrc, index, self.rtp_window.check(index))
    }

    /// Encrypts or decrypts an RTP payload in place.
    pub(crate) fn crypt_rtp(&self, index: u64, payload: &mut [u8]) -> Result<(), SrtpError> {
        if !self.rtp_policy.sec_serv.conf() {
            return Ok(());
        }
        let iv = compute_iv(&self.rtp_keys.salt, self.ssrc, index);
        apply_keystream(self.rtp_policy.cipher_type, &self.rtp_keys.enc_key, &iv, payload)
    }

    /// Tag over `packet || ROC`.
    pub(crate) fn rtp_tag(&self, packet: &[u8], roc: u32, out: &mut [u8]) -> Result<(), SrtpError> {
        compute_tag(
            self.rtp_policy.auth_type,
            &self.rtp_keys.auth_key,
            &[packet, &roc.to_be_bytes()],
            out,
        )
    }

    pub(crate) fn commit_rtp(&mut self, est: IndexEstimate) {
        self.rtp_window.update(est.index);
        self.rollover.update(est.index);
        self.rtp_packets += 1;
    }

    pub(crate) fn is_last_rtp_index(est: IndexEstimate) -> bool {
        est.index >= MAX_RTP_INDEX
    }

    // ---------------------------------------------------------------- RTCP

    /// Index for the next outgoing SRTCP packet, `None` once the 31-bit space is used.
    pub(crate) fn next_rtcp_index(&self) -> Option<u32> {
        self.rtcp_index
            .checked_add(1)
            .filter(|i| *i <= SRTCP_INDEX_MASK)
    }

    pub(crate) fn check_rtcp_replay(&self, index: u32) -> Result<(), SrtpError> {
        let index = u64::from(index);
        replay_result(self.ssrc, index, self.rtcp_window.check(index))
    }

    pub(crate) fn crypt_rtcp(&self, index: u32, payload: &mut [u8]) -> Result<(), SrtpError> {
        let iv = compute_iv(&self.rtcp_keys.salt, self.ssrc, u64::from(index));
        apply_keystream(self.rtcp_policy.cipher_type, &self.rtcp_keys.enc_key, &iv, payload)
    }

    /// Tag over the packet including its E/index trailer word.
    pub(crate) fn rtcp_tag(&self, authed: &[u8], out: &mut [u8]) -> Result<(), SrtpError> {
        compute_tag(
            self.rtcp_policy.auth_type,
            &self.rtcp_keys.auth_key,
            &[authed],
            out,
        )
    }

    pub(crate) fn commit_rtcp_tx(&mut self, index: u32) {
        self.rtcp_index = index;
        self.rtcp_packets += 1;
    }

    pub(crate) fn commit_rtcp_rx(&mut self, index: u32) {
        self.rtcp_window.update(u64::from(index));
        self.rtcp_packets += 1;
    }
}

fn replay_result(ssrc: u32, index: u64, check: ReplayCheck) -> Result<(), SrtpError> {
    match check {
        ReplayCheck::Accept => Ok(()),
        ReplayCheck::TooOld => Err(SrtpError::ReplayFail {
            ssrc,
            index,
            too_old: true,
        }),
        ReplayCheck::Duplicate => Err(SrtpError::ReplayFail {
            ssrc,
            index,
            too_old: false,
        }),
    }
}
