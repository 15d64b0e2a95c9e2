use zeroize::Zeroizing;

use crate::srtp::{
    crypto_policy::{CryptoPolicy, PacketKind},
    key_limit::KeyLimit,
    srtp_error::SrtpError,
    srtp_profile::SrtpProfile,
    srtp_settings::SrtpSettings,
    ssrc_selector::SsrcSelector,
};

/// Everything needed to key one stream (or one wildcard template).
///
/// `key` holds the master key immediately followed by the 14-octet master salt.
#[derive(Clone)]
pub struct StreamPolicy {
    pub ssrc: SsrcSelector,
    pub rtp: CryptoPolicy,
    pub rtcp: CryptoPolicy,
    pub key: Zeroizing<Vec<u8>>,
    pub key_limit: KeyLimit,
    /// Let `protect` reuse an index that was already sent (retransmissions).
    pub allow_repeat_tx: bool,
}

impl std::fmt::Debug for StreamPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamPolicy")
            .field("ssrc", &self.ssrc)
            .field("rtp", &self.rtp)
            .field("rtcp", &self.rtcp)
            .field("key_limit", &self.key_limit)
            .field("allow_repeat_tx", &self.allow_repeat_tx)
            .finish_non_exhaustive()
    }
}

impl StreamPolicy {
    pub fn new(ssrc: SsrcSelector, rtp: CryptoPolicy, rtcp: CryptoPolicy, key: &[u8]) -> Self {
        Self {
            ssrc,
            rtp,
            rtcp,
            key: Zeroizing::new(key.to_vec()),
            key_limit: KeyLimit::default(),
            allow_repeat_tx: false,
        }
    }

    /// Policy pair for a negotiated DTLS-SRTP profile.
    pub fn from_profile(
        ssrc: SsrcSelector,
        profile: SrtpProfile,
        key: &[u8],
    ) -> Result<Self, SrtpError> {
        Ok(Self::new(
            ssrc,
            CryptoPolicy::from_profile(profile, PacketKind::Rtp)?,
            CryptoPolicy::from_profile(profile, PacketKind::Rtcp)?,
            key,
        ))
    }

    /// Policy built from `[srtp]` configuration settings.
    pub fn from_settings(
        ssrc: SsrcSelector,
        settings: &SrtpSettings,
        key: &[u8],
    ) -> Result<Self, SrtpError> {
        Ok(Self::from_profile(ssrc, settings.profile, key)?
            .with_key_limit(settings.key_limit)
            .with_allow_repeat_tx(settings.allow_repeat_tx))
    }

    pub fn with_key_limit(mut self, key_limit: KeyLimit) -> Self {
        self.key_limit = key_limit;
        self
    }

    pub fn with_allow_repeat_tx(mut self, allow: bool) -> Self {
        self.allow_repeat_tx = allow;
        self
    }
}
