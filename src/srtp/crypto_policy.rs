use crate::srtp::{
    constants::{
        AES_128_KEY_LEN, AES_256_KEY_LEN, HMAC_SHA1_32_TAG_LEN, HMAC_SHA1_80_TAG_LEN,
        HMAC_SHA1_KEY_LEN, MAX_KEY_LEN, MAX_TAG_LEN,
    },
    sec_serv::SecurityServices,
    srtp_error::SrtpError,
    srtp_profile::SrtpProfile,
};

/// Keystream generator applied to the packet payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherType {
    Null,
    AesCm128,
    AesCm256,
}

impl CipherType {
    /// Session encryption key length the cipher expects.
    pub fn key_len(self) -> usize {
        match self {
            Self::Null => 0,
            Self::AesCm128 => AES_128_KEY_LEN,
            Self::AesCm256 => AES_256_KEY_LEN,
        }
    }
}

/// Message authentication function producing the SRTP tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthType {
    Null,
    HmacSha1,
}

/// Which half of a stream a policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    Rtp,
    Rtcp,
}

/// Cipher and authentication parameters for one direction (RTP or RTCP) of a stream.
///
/// `cipher_key_len` counts only the encryption key; the 14-octet salt is implied by
/// every AES-CM transform and is carried separately in the master key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CryptoPolicy {
    pub cipher_type: CipherType,
    pub cipher_key_len: usize,
    pub auth_type: AuthType,
    pub auth_key_len: usize,
    pub auth_tag_len: usize,
    pub sec_serv: SecurityServices,
}

impl Default for CryptoPolicy {
    fn default() -> Self {
        Self::rtp_default()
    }
}

impl CryptoPolicy {
    /// AES-128 counter mode with HMAC-SHA1 truncated to 80 bits.
    pub const fn rtp_default() -> Self {
        Self {
            cipher_type: CipherType::AesCm128,
            cipher_key_len: AES_128_KEY_LEN,
            auth_type: AuthType::HmacSha1,
            auth_key_len: HMAC_SHA1_KEY_LEN,
            auth_tag_len: HMAC_SHA1_80_TAG_LEN,
            sec_serv: SecurityServices::ConfidentialityAndAuthentication,
        }
    }

    /// SRTCP uses the same transform as the RTP default.
    pub const fn rtcp_default() -> Self {
        Self::rtp_default()
    }

    pub const fn aes_cm_128_hmac_sha1_80() -> Self {
        Self::rtp_default()
    }

    /// 32-bit tag variant. Only suitable for RTP; RTCP keeps the 80-bit tag.
    pub const fn aes_cm_128_hmac_sha1_32() -> Self {
        Self {
            auth_tag_len: HMAC_SHA1_32_TAG_LEN,
            ..Self::rtp_default()
        }
    }

    /// Encryption without authentication. Offers no integrity and no replay protection
    /// beyond the index estimate; use only where the transport already authenticates.
    pub const fn aes_cm_128_null_auth() -> Self {
        Self {
            auth_type: AuthType::Null,
            auth_key_len: 0,
            auth_tag_len: 0,
            sec_serv: SecurityServices::Confidentiality,
            ..Self::rtp_default()
        }
    }

    /// Authentication without encryption.
    pub const fn null_cipher_hmac_sha1_80() -> Self {
        Self {
            cipher_type: CipherType::Null,
            cipher_key_len: 0,
            sec_serv: SecurityServices::Authentication,
            ..Self::rtp_default()
        }
    }

    pub const fn null_cipher_hmac_sha1_32() -> Self {
        Self {
            auth_tag_len: HMAC_SHA1_32_TAG_LEN,
            ..Self::null_cipher_hmac_sha1_80()
        }
    }

    pub const fn aes_cm_256_hmac_sha1_80() -> Self {
        Self {
            cipher_type: CipherType::AesCm256,
            cipher_key_len: AES_256_KEY_LEN,
            ..Self::rtp_default()
        }
    }

    pub const fn aes_cm_256_hmac_sha1_32() -> Self {
        Self {
            auth_tag_len: HMAC_SHA1_32_TAG_LEN,
            ..Self::aes_cm_256_hmac_sha1_80()
        }
    }

    /// Maps a DTLS-SRTP protection profile to the policy for `kind`.
    ///
    /// The `_32` profiles only shorten the RTP tag; SRTCP keeps 80 bits.
    pub fn from_profile(profile: SrtpProfile, kind: PacketKind) -> Result<Self, SrtpError> {
        use SrtpProfile::*;
        let policy = match (profile, kind) {
            (Reserved, _) => {
                return Err(SrtpError::BadParameter(
                    "reserved SRTP profile has no policy".into(),
                ));
            }
            (Aes128CmSha1_80, _) | (Aes128CmSha1_32, PacketKind::Rtcp) => Self::rtp_default(),
            (Aes128CmSha1_32, PacketKind::Rtp) => Self::aes_cm_128_hmac_sha1_32(),
            (Aes256CmSha1_80, _) | (Aes256CmSha1_32, PacketKind::Rtcp) => {
                Self::aes_cm_256_hmac_sha1_80()
            }
            (Aes256CmSha1_32, PacketKind::Rtp) => Self::aes_cm_256_hmac_sha1_32(),
            (NullSha1_80, _) | (NullSha1_32, PacketKind::Rtcp) => {
                Self::null_cipher_hmac_sha1_80()
            }
            (NullSha1_32, PacketKind::Rtp) => Self::null_cipher_hmac_sha1_32(),
        };
        Ok(policy)
    }

    /// Length of the master key (without salt) that keys this policy's derivation.
    ///
    /// Null-cipher policies still derive their auth key with AES-128.
    pub fn master_key_len(&self) -> usize {
        match self.cipher_type {
            CipherType::AesCm256 => AES_256_KEY_LEN,
            CipherType::AesCm128 | CipherType::Null => AES_128_KEY_LEN,
        }
    }

    /// Octets this policy appends to a protected RTP packet.
    pub fn tag_len(&self) -> usize {
        if self.sec_serv.auth() { self.auth_tag_len } else { 0 }
    }

    /// Checks size bounds and that the algorithm choice is self-consistent.
    ///
    /// Bounds violations are `BadParameter`; an unusable algorithm selection is
    /// `InitializationFailure`.
    pub fn validate(&self) -> Result<(), SrtpError> {
        if self.auth_tag_len > MAX_TAG_LEN {
            return Err(SrtpError::BadParameter(format!(
                "auth tag length {} exceeds {MAX_TAG_LEN}",
                self.auth_tag_len
            )));
        }
        if self.cipher_key_len > MAX_KEY_LEN || self.auth_key_len > MAX_KEY_LEN {
            return Err(SrtpError::BadParameter(format!(
                "key length exceeds {MAX_KEY_LEN}"
            )));
        }
        if self.cipher_key_len != self.cipher_type.key_len() {
            return Err(SrtpError::InitializationFailure(format!(
                "{:?} needs a {}-octet key, policy says {}",
                self.cipher_type,
                self.cipher_type.key_len(),
                self.cipher_key_len
            )));
        }
        if self.sec_serv.conf() && self.cipher_type == CipherType::Null {
            return Err(SrtpError::InitializationFailure(
                "confidentiality requested with the null cipher".into(),
            ));
        }
        if self.sec_serv.auth() {
            if self.auth_type == AuthType::Null || self.auth_tag_len == 0 {
                return Err(SrtpError::InitializationFailure(
                    "authentication requested without an auth transform".into(),
                ));
            }
            if self.auth_type == AuthType::HmacSha1 && self.auth_tag_len > 20 {
                return Err(SrtpError::InitializationFailure(
                    "HMAC-SHA1 tag longer than the digest".into(),
                ));
            }
            if self.auth_key_len == 0 {
                return Err(SrtpError::InitializationFailure(
                    "authentication requested with an empty auth key".into(),
                ));
            }
        }
        Ok(())
    }
}
