use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::srtp::{
    constants::{
        SALT_LEN, SRTCP_LABEL_AUTH, SRTCP_LABEL_ENCRYPTION, SRTCP_LABEL_SALT, SRTP_LABEL_AUTH,
        SRTP_LABEL_ENCRYPTION, SRTP_LABEL_SALT,
    },
    crypto_policy::{CryptoPolicy, PacketKind},
    session_keys::SessionKeys,
    srtp_error::SrtpError,
    srtp_profile::SrtpProfile,
    utils::aes_cm_prf,
};

/// A stream's master key and master salt. Wiped when dropped and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    key: Vec<u8>,
    salt: [u8; SALT_LEN],
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key_len", &self.key.len())
            .finish_non_exhaustive()
    }
}

impl KeyMaterial {
    pub fn new(master_key: &[u8], master_salt: &[u8]) -> Result<Self, SrtpError> {
        if master_salt.len() != SALT_LEN {
            return Err(SrtpError::InitializationFailure(format!(
                "master salt must be {SALT_LEN} octets, got {}",
                master_salt.len()
            )));
        }
        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(master_salt);
        Ok(Self {
            key: master_key.to_vec(),
            salt,
        })
    }

    /// Splits `key || salt` as carried in a stream policy.
    ///
    /// Extra trailing octets are ignored; a short buffer is an `InitializationFailure`.
    pub fn from_concatenated(bytes: &[u8], key_len: usize) -> Result<Self, SrtpError> {
        let needed = key_len + SALT_LEN;
        if bytes.len() < needed {
            return Err(SrtpError::InitializationFailure(format!(
                "master key material needs {needed} octets, got {}",
                bytes.len()
            )));
        }
        Self::new(&bytes[..key_len], &bytes[key_len..needed])
    }

    /// Fresh random key and salt sized for `profile`.
    pub fn generate(profile: SrtpProfile) -> Result<Self, SrtpError> {
        let key_len = profile.master_key_length();
        if key_len == 0 {
            return Err(SrtpError::BadParameter(
                "cannot generate keys for the reserved profile".into(),
            ));
        }
        let mut rng = rand::thread_rng();
        let mut key = vec![0u8; key_len];
        let mut salt = [0u8; SALT_LEN];
        rng.fill_bytes(&mut key);
        rng.fill_bytes(&mut salt);
        Ok(Self { key, salt })
    }

    pub fn key_len(&self) -> usize {
        self.key.len()
    }

    /// `key || salt`, the layout `StreamPolicy` expects.
    pub fn to_concatenated(&self) -> zeroize::Zeroizing<Vec<u8>> {
        let mut out = zeroize::Zeroizing::new(vec![0u8; self.key.len() + SALT_LEN]);
        out[..self.key.len()].copy_from_slice(&self.key);
        out[self.key.len()..].copy_from_slice(&self.salt);
        out
    }

    /// Derives the session keys `policy` needs for `kind` traffic.
    pub fn derive(&self, policy: &CryptoPolicy, kind: PacketKind) -> Result<SessionKeys, SrtpError> {
        let (enc_label, auth_label, salt_label) = match kind {
            PacketKind::Rtp => (SRTP_LABEL_ENCRYPTION, SRTP_LABEL_AUTH, SRTP_LABEL_SALT),
            PacketKind::Rtcp => (SRTCP_LABEL_ENCRYPTION, SRTCP_LABEL_AUTH, SRTCP_LABEL_SALT),
        };
        if self.key.len() != policy.master_key_len() {
            return Err(SrtpError::InitializationFailure(format!(
                "{:?} policy needs a {}-octet master key, got {}",
                policy.cipher_type,
                policy.master_key_len(),
                self.key.len()
            )));
        }

        let mut keys = SessionKeys {
            enc_key: vec![0u8; policy.cipher_key_len],
            auth_key: vec![0u8; policy.auth_key_len],
            salt: [0u8; SALT_LEN],
        };
        aes_cm_prf(&self.key, &self.salt, enc_label, &mut keys.enc_key)?;
        aes_cm_prf(&self.key, &self.salt, auth_label, &mut keys.auth_key)?;
        aes_cm_prf(&self.key, &self.salt, salt_label, &mut keys.salt)?;
        Ok(keys)
    }
}

/// Writes `salt` right after the first `key_len` octets of `key_buffer`.
pub fn append_salt_to_key(
    key_buffer: &mut [u8],
    key_len: usize,
    salt: &[u8],
) -> Result<(), SrtpError> {
    let needed = key_len + salt.len();
    if key_buffer.len() < needed {
        return Err(SrtpError::BufferTooSmall {
            needed,
            capacity: key_buffer.len(),
        });
    }
    key_buffer[key_len..needed].copy_from_slice(salt);
    Ok(())
}
