use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::srtp::constants::SALT_LEN;

/// Keys derived from a master key for one direction (SRTP or SRTCP).
///
/// Wiped when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKeys {
    pub(crate) enc_key: Vec<u8>,
    pub(crate) auth_key: Vec<u8>,
    pub(crate) salt: [u8; SALT_LEN],
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("enc_key_len", &self.enc_key.len())
            .field("auth_key_len", &self.auth_key.len())
            .finish_non_exhaustive()
    }
}
