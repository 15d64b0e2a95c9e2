pub(super) type HmacSha1 = Hmac<Sha1>;
pub(super) type Aes128Ctr = Ctr128BE<Aes128>;
pub(super) type Aes256Ctr = Ctr128BE<Aes256>;

use aes::cipher::{KeyIvInit, StreamCipher};
use aes::{Aes128, Aes256};
use byteorder::{BigEndian, ByteOrder};
use ctr::Ctr128BE;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::srtp::{
    constants::{AES_128_KEY_LEN, AES_256_KEY_LEN, RTP_HEADER_LEN, SALT_LEN},
    crypto_policy::{AuthType, CipherType},
    srtp_error::SrtpError,
};

/// Constant-time comparison so a tag mismatch does not leak how many leading
/// bytes matched.
pub(super) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Runs the AES-CM keystream of `cipher` over `data` in place.
///
/// The null cipher leaves `data` untouched.
pub(super) fn apply_keystream(
    cipher: CipherType,
    key: &[u8],
    iv: &[u8; 16],
    data: &mut [u8],
) -> Result<(), SrtpError> {
    match cipher {
        CipherType::Null => Ok(()),
        CipherType::AesCm128 => {
            let mut c = Aes128Ctr::new_from_slices(key, iv)
                .map_err(|_| SrtpError::InitializationFailure("bad AES-128 key length".into()))?;
            c.apply_keystream(data);
            Ok(())
        }
        CipherType::AesCm256 => {
            let mut c = Aes256Ctr::new_from_slices(key, iv)
                .map_err(|_| SrtpError::InitializationFailure("bad AES-256 key length".into()))?;
            c.apply_keystream(data);
            Ok(())
        }
    }
}

/// Computes the authentication tag over the concatenation of `parts` and writes the
/// first `out.len()` octets of the MAC into `out`.
pub(super) fn compute_tag(
    auth: AuthType,
    key: &[u8],
    parts: &[&[u8]],
    out: &mut [u8],
) -> Result<(), SrtpError> {
    match auth {
        AuthType::Null => {
            out.fill(0);
            Ok(())
        }
        AuthType::HmacSha1 => {
            let mut mac = <HmacSha1 as Mac>::new_from_slice(key)
                .map_err(|_| SrtpError::InitializationFailure("invalid auth key length".into()))?;
            for part in parts {
                mac.update(part);
            }
            let full = mac.finalize().into_bytes();
            let n = out.len();
            if n > full.len() {
                return Err(SrtpError::BadParameter("tag longer than HMAC-SHA1 digest".into()));
            }
            out.copy_from_slice(&full[..n]);
            Ok(())
        }
    }
}

/// AES-CM pseudo-random function from RFC 3711 4.3.3 with key derivation rate 0.
///
/// `x = label << 48 XOR master_salt`; the keystream from IV `x << 16` fills `out`.
pub(super) fn aes_cm_prf(
    master_key: &[u8],
    master_salt: &[u8; SALT_LEN],
    label: u8,
    out: &mut [u8],
) -> Result<(), SrtpError> {
    let mut iv = [0u8; 16];
    iv[..SALT_LEN].copy_from_slice(master_salt);
    iv[7] ^= label;

    let cipher = match master_key.len() {
        AES_128_KEY_LEN => CipherType::AesCm128,
        AES_256_KEY_LEN => CipherType::AesCm256,
        n => {
            return Err(SrtpError::InitializationFailure(format!(
                "no key derivation for {n}-octet master key"
            )));
        }
    };
    out.fill(0);
    apply_keystream(cipher, master_key, &iv, out)
}

/// Counter-mode IV: `(salt << 16) XOR (ssrc << 64) XOR (index << 16)`.
pub(super) fn compute_iv(session_salt: &[u8; SALT_LEN], ssrc: u32, index: u64) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[..SALT_LEN].copy_from_slice(session_salt);

    let ssrc_bytes = ssrc.to_be_bytes();
    for i in 0..4 {
        iv[4 + i] ^= ssrc_bytes[i];
    }

    let idx_full = index.to_be_bytes();
    for i in 0..6 {
        iv[8 + i] ^= idx_full[2 + i];
    }
    iv
}

/// Length of the RTP header including CSRCs and the extension block.
pub(super) fn get_rtp_header_len(packet: &[u8]) -> Result<usize, SrtpError> {
    if packet.len() < RTP_HEADER_LEN {
        return Err(SrtpError::ParseError("shorter than RTP fixed header"));
    }
    let v_p_x_cc = packet[0];
    let cc = v_p_x_cc & 0x0F;
    let x = (v_p_x_cc & 0x10) != 0;

    let mut len = RTP_HEADER_LEN + (cc as usize * 4);

    if x {
        if packet.len() < len + 4 {
            return Err(SrtpError::ParseError("too short for extension header"));
        }
        let ext_len = BigEndian::read_u16(&packet[len + 2..len + 4]);
        len += 4 + (ext_len as usize * 4);
    }

    if packet.len() < len {
        return Err(SrtpError::ParseError("packet smaller than its header"));
    }
    Ok(len)
}
