use std::sync::atomic::{AtomicUsize, Ordering};

use crate::srtp::{
    crypto_policy::{AuthType, CipherType},
    srtp_error::SrtpError,
    utils::{apply_keystream, compute_tag, constant_time_eq},
};

static INIT_COUNT: AtomicUsize = AtomicUsize::new(0);

// RFC 3711 B.2, first two keystream blocks.
const AES_CM_KEY: [u8; 16] = [
    0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f, 0x3c,
];
const AES_CM_IV: [u8; 16] = [
    0xf0, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9, 0xfa, 0xfb, 0xfc, 0xfd, 0x00, 0x00,
];
const AES_CM_KEYSTREAM: [u8; 32] = [
    0xe0, 0x3e, 0xad, 0x09, 0x35, 0xc9, 0x5e, 0x80, 0xe1, 0x66, 0xb1, 0x6d, 0xd9, 0x2b, 0x4e, 0xb4,
    0xd2, 0x35, 0x13, 0x16, 0x2b, 0x02, 0xd0, 0xf7, 0x2a, 0x43, 0xa2, 0xfe, 0x4a, 0x5f, 0x97, 0xab,
];

// RFC 2202 HMAC-SHA1 test case 1.
const HMAC_KEY: [u8; 20] = [0x0b; 20];
const HMAC_DATA: &[u8] = b"Hi There";
const HMAC_DIGEST: [u8; 20] = [
    0xb6, 0x17, 0x31, 0x86, 0x55, 0x05, 0x72, 0x64, 0xe2, 0x8b, 0xc0, 0xb6, 0xfb, 0x37, 0x8c, 0x8e,
    0xf1, 0x46, 0xbe, 0x00,
];

/// Initialises the library. Must precede [`Session::create`](super::session::Session::create).
///
/// The first call runs the cipher and MAC known-answer tests; later calls only bump a
/// reference count unless `force` asks for the self-tests to run again. Each successful
/// call must be paired with one [`deinit`].
pub fn init(force: bool) -> Result<(), SrtpError> {
    if force || INIT_COUNT.load(Ordering::Acquire) == 0 {
        self_test()?;
    }
    INIT_COUNT.fetch_add(1, Ordering::AcqRel);
    Ok(())
}

/// Releases one [`init`] reference.
pub fn deinit() -> Result<(), SrtpError> {
    INIT_COUNT
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        .map(|_| ())
        .map_err(|_| SrtpError::DeallocationFailure("library is not initialised"))
}

pub fn is_initialized() -> bool {
    INIT_COUNT.load(Ordering::Acquire) > 0
}

fn self_test() -> Result<(), SrtpError> {
    let mut block = [0u8; 32];
    apply_keystream(CipherType::AesCm128, &AES_CM_KEY, &AES_CM_IV, &mut block)?;
    if !constant_time_eq(&block, &AES_CM_KEYSTREAM) {
        return Err(SrtpError::InitializationFailure(
            "AES-CM self-test failed".into(),
        ));
    }

    let mut digest = [0u8; 20];
    compute_tag(AuthType::HmacSha1, &HMAC_KEY, &[HMAC_DATA], &mut digest)?;
    if !constant_time_eq(&digest, &HMAC_DIGEST) {
        return Err(SrtpError::InitializationFailure(
            "HMAC-SHA1 self-test failed".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn self_tests_pass() {
        self_test().unwrap();
    }

    #[test]
    fn init_is_reference_counted() {
        init(false).unwrap();
        init(true).unwrap();
        assert!(is_initialized());
        deinit().unwrap();
        assert!(is_initialized());
        deinit().unwrap();
    }
}
