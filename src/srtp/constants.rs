// Key derivation labels (RFC 3711 4.3.2)
pub const SRTP_LABEL_ENCRYPTION: u8 = 0x00;
pub const SRTP_LABEL_AUTH: u8 = 0x01;
pub const SRTP_LABEL_SALT: u8 = 0x02;
pub const SRTCP_LABEL_ENCRYPTION: u8 = 0x03;
pub const SRTCP_LABEL_AUTH: u8 = 0x04;
pub const SRTCP_LABEL_SALT: u8 = 0x05;

pub const AES_128_KEY_LEN: usize = 16;
pub const AES_256_KEY_LEN: usize = 32;
pub const HMAC_SHA1_KEY_LEN: usize = 20;
pub const HMAC_SHA1_80_TAG_LEN: usize = 10;
pub const HMAC_SHA1_32_TAG_LEN: usize = 4;

/// Master and session salt length for every AES-CM profile.
pub const SALT_LEN: usize = 14;

pub const MAX_KEY_LEN: usize = 64;
pub const MAX_TAG_LEN: usize = 12;
/// Largest trailer any protect call appends (SRTCP index word plus tag).
pub const MAX_TRAILER_LEN: usize = SRTCP_INDEX_LEN + MAX_TAG_LEN;

pub const RTP_VERSION: u8 = 2;
pub const RTP_HEADER_LEN: usize = 12;
pub const RTCP_HEADER_LEN: usize = 8;

// SRTCP trailer word: E bit plus 31-bit index
pub const SRTCP_E_BIT: u32 = 0x8000_0000;
pub const SRTCP_INDEX_MASK: u32 = 0x7fff_ffff;
pub const SRTCP_INDEX_LEN: usize = 4;

/// Replay window width in packet indices.
pub const REPLAY_WINDOW_SIZE: u64 = 1 << 15;

/// Largest tolerated distance between a packet index and the high-water mark.
pub const SEQ_NUM_MEDIAN: i64 = 1 << 15;

/// Highest 48-bit RTP packet index.
pub const MAX_RTP_INDEX: u64 = (1 << 48) - 1;

/// Default hard key-usage limit (packets per master key).
pub const DEFAULT_KEY_HARD_LIMIT: u64 = 1 << 48;
/// Distance below the hard limit at which the soft limit fires by default.
pub const DEFAULT_KEY_SOFT_MARGIN: u64 = 1 << 16;
