use crate::srtp::{
    constants::{AES_128_KEY_LEN, AES_256_KEY_LEN, SALT_LEN},
    srtp_error::SrtpError,
};

/// SRTP protection profiles as negotiated by DTLS-SRTP (RFC 5764).
///
/// Discriminants follow the profile numbering the key-negotiation layer hands over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SrtpProfile {
    Reserved = 0,
    Aes128CmSha1_80 = 1,
    Aes128CmSha1_32 = 2,
    Aes256CmSha1_80 = 3,
    Aes256CmSha1_32 = 4,
    NullSha1_80 = 5,
    NullSha1_32 = 6,
}

impl TryFrom<u32> for SrtpProfile {
    type Error = SrtpError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Reserved,
            1 => Self::Aes128CmSha1_80,
            2 => Self::Aes128CmSha1_32,
            3 => Self::Aes256CmSha1_80,
            4 => Self::Aes256CmSha1_32,
            5 => Self::NullSha1_80,
            6 => Self::NullSha1_32,
            other => {
                return Err(SrtpError::BadParameter(format!(
                    "unknown SRTP profile {other}"
                )));
            }
        })
    }
}

impl SrtpProfile {
    /// Master key length in octets, 0 for `Reserved`.
    pub fn master_key_length(self) -> usize {
        match self {
            Self::Reserved => 0,
            Self::Aes256CmSha1_80 | Self::Aes256CmSha1_32 => AES_256_KEY_LEN,
            Self::Aes128CmSha1_80
            | Self::Aes128CmSha1_32
            | Self::NullSha1_80
            | Self::NullSha1_32 => AES_128_KEY_LEN,
        }
    }

    /// Master salt length in octets, 0 for `Reserved`.
    pub fn master_salt_length(self) -> usize {
        match self {
            Self::Reserved => 0,
            _ => SALT_LEN,
        }
    }

    /// IANA name used in SDP and DTLS-SRTP negotiation.
    pub fn name(self) -> &'static str {
        match self {
            Self::Reserved => "RESERVED",
            Self::Aes128CmSha1_80 => "SRTP_AES128_CM_SHA1_80",
            Self::Aes128CmSha1_32 => "SRTP_AES128_CM_SHA1_32",
            Self::Aes256CmSha1_80 => "SRTP_AES256_CM_SHA1_80",
            Self::Aes256CmSha1_32 => "SRTP_AES256_CM_SHA1_32",
            Self::NullSha1_80 => "SRTP_NULL_SHA1_80",
            Self::NullSha1_32 => "SRTP_NULL_SHA1_32",
        }
    }

    /// Looks a profile up by its IANA name (case-insensitive). `RESERVED` is not
    /// accepted since it cannot key a stream.
    pub fn from_name(name: &str) -> Result<Self, SrtpError> {
        let wanted = name.trim();
        [
            Self::Aes128CmSha1_80,
            Self::Aes128CmSha1_32,
            Self::Aes256CmSha1_80,
            Self::Aes256CmSha1_32,
            Self::NullSha1_80,
            Self::NullSha1_32,
        ]
        .into_iter()
        .find(|p| p.name().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| SrtpError::BadParameter(format!("unknown SRTP profile name {wanted}")))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn key_and_salt_lengths() {
        assert_eq!(SrtpProfile::Aes128CmSha1_32.master_key_length(), 16);
        assert_eq!(SrtpProfile::Aes256CmSha1_80.master_key_length(), 32);
        assert_eq!(SrtpProfile::NullSha1_80.master_key_length(), 16);
        assert_eq!(SrtpProfile::Aes256CmSha1_32.master_salt_length(), 14);
        assert_eq!(SrtpProfile::Reserved.master_key_length(), 0);
        assert_eq!(SrtpProfile::Reserved.master_salt_length(), 0);
    }

    #[test]
    fn numeric_profile_values() {
        assert_eq!(SrtpProfile::try_from(5).unwrap(), SrtpProfile::NullSha1_80);
        assert!(matches!(
            SrtpProfile::try_from(7),
            Err(SrtpError::BadParameter(_))
        ));
    }

    #[test]
    fn names_round_trip() {
        let p = SrtpProfile::from_name("srtp_aes256_cm_sha1_32").unwrap();
        assert_eq!(p, SrtpProfile::Aes256CmSha1_32);
        assert_eq!(p.name(), "SRTP_AES256_CM_SHA1_32");
        assert!(SrtpProfile::from_name("RESERVED").is_err());
    }
}
