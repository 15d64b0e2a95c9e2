use crate::{
    config::Config,
    srtp::{key_limit::KeyLimit, srtp_error::SrtpError, srtp_profile::SrtpProfile},
};

const SECTION: &str = "srtp";

/// Deployment defaults for new streams, read from the `[srtp]` config section.
///
/// ```text
/// [srtp]
/// profile = SRTP_AES128_CM_SHA1_80
/// key_hard_limit = 281474976710656
/// key_soft_limit = 281474976645120
/// allow_repeat_tx = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrtpSettings {
    pub profile: SrtpProfile,
    pub key_limit: KeyLimit,
    pub allow_repeat_tx: bool,
}

impl Default for SrtpSettings {
    fn default() -> Self {
        Self {
            profile: SrtpProfile::Aes128CmSha1_80,
            key_limit: KeyLimit::default(),
            allow_repeat_tx: false,
        }
    }
}

impl SrtpSettings {
    pub fn from_config(config: &Config) -> Result<Self, SrtpError> {
        let defaults = Self::default();

        let profile = match config.get_non_empty(SECTION, "profile") {
            Some(name) => SrtpProfile::from_name(name)?,
            None => defaults.profile,
        };

        let hard: Option<u64> = config
            .get_parsed(SECTION, "key_hard_limit")
            .map_err(SrtpError::BadParameter)?;
        let soft: Option<u64> = config
            .get_parsed(SECTION, "key_soft_limit")
            .map_err(SrtpError::BadParameter)?;
        let key_limit = match (hard, soft) {
            (None, None) => defaults.key_limit,
            (Some(h), None) => KeyLimit::new(h)?,
            (h, Some(s)) => KeyLimit::with_soft(h.unwrap_or(defaults.key_limit.hard()), s)?,
        };

        let allow_repeat_tx = config
            .get_bool(SECTION, "allow_repeat_tx")
            .map_err(SrtpError::BadParameter)?
            .unwrap_or(defaults.allow_repeat_tx);

        Ok(Self {
            profile,
            key_limit,
            allow_repeat_tx,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn empty_config_gives_defaults() {
        let s = SrtpSettings::from_config(&Config::empty()).unwrap();
        assert_eq!(s, SrtpSettings::default());
    }

    #[test]
    fn reads_profile_limits_and_flags() {
        let c = Config::parse(
            "[srtp]\nprofile = SRTP_NULL_SHA1_80\nkey_hard_limit = 500\nkey_soft_limit = 400\nallow_repeat_tx = true\n",
        );
        let s = SrtpSettings::from_config(&c).unwrap();
        assert_eq!(s.profile, SrtpProfile::NullSha1_80);
        assert_eq!(s.key_limit.hard(), 500);
        assert_eq!(s.key_limit.soft(), 400);
        assert!(s.allow_repeat_tx);
    }

    #[test]
    fn invalid_values_are_bad_parameters() {
        for text in [
            "[srtp]\nprofile = SRTP_ROT13\n",
            "[srtp]\nkey_hard_limit = lots\n",
            "[srtp]\nkey_hard_limit = 10\nkey_soft_limit = 20\n",
            "[srtp]\nallow_repeat_tx = maybe\n",
        ] {
            let err = SrtpSettings::from_config(&Config::parse(text)).unwrap_err();
            assert!(matches!(err, SrtpError::BadParameter(_)), "{text}");
        }
    }
}
