/// Security services applied to one direction of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SecurityServices {
    None,
    Confidentiality,
    Authentication,
    #[default]
    ConfidentialityAndAuthentication,
}

impl SecurityServices {
    pub fn from_flags(conf: bool, auth: bool) -> Self {
        match (conf, auth) {
            (false, false) => Self::None,
            (true, false) => Self::Confidentiality,
            (false, true) => Self::Authentication,
            (true, true) => Self::ConfidentialityAndAuthentication,
        }
    }

    pub fn conf(self) -> bool {
        matches!(self, Self::Confidentiality | Self::ConfidentialityAndAuthentication)
    }

    pub fn auth(self) -> bool {
        matches!(self, Self::Authentication | Self::ConfidentialityAndAuthentication)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_round_trip() {
        for (conf, auth) in [(false, false), (true, false), (false, true), (true, true)] {
            let s = SecurityServices::from_flags(conf, auth);
            assert_eq!((s.conf(), s.auth()), (conf, auth));
        }
        assert_eq!(
            SecurityServices::from_flags(false, true),
            SecurityServices::Authentication
        );
    }
}
