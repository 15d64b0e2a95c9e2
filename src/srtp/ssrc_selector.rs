/// Which SSRC(s) a stream policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SsrcSelector {
    #[default]
    Undefined,
    Specific(u32),
    /// Any SSRC seen by `unprotect` without its own stream.
    AnyInbound,
    /// Any SSRC seen by `protect` without its own stream.
    AnyOutbound,
}

impl SsrcSelector {
    pub fn is_wildcard(self) -> bool {
        matches!(self, Self::AnyInbound | Self::AnyOutbound)
    }
}
