use std::sync::atomic::{AtomicU64, Ordering};

use crate::srtp::{
    constants::{DEFAULT_KEY_HARD_LIMIT, DEFAULT_KEY_SOFT_MARGIN},
    srtp_error::SrtpError,
};

/// Packet budget for one master key.
///
/// Reaching `soft` raises `key_soft_limit` (time to rekey); reaching `hard` raises
/// `key_hard_limit` and expires every stream using the key once the packet that
/// reached it has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyLimit {
    hard: u64,
    soft: u64,
}

impl Default for KeyLimit {
    fn default() -> Self {
        Self {
            hard: DEFAULT_KEY_HARD_LIMIT,
            soft: DEFAULT_KEY_HARD_LIMIT - DEFAULT_KEY_SOFT_MARGIN,
        }
    }
}

impl KeyLimit {
    /// Hard limit of `hard` packets, soft limit 2^16 packets earlier (or at the first
    /// packet for tiny budgets).
    pub fn new(hard: u64) -> Result<Self, SrtpError> {
        Self::with_soft(hard, hard.saturating_sub(DEFAULT_KEY_SOFT_MARGIN).max(1).min(hard))
    }

    pub fn with_soft(hard: u64, soft: u64) -> Result<Self, SrtpError> {
        if hard == 0 || hard > DEFAULT_KEY_HARD_LIMIT {
            return Err(SrtpError::BadParameter(format!(
                "hard key limit must be in 1..=2^48, got {hard}"
            )));
        }
        if soft == 0 || soft > hard {
            return Err(SrtpError::BadParameter(format!(
                "soft key limit {soft} must be in 1..={hard}"
            )));
        }
        Ok(Self { hard, soft })
    }

    pub fn hard(&self) -> u64 {
        self.hard
    }

    pub fn soft(&self) -> u64 {
        self.soft
    }
}

/// What recording one more packet did to the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyLimitEvent {
    Normal,
    SoftLimit,
    HardLimit,
}

/// Running usage count for a master key, shared by every stream keyed from it.
#[derive(Debug)]
pub(crate) struct KeyUsage {
    limit: KeyLimit,
    used: AtomicU64,
}

impl KeyUsage {
    pub(crate) fn new(limit: KeyLimit) -> Self {
        Self {
            limit,
            used: AtomicU64::new(0),
        }
    }

    pub(crate) fn used(&self) -> u64 {
        self.used.load(Ordering::Acquire)
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.used() >= self.limit.hard
    }

    pub(crate) fn record(&self) -> KeyLimitEvent {
        let n = self.used.fetch_add(1, Ordering::AcqRel).saturating_add(1);
        if n == self.limit.hard {
            KeyLimitEvent::HardLimit
        } else if n == self.limit.soft {
            KeyLimitEvent::SoftLimit
        } else {
            KeyLimitEvent::Normal
        }
    }
}
