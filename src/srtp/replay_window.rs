use crate::srtp::constants::REPLAY_WINDOW_SIZE;

const WORDS: usize = (REPLAY_WINDOW_SIZE / 64) as usize;

/// Outcome of checking a packet index against the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayCheck {
    Accept,
    TooOld,
    Duplicate,
}

/// Sliding bitmap over the last `REPLAY_WINDOW_SIZE` packet indices.
///
/// Index `i` lives at bit `i % REPLAY_WINDOW_SIZE`; the window is anchored at the
/// highest index recorded so far. Nothing is recorded until a packet has been
/// authenticated, so `check` never mutates.
#[derive(Clone)]
pub(crate) struct ReplayWindow {
    top: Option<u64>,
    bits: Box<[u64; WORDS]>,
}

impl std::fmt::Debug for ReplayWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayWindow").field("top", &self.top).finish()
    }
}

impl ReplayWindow {
    pub(crate) fn new() -> Self {
        Self {
            top: None,
            bits: Box::new([0u64; WORDS]),
        }
    }

    /// Highest index recorded so far.
    pub(crate) fn top(&self) -> Option<u64> {
        self.top
    }

    pub(crate) fn check(&self, index: u64) -> ReplayCheck {
        let Some(top) = self.top else {
            return ReplayCheck::Accept;
        };
        if index > top {
            return ReplayCheck::Accept;
        }
        if top - index >= REPLAY_WINDOW_SIZE {
            return ReplayCheck::TooOld;
        }
        if self.is_set(index) {
            ReplayCheck::Duplicate
        } else {
            ReplayCheck::Accept
        }
    }

    /// Marks `index` as seen, sliding the window forward when it is a new maximum.
    pub(crate) fn update(&mut self, index: u64) {
        match self.top {
            None => {
                self.top = Some(index);
            }
            Some(top) if index > top => {
                let delta = index - top;
                if delta >= REPLAY_WINDOW_SIZE {
                    self.bits.fill(0);
                } else {
                    self.clear_range(top + 1, index);
                }
                self.top = Some(index);
            }
            Some(top) => {
                if top - index >= REPLAY_WINDOW_SIZE {
                    return;
                }
            }
        }
        self.set(index);
    }

    fn slot(index: u64) -> (usize, u64) {
        let pos = index % REPLAY_WINDOW_SIZE;
        ((pos / 64) as usize, 1u64 << (pos % 64))
    }

    fn is_set(&self, index: u64) -> bool {
        let (word, mask) = Self::slot(index);
        self.bits[word] & mask != 0
    }

    fn set(&mut self, index: u64) {
        let (word, mask) = Self::slot(index);
        self.bits[word] |= mask;
    }

    /// Clears the bits of indices `start..end`, a word at a time.
    fn clear_range(&mut self, start: u64, end: u64) {
        let mut i = start;
        while i < end {
            let pos = i % REPLAY_WINDOW_SIZE;
            let bit = pos % 64;
            let n = (64 - bit).min(end - i);
            let mask = if n == 64 {
                u64::MAX
            } else {
                ((1u64 << n) - 1) << bit
            };
            self.bits[(pos / 64) as usize] &= !mask;
            i += n;
        }
    }
}
