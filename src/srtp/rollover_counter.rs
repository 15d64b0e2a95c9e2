use crate::srtp::constants::SEQ_NUM_MEDIAN;

/// Result of placing a 16-bit sequence number on the 48-bit index line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IndexEstimate {
    pub(crate) index: u64,
    /// Signed distance from the current high-water mark.
    pub(crate) delta: i64,
}

impl IndexEstimate {
    pub(crate) fn roc(&self) -> u32 {
        (self.index >> 16) as u32
    }
}

/// Rollover counter plus highest sequence number seen for one RTP stream.
///
/// Together they form the high-water index `roc << 16 | highest_seq` that every new
/// sequence number is estimated against.
#[derive(Debug, Clone, Default)]
pub(crate) struct RolloverCounter {
    roc: u32,
    highest_seq: u16,
    started: bool,
}

impl RolloverCounter {
    pub(crate) fn roc(&self) -> u32 {
        self.roc
    }

    /// High-water index, `None` before the first packet.
    pub(crate) fn highest_index(&self) -> Option<u64> {
        self.started
            .then(|| (u64::from(self.roc) << 16) | u64::from(self.highest_seq))
    }

    /// Forces the rollover counter, e.g. when joining a stream already in progress.
    /// The next packet is taken as-is under the new counter.
    pub(crate) fn set_roc(&mut self, roc: u32) {
        self.roc = roc;
        self.highest_seq = 0;
        self.started = false;
    }

    /// Picks among `roc - 1`, `roc` and `roc + 1` the index nearest to the high-water
    /// mark. On a tie (exactly 2^15 either way) the lower index wins, so a sequence
    /// number half a cycle back is treated as late rather than as a rollover.
    ///
    /// Returns `None` when the nearest representable index is 2^15 or more ahead, or
    /// more than 2^15 behind; that happens only at the ends of the ROC range.
    pub(crate) fn estimate(&self, seq: u16) -> Option<IndexEstimate> {
        let Some(local) = self.highest_index() else {
            let index = (u64::from(self.roc) << 16) | u64::from(seq);
            return Some(IndexEstimate { index, delta: 0 });
        };

        let candidates = [
            self.roc.checked_sub(1),
            Some(self.roc),
            self.roc.checked_add(1),
        ];

        let mut best: Option<IndexEstimate> = None;
        for roc in candidates.into_iter().flatten() {
            let index = (u64::from(roc) << 16) | u64::from(seq);
            let delta = index as i64 - local as i64;
            let better = match best {
                None => true,
                // strictly closer; candidates ascend, so ties keep the lower index
                Some(b) => delta.abs() < b.delta.abs(),
            };
            if better {
                best = Some(IndexEstimate { index, delta });
            }
        }

        best.filter(|b| b.delta < SEQ_NUM_MEDIAN && b.delta >= -SEQ_NUM_MEDIAN)
    }

    /// Advances the high-water mark if `index` is beyond it.
    pub(crate) fn update(&mut self, index: u64) {
        if self.highest_index().is_none_or(|h| index > h) {
            self.roc = (index >> 16) as u32;
            self.highest_seq = (index & 0xffff) as u16;
            self.started = true;
        }
    }
}
