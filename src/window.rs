//! Sliding replay window for DTLS record sequence numbers.

use crate::seq::sat_sub;

/// Classification of an incoming sequence number against the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Freshness {
    /// Not seen before; processing may proceed.
    Fresh,
    /// Already accepted; a replay or a benign duplicate.
    Duplicate,
    /// Older than anything the window still tracks.
    Stale,
}

/// Anti-replay state for one epoch.
///
/// Maintains the highest accepted sequence value and a 64-bit bitmap of
/// the trailing window. The bit at offset `max_seq - s` is set iff `s` was
/// accepted.
///
/// Checking and updating are deliberately separate: the pipeline checks
/// freshness before spending decryption work, but only acknowledges
/// receipt after the record authenticates. A forged packet can therefore
/// never advance the window.
#[derive(Debug, Default)]
pub(crate) struct ReplayWindow {
    max_seq: u64,
    window: u64,
}

impl ReplayWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `seq` without mutating any state.
    pub fn check(&self, seq: u64) -> Freshness {
        let cmp = sat_sub(seq, self.max_seq);
        if cmp > 0 {
            return Freshness::Fresh;
        }

        let shift = (-cmp) as u32;
        if shift >= 64 {
            Freshness::Stale
        } else if self.window & (1u64 << shift) != 0 {
            Freshness::Duplicate
        } else {
            Freshness::Fresh
        }
    }

    /// Mark `seq` as received.
    ///
    /// Call only after the record passed decryption and MAC verification.
    pub fn update(&mut self, seq: u64) {
        let cmp = sat_sub(seq, self.max_seq);
        if cmp > 0 {
            let shift = cmp as u32;
            if shift < 64 {
                self.window <<= shift;
                self.window |= 1;
            } else {
                // Jump exceeds the window width: only the newest is seen.
                self.window = 1;
            }
            self.max_seq = seq;
        } else {
            let shift = (-cmp) as u32;
            if shift < 64 {
                self.window |= 1u64 << shift;
            }
        }
    }
}
