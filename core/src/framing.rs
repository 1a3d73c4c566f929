//! Frame delimiter hunting and bit-stuffing bookkeeping.
//!
//! The delimiter byte 0x7E is the only place a run of six 1-bits may appear
//! on the wire; payload runs are broken up by stuffed 0s. Encoder and
//! decoder share the same run tracker so the stuffing rules cannot drift
//! apart.

use crate::{FRAME_DELIMITER, MAX_ONES_RUN};

/// Framing state of a decode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Shifting decoded bits through a register until the first delimiter.
    HuntingDelimiter,
    /// Byte-aligned; periodic delimiters are verified by position.
    InStream,
}

/// 8-bit shift register used while hunting the first frame delimiter.
/// Each decoded bit enters at the low end; the oldest bit falls off the top.
#[derive(Debug, Default)]
pub struct DelimiterHunter {
    register: u8,
}

impl DelimiterHunter {
    pub fn new() -> Self {
        Self { register: 0 }
    }

    /// Shifts in one bit; true once the register holds the delimiter.
    pub fn push(&mut self, bit: bool) -> bool {
        self.register = (self.register << 1) | u8::from(bit);
        self.register == FRAME_DELIMITER
    }
}

/// Tracks consecutive 1-bits across the data portion of a stream. `push`
/// returns true when the run reaches [`MAX_ONES_RUN`]: the encoder inserts a
/// stuffed 0 there, the decoder discards one. The run resets at that point
/// on both sides, so longer runs keep stuffing every five 1s. The run
/// carries across data byte boundaries (a trailing run in one byte can
/// complete in the next) and is reset at raw delimiter tokens.
#[derive(Debug, Default)]
pub struct StuffingTracker {
    run: u8,
}

impl StuffingTracker {
    pub fn new() -> Self {
        Self { run: 0 }
    }

    /// Clears the run. Called at raw delimiter tokens, which sit outside
    /// the stuffed data stream.
    pub fn reset(&mut self) {
        self.run = 0;
    }

    pub fn push(&mut self, bit: bool) -> bool {
        if !bit {
            self.run = 0;
            return false;
        }
        self.run += 1;
        if self.run == MAX_ONES_RUN {
            self.run = 0;
            true
        } else {
            false
        }
    }
}
