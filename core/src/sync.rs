//! Zero-crossing detection and preamble clock recovery.
//!
//! The scanner is the timing primitive: everything downstream (bit decoding,
//! framing) is built on the distance between sign flips of the input signal.

use crate::error::{ModemError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Rising,
    Falling,
}

/// A detected sign flip: how many samples passed since the previous one,
/// and which way the signal went.
#[derive(Debug, Clone, Copy)]
pub struct ZeroCrossing {
    pub cycles: u64,
    pub polarity: Polarity,
}

/// Per-session synchronization state. `clock_period` is the estimated
/// spacing, in samples, between qualifying phase transitions (one full bit
/// cell). It is blended during the preamble and frozen afterwards; owning it
/// here rather than in process-wide state keeps sessions independent.
#[derive(Debug, Clone)]
pub struct SyncState {
    pub clock_period: f64,
}

impl SyncState {
    pub fn new() -> Self {
        Self { clock_period: 0.0 }
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

/// Scans a non-rewindable sample stream for zero crossings.
///
/// Samples whose magnitude does not strictly exceed `threshold` are ignored
/// (noise floor around zero), but still count toward the elapsed cycles once
/// a sign has been latched.
pub struct CrossingScanner<I> {
    samples: I,
    threshold: i16,
    last_sign: Option<bool>,
}

impl<I: Iterator<Item = i16>> CrossingScanner<I> {
    pub fn new(samples: I, threshold: i16) -> Self {
        Self {
            samples,
            threshold,
            last_sign: None,
        }
    }

    /// Advances to the next zero crossing. With `adjust_clock`, blends the
    /// observed spacing into the running clock-period estimate:
    /// `period = (period + cycles) / 2`.
    pub fn next_crossing(&mut self, sync: &mut SyncState, adjust_clock: bool) -> Result<ZeroCrossing> {
        let mut cycles: u64 = 0;
        loop {
            let level = self.samples.next().ok_or(ModemError::EndOfStream)?;
            if self.last_sign.is_some() {
                cycles += 1;
            }

            // Threshold is exclusive: a sample sitting exactly on it is noise.
            if level > self.threshold || level < -self.threshold {
                let positive = level > 0;
                match self.last_sign {
                    None => self.last_sign = Some(positive),
                    Some(prev) if positive != prev => {
                        self.last_sign = Some(positive);
                        if adjust_clock {
                            sync.clock_period = (sync.clock_period + cycles as f64) / 2.0;
                        }
                        let polarity = if positive {
                            Polarity::Rising
                        } else {
                            Polarity::Falling
                        };
                        return Ok(ZeroCrossing { cycles, polarity });
                    }
                    Some(_) => {}
                }
            }
        }
    }
}

/// Consumes preamble crossings until the clock-period estimate has settled.
///
/// The stopping rule is self-referential: scanning continues until the
/// accumulated cycles exceed `preamble_half_cycles * clock_period / 4`, so a
/// still-low estimate keeps the recovery running longer. Ending the input
/// here is fatal.
pub fn recover_clock<I: Iterator<Item = i16>>(
    scanner: &mut CrossingScanner<I>,
    sync: &mut SyncState,
    preamble_half_cycles: u32,
) -> Result<()> {
    let mut analyzed: u64 = 0;
    loop {
        let crossing = scanner.next_crossing(sync, true)?;
        analyzed += crossing.cycles;
        if analyzed as f64 > f64::from(preamble_half_cycles) * sync.clock_period / 4.0 {
            return Ok(());
        }
    }
}
