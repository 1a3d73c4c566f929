//! Byte framing and Manchester waveform rendering.

use log::debug;

use crate::error::{ModemError, Result};
use crate::framing::StuffingTracker;
use crate::{AMPLITUDE, DELIMITER_INTERVAL, FRAME_DELIMITER, PREAMBLE_HALF_CYCLES, SAMPLE_RATE};

/// Renders bytes as a Manchester-coded sample stream: a fixed alternating
/// preamble for receiver clock recovery, a raw frame delimiter before every
/// 64th data byte (including the first), stuffed data bytes, and one final
/// raw delimiter as the end marker.
pub struct Encoder {
    half_cell: usize,
    amplitude: i16,
    preamble_half_cycles: u32,
}

impl Encoder {
    /// `clock_hz` is the bit rate. Each half-cell spans
    /// `sample_rate / (2 * clock_hz)` samples, so the clock must not exceed
    /// half the sample rate.
    pub fn new(clock_hz: u32) -> Result<Self> {
        Self::with_sample_rate(clock_hz, SAMPLE_RATE)
    }

    pub fn with_sample_rate(clock_hz: u32, sample_rate: u32) -> Result<Self> {
        if clock_hz == 0 {
            return Err(ModemError::InvalidConfig(
                "clock frequency must be positive".into(),
            ));
        }
        if clock_hz > sample_rate / 2 {
            return Err(ModemError::InvalidConfig(format!(
                "clock frequency {clock_hz} Hz exceeds half the sample rate ({sample_rate} Hz)"
            )));
        }
        Ok(Self {
            half_cell: (sample_rate / (2 * clock_hz)) as usize,
            amplitude: AMPLITUDE,
            preamble_half_cycles: PREAMBLE_HALF_CYCLES,
        })
    }

    /// Samples spanned by one half-bit cell.
    pub fn samples_per_half_cell(&self) -> usize {
        self.half_cell
    }

    /// Encode a byte stream into audio samples.
    pub fn encode(&self, data: &[u8]) -> Vec<i16> {
        let mut samples = Vec::new();
        self.write_preamble(&mut samples);
        let mut stuffing = StuffingTracker::new();
        for (position, &byte) in data.iter().enumerate() {
            if position as u64 % DELIMITER_INTERVAL == 0 {
                self.write_raw_byte(&mut samples, FRAME_DELIMITER);
                stuffing.reset();
            }
            self.write_data_byte(&mut samples, byte, &mut stuffing);
        }
        // Terminal marker so the receiver can tell a finished stream from a
        // truncated one.
        self.write_raw_byte(&mut samples, FRAME_DELIMITER);
        debug!("encoded {} bytes into {} samples", data.len(), samples.len());
        samples
    }

    /// Alternating bits, starting with 1, spanning the preamble length.
    pub(crate) fn write_preamble(&self, samples: &mut Vec<i16>) {
        for bit in 0..self.preamble_half_cycles / 2 {
            self.write_bit(samples, bit % 2 == 0);
        }
    }

    /// Writes a byte without stuffing. Only delimiters travel this way.
    pub(crate) fn write_raw_byte(&self, samples: &mut Vec<i16>, byte: u8) {
        for index in 0..8 {
            self.write_bit(samples, (byte >> index) & 1 == 1);
        }
    }

    /// Writes a byte LSB-first, inserting a stuffed 0 after every run of
    /// five 1-bits. Applies to every payload byte, 0x7E included, so data
    /// can never mimic a frame delimiter. The run tracker spans the whole
    /// data section: a run can start in one byte and complete in the next.
    pub(crate) fn write_data_byte(
        &self,
        samples: &mut Vec<i16>,
        byte: u8,
        stuffing: &mut StuffingTracker,
    ) {
        for index in 0..8 {
            let bit = (byte >> index) & 1 == 1;
            self.write_bit(samples, bit);
            if stuffing.push(bit) {
                self.write_bit(samples, false);
            }
        }
    }

    // 1 = low then high (rising mid-bit transition), 0 = high then low.
    fn write_bit(&self, samples: &mut Vec<i16>, bit: bool) {
        self.write_half_cell(samples, !bit);
        self.write_half_cell(samples, bit);
    }

    fn write_half_cell(&self, samples: &mut Vec<i16>, high: bool) {
        let level = if high { self.amplitude } else { -self.amplitude };
        samples.extend(std::iter::repeat(level).take(self.half_cell));
    }
}
