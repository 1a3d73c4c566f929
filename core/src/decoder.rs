//! Streaming Manchester decoder: clock recovery, delimiter hunting, bit and
//! byte assembly, and the in-stream framing loop.

use std::io::Write;

use log::{debug, info, warn};

use crate::error::{ModemError, Result};
use crate::framing::{DelimiterHunter, FrameState, StuffingTracker};
use crate::sync::{recover_clock, CrossingScanner, Polarity, SyncState};
use crate::{DEFAULT_MIN_VOLUME, DELIMITER_INTERVAL, FRAME_DELIMITER, PREAMBLE_HALF_CYCLES};

/// How a decode session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The terminal delimiter was consumed, then the input ran out.
    Clean,
    /// The input ran out before the terminal delimiter.
    Truncated,
}

/// Outcome of a completed decode session. Bytes already handed to the sink
/// stay there regardless of how the stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeReport {
    pub bytes: u64,
    pub termination: Termination,
}

/// One byte-aligned unit read from the stream.
enum Token {
    Data(u8),
    /// A raw delimiter found in data position: the terminal marker.
    Delimiter,
    /// Input exhausted before the first transition of the next token.
    End,
}

/// One-pass decoder over a non-rewindable sample stream.
///
/// The session runs `Presync -> clock recovery -> HuntingDelimiter ->
/// InStream -> terminated`; `decode` consumes the decoder, so a session
/// cannot be resumed or replayed.
pub struct Decoder<I: Iterator<Item = i16>> {
    scanner: CrossingScanner<I>,
    sync: SyncState,
    state: FrameState,
}

impl<I: Iterator<Item = i16>> Decoder<I> {
    pub fn new(samples: I) -> Self {
        Self {
            scanner: CrossingScanner::new(samples, DEFAULT_MIN_VOLUME),
            sync: SyncState::new(),
            state: FrameState::HuntingDelimiter,
        }
    }

    /// Like [`Decoder::new`] with a custom crossing threshold, for channels
    /// whose noise floor or signal level differs from the reference.
    pub fn with_threshold(samples: I, threshold: i16) -> Result<Self> {
        if threshold < 0 {
            return Err(ModemError::InvalidConfig(
                "crossing threshold must be non-negative".into(),
            ));
        }
        Ok(Self {
            scanner: CrossingScanner::new(samples, threshold),
            sync: SyncState::new(),
            state: FrameState::HuntingDelimiter,
        })
    }

    /// Decodes the whole stream, writing data bytes to `sink` as they are
    /// recovered. Running out of input during clock recovery or delimiter
    /// hunting is fatal; afterwards it terminates the session, and the
    /// report says whether the terminal delimiter was seen first.
    pub fn decode<W: Write>(mut self, sink: &mut W) -> Result<DecodeReport> {
        recover_clock(&mut self.scanner, &mut self.sync, PREAMBLE_HALF_CYCLES)?;
        info!(
            "recovered clock: {:.2} samples per bit cell",
            self.sync.clock_period
        );

        self.hunt_delimiter()?;
        info!("synced to first frame delimiter, decoding data");

        let mut position: u64 = 0;
        // The hunted delimiter covers data index 0.
        let mut after_delimiter = true;
        let mut stuffing = StuffingTracker::new();
        let termination = loop {
            if position > 0 && position % DELIMITER_INTERVAL == 0 {
                match self.decode_raw_byte() {
                    Ok(byte) if byte == FRAME_DELIMITER => {
                        debug!("verified frame delimiter before position {position}");
                        after_delimiter = true;
                        stuffing.reset();
                    }
                    Ok(found) => return Err(ModemError::FramingError { found, position }),
                    Err(ModemError::EndOfStream) => break Termination::Truncated,
                    Err(e) => return Err(e),
                }
            }

            match self.decode_data_byte(position, &mut stuffing) {
                Ok(Token::Data(byte)) => {
                    sink.write_all(&[byte])?;
                    position += 1;
                    after_delimiter = false;
                }
                Ok(Token::Delimiter) => break Termination::Clean,
                Ok(Token::End) => {
                    break if after_delimiter {
                        Termination::Clean
                    } else {
                        Termination::Truncated
                    }
                }
                Err(ModemError::EndOfStream) => break Termination::Truncated,
                Err(e) => return Err(e),
            }
        };

        match termination {
            Termination::Clean => info!("stream complete: {position} bytes, terminal delimiter found"),
            Termination::Truncated => {
                warn!("input ended before the terminal delimiter, {position} bytes decoded")
            }
        }
        Ok(DecodeReport {
            bytes: position,
            termination,
        })
    }

    /// Shifts decoded bits through an 8-bit register until the first frame
    /// delimiter lines up. Any failure here is fatal: without the delimiter
    /// there is no byte alignment.
    fn hunt_delimiter(&mut self) -> Result<()> {
        let mut hunter = DelimiterHunter::new();
        loop {
            let bit = self.decode_bit()?;
            if hunter.push(bit) {
                self.state = FrameState::InStream;
                return Ok(());
            }
        }
    }

    /// Decodes one bit from the phase transition nearest to one clock period
    /// after the previous one. Sub-window crossings are half-cycles between
    /// two equal bits and fold into the running duration; a crossing past
    /// 1.25 periods means tracking is lost. Both window ends are inclusive.
    fn decode_bit(&mut self) -> Result<bool> {
        let mut duration = 0.0;
        loop {
            let crossing = self.scanner.next_crossing(&mut self.sync, false)?;
            duration += crossing.cycles as f64;
            let lower = 0.75 * self.sync.clock_period;
            let upper = 1.25 * self.sync.clock_period;
            if duration < lower {
                continue;
            }
            if duration > upper {
                return Err(ModemError::LostTracking { lower, upper });
            }
            return Ok(crossing.polarity == Polarity::Rising);
        }
    }

    /// Reads 8 bits LSB-first with no destuffing. Used for the periodic
    /// delimiter check, where the raw register value is compared directly.
    fn decode_raw_byte(&mut self) -> Result<u8> {
        let mut byte = 0u8;
        for index in 0..8 {
            if self.decode_bit()? {
                byte |= 1 << index;
            }
        }
        Ok(byte)
    }

    /// Reads one destuffed data byte, or recognizes the raw terminal
    /// delimiter sitting in data position. The stuffing run is shared
    /// across the data section, mirroring the encoder, so a run completing
    /// at a byte boundary is still destuffed.
    fn decode_data_byte(&mut self, position: u64, stuffing: &mut StuffingTracker) -> Result<Token> {
        debug_assert_eq!(self.state, FrameState::InStream);
        let mut byte = 0u8;
        for index in 0..8 {
            let bit = match self.decode_bit() {
                Ok(bit) => bit,
                Err(ModemError::EndOfStream) if index == 0 => return Ok(Token::End),
                Err(e) => return Err(e),
            };
            if bit {
                byte |= 1 << index;
            }
            if stuffing.push(bit) {
                // After five 1s the next physical bit must be a stuffed 0,
                // discarded without contributing to the value.
                if self.decode_bit()? {
                    return self.finish_terminal_delimiter(byte, index, position);
                }
            }
        }
        Ok(Token::Data(byte))
    }

    /// A 1 where a stuffed 0 belongs is only legal as the sixth 1 of a raw
    /// delimiter, which the encoder emits solely as the terminal marker.
    /// Anything else is a stuffing violation.
    fn finish_terminal_delimiter(&mut self, byte: u8, index: usize, position: u64) -> Result<Token> {
        // Bits so far must be the delimiter prefix 0,1,1,1,1,1 and its
        // closing bit must be 0.
        if index == 5 && byte == (FRAME_DELIMITER & 0x3F) && !self.decode_bit()? {
            debug!("terminal delimiter at position {position}");
            return Ok(Token::Delimiter);
        }
        Err(ModemError::StuffingViolation { position })
    }
}
