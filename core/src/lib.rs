//! Software Manchester modem
//!
//! Encodes a byte stream as a self-clocked Manchester waveform and decodes it
//! back without a side-channel clock: the receiver estimates the bit period
//! from an alternating preamble, then tracks mid-bit phase transitions.
//! Frame delimiters (0x7E) protected by bit-stuffing keep byte alignment
//! across the stream.
//!
//! Wire contract: mono 16-bit signed PCM, logical 1 = low then high half-cell
//! (rising mid-bit transition), logical 0 = high then low. Bytes travel
//! least-significant-bit first on both sides.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod framing;
pub mod sync;

pub use decoder::{DecodeReport, Decoder, Termination};
pub use encoder::Encoder;
pub use error::{ModemError, Result};

/// Reference sample rate in Hz for generated waveforms.
pub const SAMPLE_RATE: u32 = 44100;

/// Logic-level amplitude of encoded half-cells.
pub const AMPLITUDE: i16 = 16384;

/// Default zero-crossing detection threshold. Samples whose magnitude does
/// not strictly exceed this are treated as silence/noise. Must stay below
/// AMPLITUDE; tune per channel via the decoder's threshold parameter.
pub const DEFAULT_MIN_VOLUME: i16 = 12288;

/// Preamble length in half-cells: 64 alternating bits, starting with 1.
pub const PREAMBLE_HALF_CYCLES: u32 = 128;

/// Reserved frame delimiter, transmitted raw (unstuffed). 0x7E is a bit
/// palindrome, so the hunting register matches it regardless of bit order.
pub const FRAME_DELIMITER: u8 = 0x7E;

/// A raw delimiter precedes every DELIMITER_INTERVAL-th data byte.
pub const DELIMITER_INTERVAL: u64 = 64;

/// Run length of 1-bits after which a stuffed 0 is inserted.
pub const MAX_ONES_RUN: u8 = 5;

/// Default encoder clock (bit rate) in Hz: 10 samples per half-cell at the
/// reference sample rate.
pub const DEFAULT_CLOCK_HZ: u32 = 2205;
