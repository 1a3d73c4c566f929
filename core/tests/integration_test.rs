//! End-to-end encode/decode round trips over the wire contract.

use manchesterwave_core::sync::{recover_clock, CrossingScanner, SyncState};
use manchesterwave_core::{
    Decoder, Encoder, Termination, DEFAULT_CLOCK_HZ, DEFAULT_MIN_VOLUME, PREAMBLE_HALF_CYCLES,
};
use rand::{Rng, SeedableRng};

fn encode(data: &[u8]) -> Vec<i16> {
    Encoder::new(DEFAULT_CLOCK_HZ)
        .expect("default clock is valid")
        .encode(data)
}

fn decode(samples: Vec<i16>) -> (Vec<u8>, Termination) {
    let mut sink = Vec::new();
    let report = Decoder::new(samples.into_iter())
        .decode(&mut sink)
        .expect("decode failed");
    assert_eq!(report.bytes as usize, sink.len());
    (sink, report.termination)
}

fn assert_round_trip(data: &[u8]) {
    let (decoded, termination) = decode(encode(data));
    assert_eq!(decoded, data, "round trip mismatch for {} bytes", data.len());
    assert_eq!(termination, Termination::Clean);
}

/// Reconstructs the logical half-cell pair stream from samples. Each bit is
/// two half-cells; a bit is 1 when the first half is low.
fn wire_bits(samples: &[i16]) -> Vec<bool> {
    let half_cell = 10; // 44100 Hz at the 2205 Hz default clock
    assert_eq!(samples.len() % (2 * half_cell), 0);
    samples
        .chunks(2 * half_cell)
        .map(|cell| cell[0] < 0)
        .collect()
}

const DELIMITER_BITS: [bool; 8] = [false, true, true, true, true, true, true, false];

#[test]
fn round_trip_empty() {
    assert_round_trip(&[]);
}

#[test]
fn round_trip_single_zero_byte() {
    assert_round_trip(&[0x00]);
}

#[test]
fn round_trip_single_ones_byte() {
    assert_round_trip(&[0xFF]);
}

#[test]
fn round_trip_maximal_stuffing() {
    // 64 bytes of 0xFF: every byte stuffs twice, and the run counter must
    // stay mirrored across byte boundaries.
    assert_round_trip(&[0xFF; 64]);
}

#[test]
fn round_trip_ones_runs_spanning_byte_boundaries() {
    // Trailing and leading 1-runs join across byte boundaries; stuffing
    // must break them exactly the same way on both sides.
    assert_round_trip(&[0xF0, 0x0F, 0xF0, 0xFF, 0x0F, 0x80, 0x01]);
}

#[test]
fn round_trip_delimiter_valued_payload() {
    // 0x7E as data must be stuffed on the wire and decode back without being
    // mistaken for a frame marker.
    assert_round_trip(&[0x7E; 10]);
}

#[test]
fn round_trip_random_spanning_delimiter_boundaries() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x0badc0de);
    let data: Vec<u8> = (0..200).map(|_| rng.gen()).collect();
    assert_round_trip(&data);
}

#[test]
fn no_long_ones_run_outside_raw_delimiters() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let data: Vec<u8> = (0..200).map(|_| rng.gen()).collect();
    let samples = encode(&data);
    let bits = wire_bits(&samples);

    // Skip the preamble: 128 half-cells = 64 bits.
    let stream = &bits[64..];
    let mut runs_of_six = 0;
    let mut run = 0;
    for &bit in stream {
        if bit {
            run += 1;
        } else {
            assert!(run <= 6, "run of {run} consecutive 1s on the wire");
            if run == 6 {
                runs_of_six += 1;
            }
            run = 0;
        }
    }
    assert!(run < 6);
    // 200 bytes: delimiters before positions 0, 64, 128, 192 plus the
    // terminal marker. Nothing else may carry six 1s in a row.
    assert_eq!(runs_of_six, 5);
}

#[test]
fn delimiters_precede_every_64th_byte() {
    // All-zero payload keeps data bits flat, so delimiter tokens sit at
    // fixed wire offsets.
    let samples = encode(&[0x00; 130]);
    let stream = &wire_bits(&samples)[64..];
    let offsets = [
        0,           // before byte 0
        8 + 64 * 8,  // before byte 64
        2 * 8 + 128 * 8, // before byte 128
        3 * 8 + 130 * 8, // terminal marker
    ];
    for offset in offsets {
        assert_eq!(
            &stream[offset..offset + 8],
            &DELIMITER_BITS[..],
            "no delimiter at wire offset {offset}"
        );
    }
}

#[test]
fn clock_estimate_converges_on_preamble() {
    let samples = encode(&[]);
    let mut scanner = CrossingScanner::new(samples.into_iter(), DEFAULT_MIN_VOLUME);
    let mut sync = SyncState::new();
    recover_clock(&mut scanner, &mut sync, PREAMBLE_HALF_CYCLES).expect("recovery failed");

    let true_period = 20.0; // two 10-sample half-cells per bit
    let error = (sync.clock_period - true_period).abs() / true_period;
    assert!(
        error < 0.01,
        "clock estimate {:.3} off by {:.2}%",
        sync.clock_period,
        error * 100.0
    );
}

#[test]
fn truncated_mid_byte_reports_partial_data() {
    let data = b"0123456789";
    let mut samples = encode(data);
    // Drop the terminal delimiter (8 bits) and two bits of the last byte.
    samples.truncate(samples.len() - 10 * 20);

    let mut sink = Vec::new();
    let report = Decoder::new(samples.into_iter())
        .decode(&mut sink)
        .expect("truncation is not fatal");
    assert_eq!(report.termination, Termination::Truncated);
    assert_eq!(report.bytes, 9);
    assert_eq!(sink, &data[..9]);
}

#[test]
fn missing_terminal_delimiter_reports_truncation() {
    let data = b"0123456789";
    let mut samples = encode(data);
    samples.truncate(samples.len() - 8 * 20);

    let mut sink = Vec::new();
    let report = Decoder::new(samples.into_iter())
        .decode(&mut sink)
        .expect("truncation is not fatal");
    assert_eq!(report.termination, Termination::Truncated);
    assert_eq!(report.bytes, 10);
    assert_eq!(sink, data);
}

#[test]
fn trailing_silence_after_terminal_delimiter_is_clean() {
    let mut samples = encode(b"hello");
    samples.extend(vec![0i16; 4000]);
    let (decoded, termination) = decode(samples);
    assert_eq!(decoded, b"hello");
    assert_eq!(termination, Termination::Clean);
}

#[test]
fn exact_delimiter_interval_payload_is_clean() {
    // 64 bytes: the terminal delimiter lands exactly where a periodic one
    // would, and the stream still ends clean.
    let data: Vec<u8> = (0..64).map(|i| i as u8).collect();
    assert_round_trip(&data);
}

#[test]
fn decodes_at_other_clock_rates() {
    let encoder = Encoder::with_sample_rate(441, 44100).expect("valid clock");
    let samples = encoder.encode(b"slow clock");
    let mut sink = Vec::new();
    let report = Decoder::new(samples.into_iter())
        .decode(&mut sink)
        .expect("decode failed");
    assert_eq!(sink, b"slow clock");
    assert_eq!(report.termination, Termination::Clean);
}
