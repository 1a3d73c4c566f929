use clap::{Parser, Subcommand};
use hound::{SampleFormat, WavSpec};
use log::{error, info, warn, LevelFilter};
use manchesterwave_core::{
    Decoder, Encoder, Termination, DEFAULT_CLOCK_HZ, DEFAULT_MIN_VOLUME, SAMPLE_RATE,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "manchesterwave")]
#[command(about = "Manchester-code audio modem: encodes files as WAV audio and back")]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Even more verbose output, for debug
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a binary file into a Manchester-coded WAV file
    Encode {
        /// File to encode
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Audio file to write
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,

        /// Clock frequency (bit rate) in Hz; at most half the sample rate
        #[arg(short, long, default_value_t = DEFAULT_CLOCK_HZ)]
        clock: u32,
    },

    /// Decode a Manchester-coded WAV file back into the original bytes
    Decode {
        /// Audio file to decode (mono 16-bit PCM)
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Decoded file to write
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Zero-crossing threshold; raise on noisy channels, lower for
        /// quiet recordings
        #[arg(short, long, default_value_t = DEFAULT_MIN_VOLUME)]
        threshold: i16,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let result = match cli.command {
        Commands::Encode {
            input,
            output,
            clock,
        } => encode_command(&input, &output, clock),
        Commands::Decode {
            input,
            output,
            threshold,
        } => decode_command(&input, &output, threshold),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

fn encode_command(
    input: &PathBuf,
    output: &PathBuf,
    clock: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;
    info!("read {} bytes from {}", data.len(), input.display());

    let encoder = Encoder::new(clock)?;
    let samples = encoder.encode(&data);
    info!("encoded to {} audio samples", samples.len());

    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(output, spec)?;
    for sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    println!(
        "Encoded {} bytes to {} ({} Hz clock)",
        data.len(),
        output.display(),
        clock
    );
    Ok(())
}

fn decode_command(
    input: &PathBuf,
    output: &PathBuf,
    threshold: i16,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::open(input)?;
    let spec = reader.spec();
    info!(
        "read WAV: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );

    if spec.channels != 1 {
        return Err(format!("expected mono input, got {} channels", spec.channels).into());
    }
    if spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int {
        return Err(format!(
            "expected 16-bit signed PCM, got {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )
        .into());
    }

    let samples: Vec<i16> = reader.samples::<i16>().collect::<Result<_, _>>()?;
    info!("extracted {} samples", samples.len());

    let file = File::create(output)?;
    let mut sink = BufWriter::new(file);
    let decoder = Decoder::with_threshold(samples.into_iter(), threshold)?;
    let report = decoder.decode(&mut sink)?;
    sink.flush()?;

    match report.termination {
        Termination::Clean => println!(
            "Decoded {} bytes to {} (terminal delimiter found)",
            report.bytes,
            output.display()
        ),
        Termination::Truncated => {
            warn!(
                "input ended before the terminal delimiter; decoded {} bytes may be incomplete",
                report.bytes
            );
            println!(
                "Decoded {} bytes to {} (stream truncated)",
                report.bytes,
                output.display()
            );
        }
    }
    Ok(())
}
