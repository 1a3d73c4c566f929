use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModemError {
    /// Input samples ran out. Expected while decoding payload (the stream
    /// simply ends); fatal when it happens during clock recovery or
    /// delimiter hunting.
    #[error("input stream ended")]
    EndOfStream,

    #[error("lost tracking: no phase inversion between {lower:.1} and {upper:.1} samples after the last one")]
    LostTracking { lower: f64, upper: f64 },

    #[error("expected frame delimiter, found {found:#04x} at byte position {position}")]
    FramingError { found: u8, position: u64 },

    #[error("expected stuffed 0 after five consecutive 1s at byte position {position}")]
    StuffingViolation { position: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("output sink error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ModemError>;
