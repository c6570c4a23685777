//! Error types for the flate crate.

use thiserror::Error;

/// Errors raised while building Huffman codes or decoding DEFLATE streams.
#[derive(Debug, Error)]
pub enum Error {
    /// A code length exceeds the 15-bit DEFLATE limit.
    #[error("code length {0} exceeds the 15-bit limit")]
    CodeLengthTooLong(u8),

    /// The length vector assigns more codes than a prefix code can hold.
    #[error("code lengths oversubscribe the prefix code")]
    OversubscribedCode,

    /// A decoded bit prefix maps to no assigned symbol.
    #[error("no symbol assigned to decoded prefix")]
    InvalidPrefix,

    /// The caller asked to encode a symbol that carries no code.
    #[error("symbol {0} has no assigned code")]
    UnassignedSymbol(u16),

    /// Reserved block type 11 encountered.
    #[error("reserved DEFLATE block type")]
    ReservedBlockType,

    /// Stored block failed the one's-complement length check.
    #[error("stored block length check failed: LEN {len:#06x} vs NLEN {nlen:#06x}")]
    StoredLengthMismatch { len: u16, nlen: u16 },

    /// Literal/length symbol outside the 0..=285 range used on the wire.
    #[error("invalid literal/length symbol {0}")]
    BadSymbol(u16),

    /// Distance symbol outside the 0..=29 range used on the wire.
    #[error("invalid distance symbol {0}")]
    BadDistance(u16),

    /// A back-reference points before the start of the output.
    #[error("match distance {distance} exceeds {available} bytes of output")]
    DistanceTooFar { distance: usize, available: usize },

    /// A run-length code in the dynamic header overruns the length table.
    #[error("code length run crosses the table boundary")]
    BadLengthRun,

    /// Repeat-previous code with nothing to repeat.
    #[error("repeat code with no previous length")]
    RepeatWithoutPrior,

    /// Bitstream cursor error (typically a truncated stream).
    #[error(transparent)]
    Cursor(#[from] veles_common::Error),
}

/// Result type for flate operations.
pub type Result<T> = std::result::Result<T, Error>;
