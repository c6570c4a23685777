//! Error types for veles-common.

use thiserror::Error;

/// Common error type for Veles cursor operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// An aligned read was requested while the cursor sits mid-byte.
    #[error("aligned read at bit offset {bit_offset}; align_to_byte first")]
    Misaligned { bit_offset: u8 },

    /// A seek or rewind left the valid byte range.
    #[error("cursor position {position} out of range for buffer of {len} bytes")]
    PositionOutOfRange { position: u64, len: usize },
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
