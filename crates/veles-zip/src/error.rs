//! Error types for the ZIP crate.

use thiserror::Error;

/// Errors that can occur when working with ZIP archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Ran out of bytes before a structural requirement was met.
    #[error("truncated archive: {0}")]
    TruncatedArchive(#[from] veles_common::Error),

    /// Expected magic bytes not found.
    #[error("invalid ZIP signature: expected {expected:#010x}, got {actual:#010x}")]
    BadSignature { expected: u32, actual: u32 },

    /// Could not find the end of central directory record.
    #[error("could not find end of central directory record")]
    EocdNotFound,

    /// ZIP64 record not found when expected.
    #[error("ZIP64 end of central directory not found")]
    Zip64EocdNotFound,

    /// Central directory and local header disagree on a reconciled field.
    #[error("local header disagrees with central directory on {field}")]
    WrongLocalHeader { field: &'static str },

    /// Observed size differs from the declared size.
    #[error("size mismatch: declared {declared}, observed {actual}")]
    WrongSize { declared: u64, actual: u64 },

    /// Checksum mismatch; the decoded bytes are surfaced for inspection.
    #[error("CRC32 mismatch: declared {declared:#010x}, computed {actual:#010x}")]
    WrongCrc32 {
        declared: u32,
        actual: u32,
        data: Vec<u8>,
    },

    /// Compression method outside the implemented set.
    #[error("unsupported compression method: {0}")]
    CompressionNotSupported(u16),

    /// Encryption, spanning or an unsupported zip64 variant.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(&'static str),

    /// DEFLATE stream error inside an entry.
    #[error("deflate error: {0}")]
    Deflate(#[from] veles_flate::Error),
}

/// Result type for ZIP operations.
pub type Result<T> = std::result::Result<T, Error>;
