//! ZIP format structures.
//!
//! Low-level structures for parsing ZIP archives as defined by PKWARE
//! APPNOTE 6.3.x, including ZIP64 extensions. All multi-byte integers on
//! the wire are little-endian; each record's 4-byte signature is read
//! separately before its fixed-size struct.

pub mod central_dir;
mod eocd;
pub mod extra;
mod local;

pub use central_dir::CentralDirectoryHeader;
pub use eocd::{Eocd64Locator, Eocd64Record, EocdRecord};
pub use local::LocalFileHeader;

/// Optional signature preceding a data descriptor trailer.
pub const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x08074b50;

/// General-purpose flag bit 0: the entry is encrypted.
pub const FLAG_ENCRYPTED: u16 = 1 << 0;

/// General-purpose flag bit 3: sizes and CRC live in a trailing descriptor.
pub const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;

/// General-purpose flag bit 11: name and comment are UTF-8, not CP437.
pub const FLAG_UTF8: u16 = 1 << 11;

/// Compression methods dispatched by the toolkit.
///
/// `Bzip2` and `Lzma` are recognized method ids whose codecs live outside
/// this crate; reading such an entry without one fails cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// No compression (stored).
    Store,
    /// DEFLATE compression.
    Deflate,
    /// BZip2 compression (external codec).
    Bzip2,
    /// LZMA compression (external codec).
    Lzma,
    /// Any other method id.
    Unsupported(u16),
}

impl CompressionMethod {
    /// Map a wire method id to the dispatch enum.
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::Store,
            8 => Self::Deflate,
            12 => Self::Bzip2,
            14 => Self::Lzma,
            other => Self::Unsupported(other),
        }
    }

    /// The wire method id.
    pub fn as_u16(&self) -> u16 {
        match self {
            Self::Store => 0,
            Self::Deflate => 8,
            Self::Bzip2 => 12,
            Self::Lzma => 14,
            Self::Unsupported(value) => *value,
        }
    }
}
