//! Veles - DEFLATE codec and ZIP container toolkit.
//!
//! This crate provides a unified interface to the Veles library ecosystem.
//!
//! # Crates
//!
//! - [`veles_common`] - Bit-level cursor I/O, CRC32, shared error types
//! - [`veles_flate`] - Canonical Huffman coding and DEFLATE decoding
//! - [`veles_zip`] - ZIP archive reading (central directory, zip64)
//!
//! # Example
//!
//! ```no_run
//! use veles::prelude::*;
//!
//! let archive = ZipArchive::open("bundle.zip")?;
//! for entry in archive.entries() {
//!     if !entry.is_directory() {
//!         let data = entry.data()?;
//!         println!("{}: {} bytes", entry.name(), data.len());
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use veles_common as common;
pub use veles_flate as flate;
pub use veles_zip as zip;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use veles_common::{crc, BitReader, BitWriter};
    pub use veles_flate::{inflate, inflate_bytes};
    pub use veles_zip::{CompressionMethod, ZipArchive, ZipEntry};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
