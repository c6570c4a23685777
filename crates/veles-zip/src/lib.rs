//! ZIP archive reading for Veles.
//!
//! Parses standard ZIP archives per PKWARE APPNOTE 6.3.x:
//!
//! - End-of-central-directory discovery with trailing-comment tolerance
//! - ZIP64 extensions (EOCD record, locator, extended information field)
//! - Central-directory / local-header reconciliation
//! - Stored and DEFLATE entries, with structural, size and CRC32 validation
//!
//! Encryption and multi-disk spanning are detected and rejected cleanly;
//! BZip2 and LZMA entries are recognized but require an external codec.
//!
//! # Example
//!
//! ```no_run
//! use veles_zip::ZipArchive;
//!
//! let archive = ZipArchive::open("bundle.zip")?;
//! for entry in archive.entries() {
//!     if !entry.is_directory() {
//!         let data = entry.data()?;
//!         println!("{}: {} bytes", entry.name(), data.len());
//!     }
//! }
//! # Ok::<(), veles_zip::Error>(())
//! ```

mod archive;
mod cp437;
mod entry;
mod error;
pub mod zip;

pub use archive::ZipArchive;
pub use entry::ZipEntry;
pub use error::{Error, Result};
pub use zip::CompressionMethod;
