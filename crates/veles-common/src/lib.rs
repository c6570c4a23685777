//! Common utilities for Veles.
//!
//! This crate provides the foundational types used across all Veles crates:
//!
//! - [`BitReader`] / [`BitWriter`] - LSB-first bit cursor I/O over byte slices
//! - [`crc`] - CRC32 (IEEE, reflected) hashing utilities
//! - Shared cursor error types

mod bitio;
mod error;

pub mod crc;

pub use bitio::{BitReader, BitWriter};
pub use error::{Error, Result};

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Re-export memchr for accelerated byte searching
pub use memchr;
