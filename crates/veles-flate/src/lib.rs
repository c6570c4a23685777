//! Canonical Huffman coding and DEFLATE decoding for Veles.
//!
//! This crate is the codec core of the toolkit:
//!
//! - [`huffman`] - canonical prefix codes over arbitrary alphabets, with the
//!   bit-reversed wire packing DEFLATE transmits
//! - [`inflate`] - the RFC 1951 block decoder (stored, fixed, dynamic) with
//!   sliding-window back-references
//!
//! Bits flow through [`veles_common::BitReader`] / [`veles_common::BitWriter`],
//! LSB-first within each byte.
//!
//! # Example
//!
//! ```
//! use veles_flate::inflate_bytes;
//!
//! // A stored block carrying "Hello".
//! let stream = [0x01, 0x05, 0x00, 0xFA, 0xFF, b'H', b'e', b'l', b'l', b'o'];
//! assert_eq!(inflate_bytes(&stream).unwrap(), b"Hello");
//! ```

mod error;
pub mod huffman;
mod inflate;

pub use error::{Error, Result};
pub use huffman::{CodeLength, Decoder, Encoder};
pub use inflate::{inflate, inflate_bytes};
