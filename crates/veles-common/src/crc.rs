//! CRC32 hashing utilities.
//!
//! ZIP entries and DEFLATE-wrapped payloads are checksummed with the IEEE
//! 802.3 CRC32 (reflected polynomial 0xEDB88320, init and final XOR
//! 0xFFFFFFFF), the same CRC used by gzip and PNG.

/// Compute the CRC32 of a byte slice.
///
/// Uses hardware acceleration when available (SSE4.2 / PCLMULQDQ on x86).
#[inline]
pub fn checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Streaming CRC32 state for incremental hashing.
pub use crc32fast::Hasher;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn test_check_value() {
        // Reference vector for CRC-32/ISO-HDLC.
        assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_incremental_matches_oneshot() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let mut hasher = Hasher::new();
        hasher.update(&data[..10]);
        hasher.update(&data[10..]);
        assert_eq!(hasher.finalize(), checksum(data));
    }
}
