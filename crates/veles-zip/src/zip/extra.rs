//! Extra-field parsing, in particular the ZIP64 extended information field.

use veles_common::BitReader;

use crate::{Error, Result};

/// ZIP64 extended information extra field id.
pub const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Values recovered from a ZIP64 extended information field.
///
/// A field is only present on the wire when the corresponding 32-bit header
/// field carries the 0xFFFFFFFF sentinel, so callers state which values
/// they expect.
#[derive(Debug, Default, Clone, Copy)]
pub struct Zip64Fields {
    pub uncompressed_size: Option<u64>,
    pub compressed_size: Option<u64>,
    pub local_header_offset: Option<u64>,
}

/// Walk an extra-field blob looking for the ZIP64 record.
///
/// Returns `None` when no ZIP64 record exists. The `need_*` flags mirror
/// which header fields were sentinels; only those are read, in the order
/// APPNOTE defines (uncompressed, compressed, offset).
pub fn parse_zip64(
    extra: &[u8],
    need_uncompressed: bool,
    need_compressed: bool,
    need_offset: bool,
) -> Result<Option<Zip64Fields>> {
    let mut reader = BitReader::new(extra);
    while reader.remaining() >= 4 {
        let id = reader.read_u16()?;
        let size = reader.read_u16()? as usize;
        if id != ZIP64_EXTRA_ID {
            if reader.remaining() < size {
                break;
            }
            reader.read_aligned_bytes(size)?;
            continue;
        }

        let mut body = BitReader::new(reader.read_aligned_bytes(size.min(reader.remaining()))?);
        let mut fields = Zip64Fields::default();
        if need_uncompressed {
            fields.uncompressed_size = Some(body.read_u64()?);
        }
        if need_compressed {
            fields.compressed_size = Some(body.read_u64()?);
        }
        if need_offset {
            fields.local_header_offset = Some(body.read_u64()?);
        }
        return Ok(Some(fields));
    }
    Ok(None)
}

/// Check whether an extra-field blob carries a ZIP64 record at all.
///
/// The data-descriptor field widths follow the zip64-ness of the entry,
/// which the local header declares through this record's presence.
pub fn has_zip64(extra: &[u8]) -> bool {
    let mut reader = BitReader::new(extra);
    while reader.remaining() >= 4 {
        let id = match reader.read_u16() {
            Ok(id) => id,
            Err(_) => return false,
        };
        let size = match reader.read_u16() {
            Ok(size) => size as usize,
            Err(_) => return false,
        };
        if id == ZIP64_EXTRA_ID {
            return true;
        }
        if reader.remaining() < size || reader.read_aligned_bytes(size).is_err() {
            return false;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zip64_blob(values: &[u64]) -> Vec<u8> {
        let mut blob = Vec::new();
        blob.extend_from_slice(&ZIP64_EXTRA_ID.to_le_bytes());
        blob.extend_from_slice(&((values.len() * 8) as u16).to_le_bytes());
        for value in values {
            blob.extend_from_slice(&value.to_le_bytes());
        }
        blob
    }

    #[test]
    fn test_parse_all_three_fields() {
        let blob = zip64_blob(&[111, 222, 333]);
        let fields = parse_zip64(&blob, true, true, true).unwrap().unwrap();
        assert_eq!(fields.uncompressed_size, Some(111));
        assert_eq!(fields.compressed_size, Some(222));
        assert_eq!(fields.local_header_offset, Some(333));
    }

    #[test]
    fn test_parse_subset() {
        let blob = zip64_blob(&[999]);
        let fields = parse_zip64(&blob, false, true, false).unwrap().unwrap();
        assert_eq!(fields.compressed_size, Some(999));
        assert_eq!(fields.uncompressed_size, None);
    }

    #[test]
    fn test_skips_foreign_fields() {
        // An NTFS timestamp field (0x000a) before the ZIP64 record.
        let mut blob = Vec::new();
        blob.extend_from_slice(&0x000au16.to_le_bytes());
        blob.extend_from_slice(&4u16.to_le_bytes());
        blob.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        blob.extend_from_slice(&zip64_blob(&[42]));

        let fields = parse_zip64(&blob, true, false, false).unwrap().unwrap();
        assert_eq!(fields.uncompressed_size, Some(42));
        assert!(has_zip64(&blob));
    }

    #[test]
    fn test_absent_record() {
        assert!(parse_zip64(&[], true, true, true).unwrap().is_none());
        assert!(!has_zip64(&[]));

        let mut blob = Vec::new();
        blob.extend_from_slice(&0x000au16.to_le_bytes());
        blob.extend_from_slice(&2u16.to_le_bytes());
        blob.extend_from_slice(&[0, 0]);
        assert!(parse_zip64(&blob, true, false, false).unwrap().is_none());
        assert!(!has_zip64(&blob));
    }

    #[test]
    fn test_truncated_zip64_record() {
        // Record claims a u64 but carries only four bytes.
        let mut blob = Vec::new();
        blob.extend_from_slice(&ZIP64_EXTRA_ID.to_le_bytes());
        blob.extend_from_slice(&4u16.to_le_bytes());
        blob.extend_from_slice(&[1, 2, 3, 4]);
        assert!(parse_zip64(&blob, true, false, false).is_err());
    }
}
