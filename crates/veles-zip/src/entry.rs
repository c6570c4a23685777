//! ZIP archive entry.
//!
//! A [`ZipEntry`] carries the metadata of one central-directory record plus
//! a shared handle on the archive bytes. Reading the entry's data seeks to
//! its local header, reconciles the header against the central directory,
//! dispatches on the compression method and validates sizes and CRC32.

use std::sync::{Arc, OnceLock};

use veles_common::{crc, BitReader};

use crate::archive::Backing;
use crate::cp437;
use crate::zip::{self, extra, CompressionMethod, LocalFileHeader};
use crate::{Error, Result};

/// Host system ids from the high byte of `version_made_by`.
const HOST_MSDOS: u8 = 0;
const HOST_UNIX: u8 = 3;

/// MS-DOS directory attribute bit in the external attributes.
const DOS_ATTR_DIRECTORY: u32 = 0x10;

/// Central-directory fields of one entry, zip64-resolved.
#[derive(Debug, Clone)]
pub(crate) struct CentralRecord {
    pub version_made_by: u16,
    pub flags: u16,
    pub method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub local_header_offset: u64,
    pub external_attrs: u32,
    pub name_raw: Vec<u8>,
    pub comment_raw: Vec<u8>,
}

/// Local-header state resolved on first data access and cached.
#[derive(Debug)]
struct LocalInfo {
    crc32: u32,
    compressed_size: u64,
    uncompressed_size: u64,
    /// The local extra field carries a ZIP64 record, widening any
    /// trailing data-descriptor fields to 64 bits.
    zip64: bool,
    /// Absolute offset where the entry's data begins.
    data_offset: u64,
}

/// An entry (file or directory) within a ZIP archive.
#[derive(Debug)]
pub struct ZipEntry {
    backing: Arc<Backing>,
    name: String,
    comment: String,
    version_made_by: u16,
    flags: u16,
    method: u16,
    last_mod_time: u16,
    last_mod_date: u16,
    crc32: u32,
    compressed_size: u64,
    uncompressed_size: u64,
    local_header_offset: u64,
    external_attrs: u32,
    local: OnceLock<LocalInfo>,
}

impl ZipEntry {
    pub(crate) fn new(backing: Arc<Backing>, record: CentralRecord) -> Self {
        let utf8 = record.flags & zip::FLAG_UTF8 != 0;
        let decode = |raw: &[u8]| {
            if utf8 {
                String::from_utf8_lossy(raw).into_owned()
            } else {
                cp437::decode(raw)
            }
        };
        Self {
            name: decode(&record.name_raw),
            comment: decode(&record.comment_raw),
            backing,
            version_made_by: record.version_made_by,
            flags: record.flags,
            method: record.method,
            last_mod_time: record.last_mod_time,
            last_mod_date: record.last_mod_date,
            crc32: record.crc32,
            compressed_size: record.compressed_size,
            uncompressed_size: record.uncompressed_size,
            local_header_offset: record.local_header_offset,
            external_attrs: record.external_attrs,
            local: OnceLock::new(),
        }
    }

    /// Entry name, decoded from UTF-8 or CP437 per general-purpose bit 11.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entry comment from the central directory.
    #[inline]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Uncompressed size in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Compressed size in bytes.
    #[inline]
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Declared CRC32 of the uncompressed data.
    #[inline]
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// General purpose bit flags.
    #[inline]
    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// Compression method dispatch.
    #[inline]
    pub fn compression_method(&self) -> CompressionMethod {
        CompressionMethod::from_u16(self.method)
    }

    /// External file attributes, host-system specific.
    #[inline]
    pub fn attributes(&self) -> u32 {
        self.external_attrs
    }

    /// Host system id from the high byte of `version_made_by`.
    #[inline]
    pub fn host_system(&self) -> u8 {
        (self.version_made_by >> 8) as u8
    }

    /// Raw DOS modification time field.
    #[inline]
    pub fn last_mod_time(&self) -> u16 {
        self.last_mod_time
    }

    /// Raw DOS modification date field.
    #[inline]
    pub fn last_mod_date(&self) -> u16 {
        self.last_mod_date
    }

    /// DOS time bit fields as (hour, minute, second).
    pub fn mod_time_parts(&self) -> (u8, u8, u8) {
        let hour = (self.last_mod_time >> 11) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        (hour, minute, second)
    }

    /// DOS date bit fields as (year, month, day).
    pub fn mod_date_parts(&self) -> (u16, u8, u8) {
        let year = (self.last_mod_date >> 9) + 1980;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let day = (self.last_mod_date & 0x1F) as u8;
        (year, month, day)
    }

    /// Check if this entry represents a directory.
    ///
    /// MS-DOS and UNIX archives declare directories through the external
    /// attribute bit; other host systems fall back to the trailing-slash
    /// convention for empty entries.
    pub fn is_directory(&self) -> bool {
        match self.host_system() {
            HOST_MSDOS | HOST_UNIX => self.external_attrs & DOS_ATTR_DIRECTORY != 0,
            _ => self.uncompressed_size == 0 && self.name.ends_with('/'),
        }
    }

    /// Whether sizes and CRC trail the data in a descriptor record.
    #[inline]
    fn has_data_descriptor(&self) -> bool {
        self.flags & zip::FLAG_DATA_DESCRIPTOR != 0
    }

    /// Decompress and validate this entry's data.
    ///
    /// Seeks a fresh cursor over the shared archive bytes to the entry's
    /// local header, so concurrent reads of sibling entries are safe.
    pub fn data(&self) -> Result<Vec<u8>> {
        if self.flags & zip::FLAG_ENCRYPTED != 0 {
            return Err(Error::UnsupportedFeature("encrypted entry"));
        }

        let local = self.local_info()?;
        let (declared_comp, declared_uncomp, declared_crc) = if self.has_data_descriptor() {
            // Local size fields are zero; the central directory is
            // authoritative until the trailing descriptor is read.
            (self.compressed_size, self.uncompressed_size, self.crc32)
        } else {
            (local.compressed_size, local.uncompressed_size, local.crc32)
        };

        let mut reader = BitReader::new(self.backing.as_slice());
        reader.seek(local.data_offset)?;
        let data_start = reader.byte_position() as u64;

        let decoded = match self.compression_method() {
            CompressionMethod::Store => reader
                .read_aligned_bytes(declared_uncomp as usize)?
                .to_vec(),
            CompressionMethod::Deflate => {
                let out = veles_flate::inflate(&mut reader, Some(declared_uncomp as usize))?;
                reader.align_to_byte();
                out
            }
            CompressionMethod::Bzip2
            | CompressionMethod::Lzma
            | CompressionMethod::Unsupported(_) => {
                return Err(Error::CompressionNotSupported(self.method));
            }
        };

        let real_comp_size = reader.byte_position() as u64 - data_start;

        if self.has_data_descriptor() {
            self.skip_data_descriptor(&mut reader, local.zip64)?;
        }

        if declared_comp != real_comp_size {
            return Err(Error::WrongSize {
                declared: declared_comp,
                actual: real_comp_size,
            });
        }
        if declared_uncomp != decoded.len() as u64 {
            return Err(Error::WrongSize {
                declared: declared_uncomp,
                actual: decoded.len() as u64,
            });
        }

        let actual_crc = crc::checksum(&decoded);
        if actual_crc != declared_crc {
            return Err(Error::WrongCrc32 {
                declared: declared_crc,
                actual: actual_crc,
                data: decoded,
            });
        }

        Ok(decoded)
    }

    /// Consume the trailing data descriptor.
    ///
    /// The 0x08074b50 signature is optional; without it the CRC field sits
    /// where the signature would be. Field widths are 64-bit when the entry
    /// is zip64 (APPNOTE §4.3.9).
    fn skip_data_descriptor(&self, reader: &mut BitReader, zip64: bool) -> Result<()> {
        if let Ok(word) = reader.peek_u32() {
            if word == zip::DATA_DESCRIPTOR_SIGNATURE {
                reader.read_u32()?;
            }
        }
        let _crc32 = reader.read_u32()?;
        if zip64 {
            let _compressed = reader.read_u64()?;
            let _uncompressed = reader.read_u64()?;
        } else {
            let _compressed = reader.read_u32()?;
            let _uncompressed = reader.read_u32()?;
        }
        Ok(())
    }

    /// Parse the local header on first access, reconcile it against the
    /// central directory and cache the result.
    fn local_info(&self) -> Result<&LocalInfo> {
        if let Some(info) = self.local.get() {
            return Ok(info);
        }
        let info = self.parse_local_header()?;
        Ok(self.local.get_or_init(|| info))
    }

    fn parse_local_header(&self) -> Result<LocalInfo> {
        let mut reader = BitReader::new(self.backing.as_slice());
        reader.seek(self.local_header_offset)?;

        let signature = reader.read_u32()?;
        if signature != LocalFileHeader::SIGNATURE {
            return Err(Error::BadSignature {
                expected: LocalFileHeader::SIGNATURE,
                actual: signature,
            });
        }

        let header: LocalFileHeader = reader.read_struct()?;
        reader.read_aligned_bytes(header.file_name_length as usize)?;
        let extra_field = reader.read_aligned_bytes(header.extra_field_length as usize)?;
        let data_offset = reader.byte_position() as u64;

        // The four reconciliation fields must echo the central directory.
        if header.flags != self.flags {
            return Err(Error::WrongLocalHeader { field: "flags" });
        }
        if header.compression_method != self.method {
            return Err(Error::WrongLocalHeader {
                field: "compression method",
            });
        }
        if header.last_mod_time != self.last_mod_time {
            return Err(Error::WrongLocalHeader {
                field: "modification time",
            });
        }
        if header.last_mod_date != self.last_mod_date {
            return Err(Error::WrongLocalHeader {
                field: "modification date",
            });
        }

        let zip64 = extra::has_zip64(extra_field);
        let mut compressed_size = header.compressed_size as u64;
        let mut uncompressed_size = header.uncompressed_size as u64;
        if let Some(fields) = extra::parse_zip64(
            extra_field,
            header.uncompressed_size == u32::MAX,
            header.compressed_size == u32::MAX,
            false,
        )? {
            if let Some(size) = fields.uncompressed_size {
                uncompressed_size = size;
            }
            if let Some(size) = fields.compressed_size {
                compressed_size = size;
            }
        }

        Ok(LocalInfo {
            crc32: header.crc32,
            compressed_size,
            uncompressed_size,
            zip64,
            data_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with(version_made_by: u16, external_attrs: u32, name: &str, size: u64) -> ZipEntry {
        ZipEntry::new(
            Arc::new(Backing::Owned(Vec::new())),
            CentralRecord {
                version_made_by,
                flags: 0,
                method: 0,
                last_mod_time: 0,
                last_mod_date: 0,
                crc32: 0,
                compressed_size: size,
                uncompressed_size: size,
                local_header_offset: 0,
                external_attrs,
                name_raw: name.as_bytes().to_vec(),
                comment_raw: Vec::new(),
            },
        )
    }

    #[test]
    fn test_is_directory_dos_attr() {
        assert!(entry_with(0, 0x10, "dir/", 0).is_directory());
        assert!(!entry_with(0, 0x20, "file.txt", 3).is_directory());
    }

    #[test]
    fn test_is_directory_unix_attr() {
        let entry = entry_with(3 << 8, 0o040755 << 16 | 0x10, "dir/", 0);
        assert!(entry.is_directory());
    }

    #[test]
    fn test_is_directory_other_host_trailing_slash() {
        // Host 10 (NTFS): attribute bit ignored, name convention decides.
        assert!(entry_with(10 << 8, 0, "dir/", 0).is_directory());
        assert!(!entry_with(10 << 8, 0x10, "file", 0).is_directory());
        assert!(!entry_with(10 << 8, 0, "dir/", 5).is_directory());
    }

    #[test]
    fn test_dos_time_bit_fields() {
        // 1991-06-02 14:30:52 in DOS encoding.
        let mut entry = entry_with(0, 0, "t", 0);
        entry.last_mod_time = (14 << 11) | (30 << 5) | (52 / 2);
        entry.last_mod_date = ((1991 - 1980) << 9) | (6 << 5) | 2;
        assert_eq!(entry.mod_time_parts(), (14, 30, 52));
        assert_eq!(entry.mod_date_parts(), (1991, 6, 2));
    }

    #[test]
    fn test_cp437_name_decoding() {
        let entry = ZipEntry::new(
            Arc::new(Backing::Owned(Vec::new())),
            CentralRecord {
                version_made_by: 0,
                flags: 0,
                method: 0,
                last_mod_time: 0,
                last_mod_date: 0,
                crc32: 0,
                compressed_size: 0,
                uncompressed_size: 0,
                local_header_offset: 0,
                external_attrs: 0,
                name_raw: vec![0x82, b't', 0x82, b'.', b't', b'x', b't'],
                comment_raw: Vec::new(),
            },
        );
        assert_eq!(entry.name(), "été.txt");
    }
}
