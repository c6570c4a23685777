//! ZIP archive reader.
//!
//! Opens an archive from a memory-mapped file or an owned buffer, locates
//! the end-of-central-directory record, resolves ZIP64 extensions and
//! eagerly parses the central directory into entries. Entries share the
//! archive bytes through an `Arc`, so each data read runs on its own
//! cursor and reads never contend.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;
use veles_common::memchr::memmem;
use veles_common::BitReader;

use crate::entry::{CentralRecord, ZipEntry};
use crate::zip::{
    extra, CentralDirectoryHeader, Eocd64Locator, Eocd64Record, EocdRecord,
};
use crate::{cp437, Error, Result};

/// Maximum trailing-comment size the EOCD search must cover.
const MAX_COMMENT_SIZE: usize = 65_535;

/// How far before the EOCD record the ZIP64 locator is searched for.
const LOCATOR_SEARCH_SPAN: usize = 128;

/// Read-only archive byte backing shared between the archive handle and
/// every entry.
#[derive(Debug)]
pub(crate) enum Backing {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Backing {
    #[inline]
    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            Self::Owned(bytes) => bytes,
            Self::Mapped(mmap) => mmap,
        }
    }
}

/// A parsed ZIP archive.
pub struct ZipArchive {
    backing: Arc<Backing>,
    comment: String,
    entries: Vec<ZipEntry>,
}

impl ZipArchive {
    /// Open an archive by memory-mapping a file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Self::parse(Arc::new(Backing::Mapped(mmap)))
    }

    /// Open an archive held in an owned byte buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::parse(Arc::new(Backing::Owned(bytes)))
    }

    /// Number of entries in the central directory.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the archive holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in central-directory order.
    #[inline]
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Get an entry by index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&ZipEntry> {
        self.entries.get(index)
    }

    /// Find an entry by exact name.
    pub fn find(&self, name: &str) -> Option<&ZipEntry> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    /// Archive comment from the end-of-central-directory record.
    #[inline]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// The raw archive bytes backing this handle.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.backing.as_slice()
    }

    /// Decode every entry concurrently, one worker cursor per entry.
    #[cfg(feature = "parallel")]
    pub fn read_parallel(&self) -> Vec<Result<Vec<u8>>> {
        use rayon::prelude::*;

        self.entries.par_iter().map(|entry| entry.data()).collect()
    }

    fn parse(backing: Arc<Backing>) -> Result<Self> {
        let data = backing.as_slice();
        let eocd_offset = Self::find_eocd(data)?;

        let mut reader = BitReader::new(data);
        reader.seek(eocd_offset as u64 + 4)?;
        let eocd: EocdRecord = reader.read_struct()?;
        let comment_raw = reader
            .read_aligned_bytes(eocd.comment_length as usize)?
            .to_vec();

        if eocd.disk_number != 0 || eocd.central_dir_disk != 0 {
            return Err(Error::UnsupportedFeature("multi-disk archive"));
        }

        let (entry_count, cd_offset) = if eocd.is_zip64() {
            Self::read_zip64_eocd(data, eocd_offset)?
        } else {
            (
                eocd.central_dir_count_total as u64,
                eocd.central_dir_offset as u64,
            )
        };

        reader.seek(cd_offset)?;
        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            let record = Self::read_central_record(&mut reader)?;
            entries.push(ZipEntry::new(Arc::clone(&backing), record));
        }

        Ok(Self {
            backing,
            comment: cp437::decode(&comment_raw),
            entries,
        })
    }

    /// Find the EOCD record by scanning backwards over the trailing
    /// comment span, cross-checking each candidate's comment length.
    fn find_eocd(data: &[u8]) -> Result<usize> {
        let search_start = data
            .len()
            .saturating_sub(MAX_COMMENT_SIZE + EocdRecord::MIN_SIZE);
        let window = &data[search_start..];

        for pos in memmem::rfind_iter(window, &EocdRecord::MAGIC) {
            let offset = search_start + pos;
            if offset + EocdRecord::MIN_SIZE > data.len() {
                continue;
            }
            let comment_len =
                u16::from_le_bytes([data[offset + 20], data[offset + 21]]) as usize;
            if offset + EocdRecord::MIN_SIZE + comment_len == data.len() {
                return Ok(offset);
            }
        }
        Err(Error::EocdNotFound)
    }

    /// Resolve entry count and central-directory offset through the ZIP64
    /// locator and EOCD records.
    fn read_zip64_eocd(data: &[u8], eocd_offset: usize) -> Result<(u64, u64)> {
        let search_start = eocd_offset.saturating_sub(LOCATOR_SEARCH_SPAN);
        let locator_offset = (search_start..eocd_offset)
            .rev()
            .find(|&i| i + 4 <= data.len() && data[i..i + 4] == Eocd64Locator::MAGIC)
            .ok_or(Error::Zip64EocdNotFound)?;

        let mut reader = BitReader::new(data);
        reader.seek(locator_offset as u64 + 4)?;
        let locator: Eocd64Locator = reader.read_struct()?;
        if locator.total_disks > 1 {
            return Err(Error::UnsupportedFeature("multi-disk archive"));
        }

        reader.seek(locator.zip64_eocd_offset)?;
        let signature = reader.read_u32()?;
        if signature != Eocd64Record::SIGNATURE {
            return Err(Error::BadSignature {
                expected: Eocd64Record::SIGNATURE,
                actual: signature,
            });
        }
        let eocd64: Eocd64Record = reader.read_struct()?;

        Ok((eocd64.central_dir_count_total, eocd64.central_dir_offset))
    }

    /// Read one central-directory record, resolving its ZIP64 extra field.
    fn read_central_record(reader: &mut BitReader) -> Result<CentralRecord> {
        let signature = reader.read_u32()?;
        if signature != CentralDirectoryHeader::SIGNATURE {
            return Err(Error::BadSignature {
                expected: CentralDirectoryHeader::SIGNATURE,
                actual: signature,
            });
        }

        let header: CentralDirectoryHeader = reader.read_struct()?;
        let name_raw = reader
            .read_aligned_bytes(header.file_name_length as usize)?
            .to_vec();
        let extra_field = reader.read_aligned_bytes(header.extra_field_length as usize)?;
        let comment_raw = reader
            .read_aligned_bytes(header.file_comment_length as usize)?
            .to_vec();

        let need_uncompressed = header.uncompressed_size == u32::MAX;
        let need_compressed = header.compressed_size == u32::MAX;
        let need_offset = header.local_header_offset == u32::MAX;

        let mut uncompressed_size = header.uncompressed_size as u64;
        let mut compressed_size = header.compressed_size as u64;
        let mut local_header_offset = header.local_header_offset as u64;

        if need_uncompressed || need_compressed || need_offset {
            let fields =
                extra::parse_zip64(extra_field, need_uncompressed, need_compressed, need_offset)?
                    .ok_or(Error::UnsupportedFeature(
                        "zip64 sentinel without extended information field",
                    ))?;
            if let Some(size) = fields.uncompressed_size {
                uncompressed_size = size;
            }
            if let Some(size) = fields.compressed_size {
                compressed_size = size;
            }
            if let Some(offset) = fields.local_header_offset {
                local_header_offset = offset;
            }
        }

        Ok(CentralRecord {
            version_made_by: header.version_made_by,
            flags: header.flags,
            method: header.compression_method,
            last_mod_time: header.last_mod_time,
            last_mod_date: header.last_mod_date,
            crc32: header.crc32,
            compressed_size,
            uncompressed_size,
            local_header_offset,
            external_attrs: header.external_attrs,
            name_raw,
            comment_raw,
        })
    }
}

impl std::fmt::Debug for ZipArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipArchive")
            .field("entries", &self.entries.len())
            .field("comment", &self.comment)
            .finish()
    }
}
