//! DEFLATE decompression (RFC 1951).
//!
//! Decodes the raw DEFLATE block stream: stored, fixed-Huffman and
//! dynamic-Huffman blocks with LZ77 back-references. The zlib and gzip
//! wrappers are not handled here; ZIP entries carry raw streams.

use std::sync::LazyLock;

use veles_common::BitReader;

use crate::huffman::{lengths_from_bootstrap, Decoder};
use crate::{Error, Result};

/// Base match lengths for literal/length codes 257-285.
const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];

/// Extra bits for literal/length codes 257-285.
const LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// Base match distances for distance codes 0-29.
const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Extra bits for distance codes 0-29.
const DISTANCE_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Transmission order of the code-length alphabet in dynamic headers.
const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// End-of-block symbol in the literal/length alphabet.
const END_OF_BLOCK: u16 = 256;

/// Fixed literal/length decoder (RFC 1951 §3.2.6), built once.
static FIXED_LITERAL: LazyLock<Decoder> = LazyLock::new(|| {
    let lengths = lengths_from_bootstrap(&[(0, 8), (144, 9), (256, 7), (280, 8), (288, -1)]);
    Decoder::from_lengths(&lengths).expect("fixed literal table is well-formed")
});

/// Fixed distance decoder: 32 five-bit codes, built once.
static FIXED_DISTANCE: LazyLock<Decoder> = LazyLock::new(|| {
    let lengths = lengths_from_bootstrap(&[(0, 5), (32, -1)]);
    Decoder::from_lengths(&lengths).expect("fixed distance table is well-formed")
});

/// Decompress a raw DEFLATE stream from the reader's current position.
///
/// The cursor is left just past the final block's last bit; callers that
/// need a byte-exact compressed size align to the next boundary afterwards.
/// `size_hint` pre-allocates the output when the caller knows the
/// uncompressed size.
pub fn inflate(reader: &mut BitReader, size_hint: Option<usize>) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(size_hint.unwrap_or(0));

    loop {
        let bfinal = reader.read_bit()?;
        let btype = reader.read_bits(2)?;

        match btype {
            0 => inflate_stored(reader, &mut output)?,
            1 => inflate_block(reader, &mut output, &FIXED_LITERAL, &FIXED_DISTANCE)?,
            2 => {
                let (literal, distance) = read_dynamic_tables(reader)?;
                inflate_block(reader, &mut output, &literal, &distance)?;
            }
            _ => return Err(Error::ReservedBlockType),
        }

        if bfinal == 1 {
            break;
        }
    }

    Ok(output)
}

/// Decompress a complete in-memory DEFLATE stream.
pub fn inflate_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut reader = BitReader::new(data);
    inflate(&mut reader, None)
}

/// Stored block: byte-aligned LEN/NLEN header followed by raw bytes.
fn inflate_stored(reader: &mut BitReader, output: &mut Vec<u8>) -> Result<()> {
    reader.align_to_byte();
    let len = reader.read_u16()?;
    let nlen = reader.read_u16()?;
    if nlen != !len {
        return Err(Error::StoredLengthMismatch { len, nlen });
    }
    output.extend_from_slice(reader.read_aligned_bytes(len as usize)?);
    Ok(())
}

/// Read the dynamic-block header and build its two Huffman decoders.
fn read_dynamic_tables(reader: &mut BitReader) -> Result<(Decoder, Decoder)> {
    let hlit = reader.read_bits(5)? as usize + 257;
    let hdist = reader.read_bits(5)? as usize + 1;
    let hclen = reader.read_bits(4)? as usize + 4;

    let mut cl_lengths = [0u8; 19];
    for &slot in CODE_LENGTH_ORDER.iter().take(hclen) {
        cl_lengths[slot] = reader.read_bits(3)? as u8;
    }
    let cl_decoder = Decoder::from_lengths(&cl_lengths)?;

    let mut lengths = vec![0u8; hlit + hdist];
    let mut filled = 0usize;
    while filled < lengths.len() {
        let symbol = cl_decoder.decode(reader)?;
        match symbol {
            0..=15 => {
                lengths[filled] = symbol as u8;
                filled += 1;
            }
            16 => {
                if filled == 0 {
                    return Err(Error::RepeatWithoutPrior);
                }
                let repeat = reader.read_bits(2)? as usize + 3;
                if filled + repeat > lengths.len() {
                    return Err(Error::BadLengthRun);
                }
                let prev = lengths[filled - 1];
                lengths[filled..filled + repeat].fill(prev);
                filled += repeat;
            }
            17 => {
                let repeat = reader.read_bits(3)? as usize + 3;
                if filled + repeat > lengths.len() {
                    return Err(Error::BadLengthRun);
                }
                filled += repeat;
            }
            18 => {
                let repeat = reader.read_bits(7)? as usize + 11;
                if filled + repeat > lengths.len() {
                    return Err(Error::BadLengthRun);
                }
                filled += repeat;
            }
            other => return Err(Error::BadSymbol(other)),
        }
    }

    let literal = Decoder::from_lengths(&lengths[..hlit])?;
    let distance = Decoder::from_lengths(&lengths[hlit..])?;
    Ok((literal, distance))
}

/// Decode literals and back-references until the end-of-block symbol.
fn inflate_block(
    reader: &mut BitReader,
    output: &mut Vec<u8>,
    literal: &Decoder,
    distance: &Decoder,
) -> Result<()> {
    loop {
        let symbol = literal.decode(reader)?;
        match symbol {
            0..=255 => output.push(symbol as u8),
            END_OF_BLOCK => return Ok(()),
            257..=285 => {
                let index = (symbol - 257) as usize;
                let length = LENGTH_BASE[index] as usize
                    + reader.read_bits(LENGTH_EXTRA[index] as u32)? as usize;

                let dist_symbol = distance.decode(reader)?;
                if dist_symbol >= 30 {
                    return Err(Error::BadDistance(dist_symbol));
                }
                let index = dist_symbol as usize;
                let dist = DISTANCE_BASE[index] as usize
                    + reader.read_bits(DISTANCE_EXTRA[index] as u32)? as usize;

                if dist > output.len() {
                    return Err(Error::DistanceTooFar {
                        distance: dist,
                        available: output.len(),
                    });
                }
                // Byte-by-byte so overlapping matches replicate correctly.
                for _ in 0..length {
                    let byte = output[output.len() - dist];
                    output.push(byte);
                }
            }
            other => return Err(Error::BadSymbol(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use veles_common::BitWriter;

    use super::*;
    use crate::huffman::Encoder;

    fn reference_deflate(data: &[u8], level: u32) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn fixed_literal_encoder() -> Encoder {
        let lengths = lengths_from_bootstrap(&[(0, 8), (144, 9), (256, 7), (280, 8), (288, -1)]);
        Encoder::from_lengths(&lengths).unwrap()
    }

    fn fixed_distance_encoder() -> Encoder {
        let lengths = lengths_from_bootstrap(&[(0, 5), (32, -1)]);
        Encoder::from_lengths(&lengths).unwrap()
    }

    #[test]
    fn test_stored_block_hello() {
        let data = [0x01, 0x05, 0x00, 0xFA, 0xFF, b'H', b'e', b'l', b'l', b'o'];
        assert_eq!(inflate_bytes(&data).unwrap(), b"Hello");
    }

    #[test]
    fn test_stored_block_empty() {
        // LEN == 0 is a valid stored block producing no output.
        let data = [0x01, 0x00, 0x00, 0xFF, 0xFF];
        assert_eq!(inflate_bytes(&data).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_stored_len_nlen_mismatch() {
        let data = [0x01, 0x05, 0x00, 0xFA, 0xFE, b'H', b'e', b'l', b'l', b'o'];
        assert!(matches!(
            inflate_bytes(&data),
            Err(Error::StoredLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_multiple_stored_blocks() {
        let mut data = vec![0x00, 0x02, 0x00, 0xFD, 0xFF, b'a', b'b'];
        data.extend_from_slice(&[0x01, 0x02, 0x00, 0xFD, 0xFF, b'c', b'd']);
        assert_eq!(inflate_bytes(&data).unwrap(), b"abcd");
    }

    #[test]
    fn test_reserved_block_type() {
        // BFINAL=1, BTYPE=11.
        let data = [0b0000_0111];
        assert!(matches!(inflate_bytes(&data), Err(Error::ReservedBlockType)));
    }

    #[test]
    fn test_fixed_single_literal() {
        let literal = fixed_literal_encoder();
        let mut writer = BitWriter::new();
        writer.write_bit(1); // BFINAL
        writer.write_bits(0b01, 2); // BTYPE fixed
        literal.encode(b'a' as u16, &mut writer).unwrap();
        literal.encode(END_OF_BLOCK, &mut writer).unwrap();
        let stream = writer.finish();

        assert_eq!(inflate_bytes(&stream).unwrap(), b"a");
    }

    #[test]
    fn test_fixed_overlapping_match_is_a_run() {
        // 'a' followed by a length-6 match at distance 1 self-overlaps
        // into a run of seven 'a's.
        let literal = fixed_literal_encoder();
        let distance = fixed_distance_encoder();
        let mut writer = BitWriter::new();
        writer.write_bit(1);
        writer.write_bits(0b01, 2);
        literal.encode(b'a' as u16, &mut writer).unwrap();
        literal.encode(260, &mut writer).unwrap(); // length base 6
        distance.encode(0, &mut writer).unwrap(); // distance 1
        literal.encode(END_OF_BLOCK, &mut writer).unwrap();

        assert_eq!(inflate_bytes(&writer.finish()).unwrap(), b"aaaaaaa");
    }

    #[test]
    fn test_fixed_match_distance_equals_length() {
        let literal = fixed_literal_encoder();
        let distance = fixed_distance_encoder();
        let mut writer = BitWriter::new();
        writer.write_bit(1);
        writer.write_bits(0b01, 2);
        for byte in *b"abc" {
            literal.encode(byte as u16, &mut writer).unwrap();
        }
        literal.encode(257, &mut writer).unwrap(); // length 3
        distance.encode(2, &mut writer).unwrap(); // distance base 3
        literal.encode(END_OF_BLOCK, &mut writer).unwrap();

        assert_eq!(inflate_bytes(&writer.finish()).unwrap(), b"abcabc");
    }

    #[test]
    fn test_distance_before_output_start() {
        let literal = fixed_literal_encoder();
        let distance = fixed_distance_encoder();
        let mut writer = BitWriter::new();
        writer.write_bit(1);
        writer.write_bits(0b01, 2);
        literal.encode(257, &mut writer).unwrap();
        distance.encode(0, &mut writer).unwrap();
        literal.encode(END_OF_BLOCK, &mut writer).unwrap();

        assert!(matches!(
            inflate_bytes(&writer.finish()),
            Err(Error::DistanceTooFar { distance: 1, available: 0 })
        ));
    }

    #[test]
    fn test_reference_streams_roundtrip() {
        for size in [1usize, 10, 100, 1000, 10_000] {
            let data: Vec<u8> = (0..size).map(|i| (i * 17 % 251) as u8).collect();
            for level in [1, 6, 9] {
                let compressed = reference_deflate(&data, level);
                assert_eq!(
                    inflate_bytes(&compressed).unwrap(),
                    data,
                    "size {size} level {level}"
                );
            }
        }
    }

    #[test]
    fn test_reference_repetitive_stream() {
        let data = vec![42u8; 65_000];
        let compressed = reference_deflate(&data, 6);
        assert_eq!(inflate_bytes(&compressed).unwrap(), data);
    }

    #[test]
    fn test_reference_text_stream() {
        let data: Vec<u8> = b"the quick brown fox jumps over the lazy dog. "
            .iter()
            .cycle()
            .take(5000)
            .copied()
            .collect();
        let compressed = reference_deflate(&data, 9);
        assert_eq!(inflate_bytes(&compressed).unwrap(), data);
    }

    #[test]
    fn test_redecode_after_seek_is_identical() {
        let data: Vec<u8> = (0..4000u32).map(|i| (i % 256) as u8).collect();
        let compressed = reference_deflate(&data, 6);

        let mut reader = BitReader::new(&compressed);
        let first = inflate(&mut reader, None).unwrap();
        reader.seek(0).unwrap();
        let second = inflate(&mut reader, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, data);
    }

    #[test]
    fn test_size_hint_does_not_change_output() {
        let data = vec![7u8; 512];
        let compressed = reference_deflate(&data, 6);
        let mut reader = BitReader::new(&compressed);
        assert_eq!(inflate(&mut reader, Some(512)).unwrap(), data);
    }

    #[test]
    fn test_truncated_stream() {
        let data = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut compressed = reference_deflate(&data, 6);
        compressed.truncate(compressed.len() - 3);
        assert!(inflate_bytes(&compressed).is_err());
    }

    #[test]
    fn test_dynamic_repeat_at_start_rejected() {
        // Dynamic header whose first code-length symbol is 16.
        let mut writer = BitWriter::new();
        writer.write_bit(1);
        writer.write_bits(0b10, 2);
        writer.write_bits(0, 5); // HLIT = 257
        writer.write_bits(0, 5); // HDIST = 1
        writer.write_bits(15, 4); // HCLEN = 19
        // Code-length lengths: 1 bit for symbols 16 and 17, 0 elsewhere.
        for slot in CODE_LENGTH_ORDER {
            let bits = if slot == 16 || slot == 17 { 1 } else { 0 };
            writer.write_bits(bits, 3);
        }
        // Symbol 16 is code 0 under that table.
        writer.write_bits(0, 1);
        let stream = writer.finish();

        assert!(matches!(
            inflate_bytes(&stream),
            Err(Error::RepeatWithoutPrior)
        ));
    }

    #[test]
    fn test_fixed_tables_shape() {
        assert_eq!(FIXED_LITERAL.max_code_length(), 9);
        assert_eq!(FIXED_DISTANCE.max_code_length(), 5);
    }
}
