//! Accessors over a 512-byte ustar header block.
//!
//! Fields are read straight out of the byte slice at their fixed offsets,
//! so no struct is ever overlaid on the input buffer:
//!
//! ```plain
//! offset  len  field
//!      0  100  name
//!    124   12  size      (octal ASCII, or GNU base-256)
//!    148    8  chksum    (octal ASCII)
//!    156    1  typeflag
//!    257    6  magic     ("ustar")
//!    345  155  prefix
//! ```

use std::borrow::Cow;

/// Size of a header block, and the alignment of every record in an archive.
pub const BLOCK_LEN: usize = 512;

const NAME: std::ops::Range<usize> = 0..100;
const SIZE: std::ops::Range<usize> = 124..136;
const CHKSUM: std::ops::Range<usize> = 148..156;
const TYPEFLAG: usize = 156;
const MAGIC: std::ops::Range<usize> = 257..263;
const PREFIX: std::ops::Range<usize> = 345..500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    #[error("mismatching checksum: expected {expected:#010x} but found {found:#010x}")]
    ChecksumMismatch { expected: u32, found: u32 },

    #[error("size field is not a valid number")]
    InvalidSize,
}

/// Sum all header bytes, counting the checksum field as eight ASCII spaces.
pub fn compute_checksum(block: &[u8; BLOCK_LEN]) -> u32 {
    let before: u32 = block[..CHKSUM.start].iter().map(|&b| u32::from(b)).sum();
    let after: u32 = block[CHKSUM.end..].iter().map(|&b| u32::from(b)).sum();

    before + 8 * u32::from(b' ') + after
}

/// A validated view of a header block.
#[derive(Debug, Clone, Copy)]
pub struct RecordHeader<'a> {
    block: &'a [u8; BLOCK_LEN],
    payload_size: u64,
}

impl<'a> RecordHeader<'a> {
    /// Validate the checksum and decode the payload size.
    pub fn parse(block: &'a [u8; BLOCK_LEN]) -> Result<Self, HeaderError> {
        let expected = compute_checksum(block);
        let found = parse_octal(&block[CHKSUM])
            .and_then(|found| u32::try_from(found).ok())
            .unwrap_or(u32::MAX);

        if expected != found {
            return Err(HeaderError::ChecksumMismatch { expected, found });
        }

        let payload_size = parse_numeric(&block[SIZE]).ok_or(HeaderError::InvalidSize)?;

        Ok(Self {
            block,
            payload_size,
        })
    }

    pub fn payload_size(&self) -> u64 {
        self.payload_size
    }

    /// Payload size rounded up to the next block boundary.
    pub fn padded_payload_size(&self) -> Option<u64> {
        let block_len = BLOCK_LEN as u64;
        self.payload_size
            .checked_add(block_len - 1)
            .map(|size| size / block_len * block_len)
    }

    /// Bytes from the start of this header to the start of the next one.
    pub fn span(&self) -> Option<u64> {
        self.padded_payload_size()
            .and_then(|size| size.checked_add(BLOCK_LEN as u64))
    }

    pub fn name(&self) -> &'a [u8] {
        trim_nul(&self.block[NAME])
    }

    pub fn typeflag(&self) -> u8 {
        self.block[TYPEFLAG]
    }

    pub fn is_ustar(&self) -> bool {
        self.block[MAGIC].starts_with(b"ustar")
    }

    /// The entry path, joining the ustar prefix when one is present.
    pub fn path(&self) -> Cow<'a, str> {
        let name = String::from_utf8_lossy(self.name());
        let prefix = if self.is_ustar() {
            trim_nul(&self.block[PREFIX])
        } else {
            &[]
        };

        if prefix.is_empty() {
            name
        } else {
            Cow::Owned(format!("{}/{}", String::from_utf8_lossy(prefix), name))
        }
    }
}

fn trim_nul(field: &[u8]) -> &[u8] {
    let len = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..len]
}

/// Decode a numeric field, either octal ASCII or GNU base-256 (high bit
/// of the first byte set, remaining bits big-endian).
fn parse_numeric(field: &[u8]) -> Option<u64> {
    match field.split_first() {
        Some((&first, rest)) if first & 0x80 != 0 => {
            // Negative base-256 values are never valid sizes
            if first & 0x40 != 0 {
                return None;
            }

            rest.iter().try_fold(u64::from(first & 0x3f), |acc, &b| {
                acc.checked_mul(256)?.checked_add(u64::from(b))
            })
        }
        _ => parse_octal(field),
    }
}

/// Decode octal digits after any leading spaces, stopping at the first
/// non-octal byte. An empty field decodes to zero.
fn parse_octal(field: &[u8]) -> Option<u64> {
    field
        .iter()
        .skip_while(|&&b| b == b' ')
        .take_while(|&&b| (b'0'..=b'7').contains(&b))
        .try_fold(0u64, |acc, &b| {
            acc.checked_mul(8)?.checked_add(u64::from(b - b'0'))
        })
}
