#![allow(unused)]

use proptest::prelude::*;

pub type Data = easy_hex::Hex<Vec<u8>>;

pub const BLOCK_LEN: usize = 512;
pub const MAX_PAYLOAD_LENGTH: usize = 3000;
pub const MAX_ENTRIES: usize = 12;

/// A ustar header block for a regular file, with a valid checksum.
pub fn tar_header(name: &str, size: u64) -> [u8; BLOCK_LEN] {
    let mut header = [0u8; BLOCK_LEN];

    header[..name.len()].copy_from_slice(name.as_bytes());
    header[100..108].copy_from_slice(b"0000644\0");
    header[108..116].copy_from_slice(b"0001750\0");
    header[116..124].copy_from_slice(b"0001750\0");
    header[124..136].copy_from_slice(format!("{size:011o}\0").as_bytes());
    header[136..148].copy_from_slice(b"14712345670\0");
    header[156] = b'0';
    header[257..263].copy_from_slice(b"ustar\0");
    header[263..265].copy_from_slice(b"00");

    set_checksum(&mut header);
    header
}

/// Recompute and store the checksum of a header block.
pub fn set_checksum(header: &mut [u8; BLOCK_LEN]) {
    header[148..156].copy_from_slice(b"        ");
    let sum: u32 = header.iter().map(|&b| u32::from(b)).sum();
    header[148..156].copy_from_slice(format!("{sum:06o}\0 ").as_bytes());
}

/// A header followed by the payload, zero-padded to a block boundary.
pub fn tar_record(name: &str, payload: &[u8]) -> Vec<u8> {
    let mut record = tar_header(name, payload.len() as u64).to_vec();
    record.extend_from_slice(payload);
    record.resize(record.len().next_multiple_of(BLOCK_LEN), 0);
    record
}

/// A complete archive: one record per payload, then two zero blocks.
pub fn tar_archive(payloads: &[Data]) -> Vec<u8> {
    let mut archive = vec![];
    for (index, payload) in payloads.iter().enumerate() {
        archive.extend(tar_record(&format!("file-{index}.bin"), payload));
    }
    archive.resize(archive.len() + 2 * BLOCK_LEN, 0);
    archive
}

/// Byte offsets of every record start in `tar_archive(payloads)`,
/// including the two trailing zero blocks and the end of the archive.
pub fn record_boundaries(payloads: &[Data]) -> Vec<usize> {
    let mut boundaries = vec![0];
    let mut pos = 0;
    for payload in payloads {
        pos += BLOCK_LEN + payload.len().next_multiple_of(BLOCK_LEN);
        boundaries.push(pos);
    }
    boundaries.push(pos + BLOCK_LEN);
    boundaries.push(pos + 2 * BLOCK_LEN);
    boundaries
}

pub fn arb_payload() -> impl Strategy<Value = Data> {
    prop::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_LENGTH).prop_map(easy_hex::Hex)
}

pub fn arb_payloads() -> impl Strategy<Value = Vec<Data>> {
    prop::collection::vec(arb_payload(), 0..=MAX_ENTRIES)
}

pub fn arb_data() -> impl Strategy<Value = Data> {
    prop::collection::vec(any::<u8>(), 0..=10_000).prop_map(easy_hex::Hex)
}

pub fn arb_block_size() -> impl Strategy<Value = usize> {
    1usize..=8192
}

/// Optional (min, max) block sizes with `max >= min`.
pub fn arb_limits() -> impl Strategy<Value = (Option<usize>, Option<usize>)> {
    (prop::option::of(arb_block_size()), prop::option::of(0usize..=8192)).prop_map(
        |(min, extra)| match (min, extra) {
            (Some(min), Some(extra)) => (Some(min), Some(min + extra)),
            (None, Some(extra)) => (None, Some(extra + 1)),
            (min, None) => (min, None),
        },
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableEntry {
    pub compressed_size: u64,
    pub decompressed_size: u64,
}

/// Parse the seek table trailer from the end of `encoded`. Returns `None`
/// if the stream doesn't end with the seekable magic number.
pub fn read_seek_table(encoded: &[u8]) -> Option<Vec<TableEntry>> {
    // Footer: number of frames (4 bytes), descriptor (1 byte), magic (4 bytes)
    let footer = encoded.get(encoded.len().checked_sub(9)?..)?;
    if footer[5..9] != 0x8F92EAB1_u32.to_le_bytes() {
        return None;
    }

    let num_frames = u32::from_le_bytes(footer[0..4].try_into().unwrap());
    assert_eq!(footer[4], 0, "unexpected seek table descriptor");

    let table_frame_size = usize::try_from(num_frames).unwrap() * 8 + 9;
    let table_start = encoded.len() - table_frame_size - 8;
    let table = &encoded[table_start..];

    assert_eq!(table[0..4], 0x184D2A5E_u32.to_le_bytes());
    assert_eq!(
        u32::from_le_bytes(table[4..8].try_into().unwrap()),
        u32::try_from(table_frame_size).unwrap()
    );

    let entries = table[8..8 + usize::try_from(num_frames).unwrap() * 8]
        .chunks_exact(8)
        .map(|entry| TableEntry {
            compressed_size: u32::from_le_bytes(entry[0..4].try_into().unwrap()).into(),
            decompressed_size: u32::from_le_bytes(entry[4..8].try_into().unwrap()).into(),
        })
        .collect();

    Some(entries)
}

/// Total length of the trailer for `num_frames` frames.
pub fn seek_table_len(num_frames: usize) -> usize {
    8 + num_frames * 8 + 9
}
