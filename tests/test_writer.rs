use assert_matches::assert_matches;
use easy_hex::Hex;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tarseek::{header::HeaderError, BlockLimits, BlockPlanner, Mode, SeekableWriter};

mod test_utils;

fn compress(
    data: &[u8],
    mode: Mode,
    (min_block_size, max_block_size): (Option<usize>, Option<usize>),
) -> (Vec<u8>, tarseek::CompressionSummary) {
    let mut encoded = vec![];

    let mut builder = SeekableWriter::builder(&mut encoded)
        .with_mode(mode)
        .with_compression_level(1);
    if let Some(min) = min_block_size {
        builder = builder.with_min_block_size(min);
    }
    if let Some(max) = max_block_size {
        builder = builder.with_max_block_size(max);
    }
    let mut writer = builder.build().unwrap();
    let summary = writer.compress(data).unwrap();
    drop(writer);

    (encoded, summary)
}

/// Decompress each frame on its own, using the seek table to find it.
fn decode_frames(encoded: &[u8]) -> Vec<Vec<u8>> {
    let entries = test_utils::read_seek_table(encoded).unwrap();

    let mut frames = vec![];
    let mut offset = 0;
    for entry in entries {
        let end = offset + usize::try_from(entry.compressed_size).unwrap();
        let frame = zstd::decode_all(&encoded[offset..end]).unwrap();
        assert_eq!(frame.len() as u64, entry.decompressed_size);

        frames.push(frame);
        offset = end;
    }

    assert_eq!(
        offset + test_utils::seek_table_len(frames.len()),
        encoded.len()
    );

    frames
}

#[test]
fn test_archive_one_frame_per_record() {
    let payloads = [Hex(vec![1; 1000]), Hex(vec![2; 10]), Hex(vec![])];
    let archive = test_utils::tar_archive(&payloads);

    let (encoded, summary) = compress(&archive, Mode::Archive, (None, None));

    let frames = decode_frames(&encoded);
    let frame_lens: Vec<_> = frames.iter().map(Vec::len).collect();
    assert_eq!(frame_lens, [1536, 1024, 512, 512, 512]);
    assert_eq!(Hex(frames.concat()), Hex(archive.clone()));

    assert_eq!(summary.frames, 5);
    assert_eq!(summary.decompressed_size, archive.len() as u64);
    assert_eq!(summary.seek_table_size, Some(test_utils::seek_table_len(5) as u64));
    assert_eq!(summary.seek_table_overflow, None);
    assert_eq!(
        summary.compressed_size + summary.seek_table_size.unwrap(),
        encoded.len() as u64
    );
}

#[test]
fn test_archive_frames_start_at_record_boundaries() {
    let payloads = [Hex(vec![b'a'; 700]), Hex(vec![b'b'; 4608])];
    let archive = test_utils::tar_archive(&payloads);

    let (encoded, _) = compress(&archive, Mode::Archive, (Some(2048), Some(2048)));

    let frames = decode_frames(&encoded);
    let frame_lens: Vec<_> = frames.iter().map(Vec::len).collect();
    assert_eq!(frame_lens, [2048, 2048, 2048, 1536]);

    // The first frame holds the first record and the start of the second
    assert!(frames[0].starts_with(b"file-0.bin"));
    assert!(frames[0][1536..].starts_with(b"file-1.bin"));
    assert_eq!(Hex(frames.concat()), Hex(archive));
}

#[test]
fn test_raw_mode_fixed_frames() {
    let data: Vec<u8> = (0..10_000u32).map(|n| (n % 251) as u8).collect();

    let (encoded, summary) = compress(&data, Mode::Raw, (Some(4096), None));

    let frames = decode_frames(&encoded);
    let frame_lens: Vec<_> = frames.iter().map(Vec::len).collect();
    assert_eq!(frame_lens, [4096, 4096, 1808]);
    assert_eq!(Hex(frames.concat()), Hex(data));
    assert_eq!(summary.frames, 3);
}

#[test]
fn test_raw_mode_without_size_is_one_frame() {
    let data = vec![7; 3000];

    let (encoded, _) = compress(&data, Mode::Raw, (None, None));

    let frames = decode_frames(&encoded);
    assert_eq!(frames.len(), 1);
    assert_eq!(Hex(frames.concat()), Hex(data));
}

#[test]
fn test_empty_input_writes_empty_table() {
    let (encoded, summary) = compress(&[], Mode::Archive, (None, None));

    assert_eq!(encoded.len(), test_utils::seek_table_len(0));
    assert_eq!(test_utils::read_seek_table(&encoded), Some(vec![]));
    assert_eq!(summary.frames, 0);
    assert_eq!(summary.compressed_size, 0);
}

#[test]
fn test_without_seek_table() {
    let archive = test_utils::tar_archive(&[Hex(vec![1; 100])]);

    let mut encoded = vec![];
    let mut writer = SeekableWriter::builder(&mut encoded)
        .without_seek_table()
        .build()
        .unwrap();
    let summary = writer.compress(&archive).unwrap();
    drop(writer);

    assert_eq!(test_utils::read_seek_table(&encoded), None);
    assert_eq!(summary.seek_table_size, None);
    assert_eq!(summary.compressed_size, encoded.len() as u64);
    assert_eq!(Hex(zstd::decode_all(&encoded[..]).unwrap()), Hex(archive));
}

#[test]
fn test_frames_without_checksum() {
    let archive = test_utils::tar_archive(&[Hex(vec![1; 100])]);

    let mut with_checksum = vec![];
    SeekableWriter::builder(&mut with_checksum)
        .build()
        .unwrap()
        .compress(&archive)
        .unwrap();

    let mut without_checksum = vec![];
    SeekableWriter::builder(&mut without_checksum)
        .with_checksum(false)
        .build()
        .unwrap()
        .compress(&archive)
        .unwrap();

    // Three frames, each missing its 4 byte checksum
    assert_eq!(with_checksum.len() - without_checksum.len(), 3 * 4);
    assert_eq!(
        Hex(zstd::decode_all(&without_checksum[..]).unwrap()),
        Hex(archive)
    );
}

#[test]
fn test_invalid_header_stops_without_table() {
    let mut archive = test_utils::tar_record("first.txt", b"hello");
    let mut bad_header = test_utils::tar_header("second.txt", 5);
    bad_header[0] = b'S';
    archive.extend_from_slice(&bad_header);
    archive.resize(archive.len() + 512, 0);

    let mut encoded = vec![];
    let mut writer = SeekableWriter::builder(&mut encoded).build().unwrap();
    let result = writer.compress(&archive);
    drop(writer);

    assert_matches!(
        result,
        Err(tarseek::Error::InvalidHeader {
            offset: 1024,
            source: HeaderError::ChecksumMismatch { .. },
        })
    );

    // The frame for the first record was written, but no seek table
    assert_eq!(test_utils::read_seek_table(&encoded), None);
    assert_eq!(
        Hex(zstd::decode_all(&encoded[..]).unwrap()),
        Hex(archive[..1024].to_vec())
    );
}

#[test]
fn test_build_rejects_invalid_config() {
    let result = SeekableWriter::builder(Vec::<u8>::new())
        .with_min_block_size(4096)
        .with_max_block_size(1024)
        .build();
    assert_matches!(result.err(), Some(tarseek::Error::InvalidConfig(_)));

    let result = SeekableWriter::builder(Vec::<u8>::new())
        .with_mode(Mode::Raw)
        .with_min_block_size(4096)
        .with_max_block_size(1024)
        .build();
    assert_matches!(result.err(), Some(tarseek::Error::InvalidConfig(_)));

    let result = SeekableWriter::builder(Vec::<u8>::new())
        .with_compression_level(1000)
        .build();
    assert_matches!(result.err(), Some(tarseek::Error::InvalidConfig(_)));

    let result = SeekableWriter::builder(Vec::<u8>::new()).with_workers(0).build();
    assert_matches!(result.err(), Some(tarseek::Error::InvalidConfig(_)));
}

#[test]
fn test_raw_mode_ignores_max_block_size() {
    let data = vec![3; 5000];

    let (encoded, _) = compress(&data, Mode::Raw, (Some(2048), Some(4096)));

    let frames = decode_frames(&encoded);
    let frame_lens: Vec<_> = frames.iter().map(Vec::len).collect();
    assert_eq!(frame_lens, [2048, 2048, 904]);
}

#[test]
fn test_with_workers() {
    let data: Vec<u8> = (0..50_000u32).map(|n| (n % 13) as u8).collect();

    let mut encoded = vec![];
    let mut writer = SeekableWriter::builder(&mut encoded)
        .with_mode(Mode::Raw)
        .with_min_block_size(16_384)
        .with_workers(2)
        .build()
        .unwrap();
    writer.compress(&data).unwrap();
    drop(writer);

    let frames = decode_frames(&encoded);
    assert_eq!(frames.len(), 4);
    assert_eq!(Hex(frames.concat()), Hex(data));
}

proptest! {
    #[test]
    fn test_archive_encode_then_decode(
        payloads in test_utils::arb_payloads(),
        limits in test_utils::arb_limits(),
    ) {
        let archive = test_utils::tar_archive(&payloads);

        let (encoded, summary) = compress(&archive, Mode::Archive, limits);

        let decoded = zstd::decode_all(&encoded[..]).unwrap();
        prop_assert_eq!(Hex(decoded), Hex(archive.clone()));

        let planner = BlockPlanner::new(
            &archive,
            Mode::Archive,
            BlockLimits {
                min_block_size: limits.0,
                max_block_size: limits.1,
            },
        )
        .unwrap();
        let chunks: Vec<_> = planner.map(Result::unwrap).collect();

        let frames = decode_frames(&encoded);
        prop_assert_eq!(frames.len(), chunks.len());
        prop_assert_eq!(summary.frames, chunks.len());
        for (frame, chunk) in frames.iter().zip(&chunks) {
            prop_assert_eq!(Hex(frame.clone()), Hex(archive[chunk.range()].to_vec()));
        }
    }

    #[test]
    fn test_raw_encode_then_decode(
        data in test_utils::arb_data(),
        block_size in test_utils::arb_block_size(),
    ) {
        let (encoded, _) = compress(&data, Mode::Raw, (Some(block_size), None));

        let frames = decode_frames(&encoded);
        prop_assert_eq!(frames.len(), data.len().div_ceil(block_size));
        prop_assert_eq!(Hex(frames.concat()), data);
    }
}
