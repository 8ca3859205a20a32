/// First magic number of the zstd skippable frame range.
pub const SKIPPABLE_MAGIC_START: u32 = 0x184D2A50;

/// Skippable frame magic number used for the seek table frame.
pub const SEEK_TABLE_MAGIC: u32 = SKIPPABLE_MAGIC_START | 0xE;

/// Magic number at the very end of a seekable zstd stream.
pub const SEEKABLE_MAGIC: u32 = 0x8F92EAB1;

/// Recording stops once the frame count reaches this value.
pub const MAX_FRAMES: u32 = 0x800_0000;

/// Recording stops when a frame's decompressed size reaches this value.
pub const MAX_FRAME_DECOMPRESSED_SIZE: u64 = 0x8000_0000;

const ENTRY_SIZE: usize = 8;
const FOOTER_SIZE: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekTableEntry {
    pub compressed_size: u32,
    pub decompressed_size: u32,
}

/// Why a seek table was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TableOverflow {
    #[error("too many frames")]
    TooManyFrames,

    #[error("input frame too big")]
    FrameTooLarge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableState {
    Recording,
    Disabled,
    Abandoned(TableOverflow),
}

/// Collects one entry per compressed frame and serializes them into the
/// seek table trailer.
///
/// If any frame can't be represented, the whole table is dropped and
/// nothing is serialized: a partial table would map offsets wrongly.
#[derive(Debug)]
pub struct SeekTableBuilder {
    entries: Vec<SeekTableEntry>,
    num_frames: u32,
    state: TableState,
}

impl SeekTableBuilder {
    pub fn new() -> Self {
        Self {
            entries: vec![],
            num_frames: 0,
            state: TableState::Recording,
        }
    }

    /// A builder that ignores every frame and never produces a table.
    pub fn disabled() -> Self {
        Self {
            entries: vec![],
            num_frames: 0,
            state: TableState::Disabled,
        }
    }

    pub fn record(&mut self, compressed_size: u64, decompressed_size: u64) {
        if self.state != TableState::Recording {
            return;
        }

        self.num_frames = self.num_frames.saturating_add(1);
        if self.num_frames >= MAX_FRAMES {
            self.abandon(TableOverflow::TooManyFrames);
            return;
        }

        if decompressed_size >= MAX_FRAME_DECOMPRESSED_SIZE {
            self.abandon(TableOverflow::FrameTooLarge);
            return;
        }

        let (Ok(compressed_size), Ok(decompressed_size)) = (
            u32::try_from(compressed_size),
            u32::try_from(decompressed_size),
        ) else {
            self.abandon(TableOverflow::FrameTooLarge);
            return;
        };

        self.entries.push(SeekTableEntry {
            compressed_size,
            decompressed_size,
        });
    }

    fn abandon(&mut self, reason: TableOverflow) {
        log::warn!("{reason}, unable to generate the seek table");

        self.state = TableState::Abandoned(reason);
        self.entries = vec![];
    }

    pub fn entries(&self) -> &[SeekTableEntry] {
        &self.entries
    }

    pub fn is_enabled(&self) -> bool {
        self.state == TableState::Recording
    }

    pub fn overflow(&self) -> Option<TableOverflow> {
        match self.state {
            TableState::Abandoned(reason) => Some(reason),
            TableState::Recording | TableState::Disabled => None,
        }
    }

    /// Serialize the trailer, or `None` if the table is disabled or was
    /// abandoned.
    ///
    /// ```plain
    /// | SEEK_TABLE_MAGIC | frame size | N x (compressed, decompressed) | N | 0x00 | SEEKABLE_MAGIC |
    /// ```
    pub fn serialize(&self) -> Option<Vec<u8>> {
        if !self.is_enabled() {
            return None;
        }

        let num_frames = u32::try_from(self.entries.len()).ok()?;
        let frame_size = self
            .entries
            .len()
            .checked_mul(ENTRY_SIZE)
            .and_then(|size| size.checked_add(FOOTER_SIZE))
            .and_then(|size| u32::try_from(size).ok())?;

        let mut bytes = Vec::with_capacity(8 + frame_size as usize);
        bytes.extend_from_slice(&SEEK_TABLE_MAGIC.to_le_bytes());
        bytes.extend_from_slice(&frame_size.to_le_bytes());

        log::debug!("---- seek table ----");
        log::debug!("decompressed\tcompressed");

        for entry in &self.entries {
            bytes.extend_from_slice(&entry.compressed_size.to_le_bytes());
            bytes.extend_from_slice(&entry.decompressed_size.to_le_bytes());

            log::debug!("{}\t{}", entry.decompressed_size, entry.compressed_size);
        }

        let seek_table_descriptor = 0u8;
        bytes.extend_from_slice(&num_frames.to_le_bytes());
        bytes.push(seek_table_descriptor);
        bytes.extend_from_slice(&SEEKABLE_MAGIC.to_le_bytes());

        Some(bytes)
    }
}

impl Default for SeekTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}
