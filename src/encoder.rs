use zstd::stream::raw::{CParameter, Operation as _};

use crate::{
    buffer::{Buffer, FixedBuffer},
    config::CompressionConfig,
    planner::{BlockPlanner, Chunk},
    table::{SeekTableBuilder, TableOverflow},
    Error, ZstdOutcome,
};

/// Totals for a finished (or aborted) compression run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompressionSummary {
    pub frames: usize,
    pub decompressed_size: u64,
    /// Bytes of compressed frames, not counting the seek table.
    pub compressed_size: u64,
    pub seek_table_size: Option<u64>,
    pub seek_table_overflow: Option<TableOverflow>,
}

/// Turns an input buffer into seekable zstd output, one frame per planned
/// chunk, without doing any I/O itself. Call [`Self::encode`] repeatedly,
/// draining `buffer` into the sink between calls, until it completes.
pub struct SeekableEncoder<'data> {
    input: &'data [u8],
    planner: BlockPlanner<'data>,
    encoder: zstd::stream::raw::Encoder<'static>,
    table: SeekTableBuilder,
    summary: CompressionSummary,
    state: SeekableEncoderState,
}

impl<'data> SeekableEncoder<'data> {
    pub fn new(input: &'data [u8], config: &CompressionConfig) -> Result<Self, Error> {
        config.validate()?;

        let planner = BlockPlanner::new(input, config.mode, config.limits)?;

        let mut encoder = zstd::stream::raw::Encoder::new(config.level).map_err(Error::Encoder)?;
        encoder
            .set_parameter(CParameter::ChecksumFlag(config.checksum))
            .map_err(Error::Encoder)?;
        if let Some(workers) = config.workers {
            set_workers(&mut encoder, workers)?;
        }

        let table = if config.seek_table {
            SeekTableBuilder::new()
        } else {
            SeekTableBuilder::disabled()
        };

        Ok(Self {
            input,
            planner,
            encoder,
            table,
            summary: CompressionSummary::default(),
            state: SeekableEncoderState::NextChunk,
        })
    }

    pub fn summary(&self) -> CompressionSummary {
        CompressionSummary {
            seek_table_overflow: self.table.overflow(),
            ..self.summary
        }
    }

    pub fn encode(&mut self, buffer: &mut impl Buffer) -> Result<ZstdOutcome<()>, Error> {
        loop {
            match self.state {
                SeekableEncoderState::NextChunk => match self.planner.next_chunk()? {
                    Some(chunk) => {
                        self.begin_frame(chunk)?;
                        self.state = SeekableEncoderState::Encoding {
                            chunk,
                            frame: FrameProgress::default(),
                        };
                    }
                    None => {
                        self.state = self.prepare_table();
                    }
                },
                SeekableEncoderState::Encoding { chunk, mut frame } => {
                    let input = self.input;
                    let remaining = &input[chunk.offset + frame.consumed..chunk.end()];
                    if remaining.is_empty() {
                        self.state = SeekableEncoderState::FinishingFrame { chunk, frame };
                        continue;
                    }

                    if buffer.writable().is_empty() {
                        return Ok(has_more(buffer));
                    }

                    let encoder = &mut self.encoder;
                    let mut in_buffer = zstd::stream::raw::InBuffer::around(remaining);
                    let (result, written) =
                        crate::buffer::with_zstd_out_buffer(buffer, |out_buffer| {
                            encoder.run(&mut in_buffer, out_buffer)
                        });

                    frame.add_sizes(written, in_buffer.pos());
                    self.state = SeekableEncoderState::Encoding { chunk, frame };

                    result.map_err(Error::Encoder)?;
                }
                SeekableEncoderState::FinishingFrame { chunk, mut frame } => {
                    if buffer.writable().is_empty() {
                        return Ok(has_more(buffer));
                    }

                    let encoder = &mut self.encoder;
                    let (result, written) =
                        crate::buffer::with_zstd_out_buffer(buffer, |out_buffer| {
                            encoder.finish(out_buffer, true)
                        });

                    frame.add_sizes(written, 0);
                    self.state = SeekableEncoderState::FinishingFrame { chunk, frame };

                    let remaining_bytes = result.map_err(Error::Encoder)?;
                    if remaining_bytes == 0 {
                        self.finish_frame(chunk, frame);
                        self.state = SeekableEncoderState::NextChunk;
                    }
                }
                SeekableEncoderState::WritingTable(ref mut table) => {
                    complete_ok!(crate::buffer::move_buffer(table, buffer));
                    self.state = SeekableEncoderState::Complete;
                }
                SeekableEncoderState::Complete => return Ok(ZstdOutcome::Complete(())),
            }
        }
    }

    fn begin_frame(&mut self, chunk: Chunk) -> Result<(), Error> {
        let in_bounds = chunk
            .offset
            .checked_add(chunk.len)
            .is_some_and(|end| end <= self.input.len());
        if !in_bounds {
            return Err(Error::BoundsViolation {
                offset: chunk.offset,
                len: chunk.len,
                input_len: self.input.len(),
            });
        }

        // The pledged size lets zstd write the content size into the
        // frame header, and must be set after each reset
        self.encoder.reinit().map_err(Error::Encoder)?;
        self.encoder
            .set_pledged_src_size(Some(chunk.len as u64))
            .map_err(Error::Encoder)?;

        Ok(())
    }

    fn finish_frame(&mut self, chunk: Chunk, frame: FrameProgress) {
        let decompressed_size = chunk.len as u64;

        log::trace!(
            "frame {}: {} bytes at {} -> {} bytes",
            self.summary.frames,
            chunk.len,
            chunk.offset,
            frame.compressed_size
        );

        self.table.record(frame.compressed_size, decompressed_size);

        self.summary.frames += 1;
        self.summary.decompressed_size += decompressed_size;
        self.summary.compressed_size += frame.compressed_size;
    }

    fn prepare_table(&mut self) -> SeekableEncoderState {
        match self.table.serialize() {
            Some(table) => {
                self.summary.seek_table_size = Some(table.len() as u64);
                SeekableEncoderState::WritingTable(FixedBuffer::filled(table))
            }
            None => SeekableEncoderState::Complete,
        }
    }
}

fn has_more(buffer: &impl Buffer) -> ZstdOutcome<()> {
    ZstdOutcome::HasMore {
        remaining_bytes: buffer.uncommitted().len(),
    }
}

#[cfg(feature = "zstdmt")]
fn set_workers(encoder: &mut zstd::stream::raw::Encoder<'_>, workers: u32) -> Result<(), Error> {
    if encoder
        .set_parameter(CParameter::NbWorkers(workers))
        .is_err()
    {
        log::warn!("zstd was built without multi-thread support, reverting to single thread");
        encoder
            .set_parameter(CParameter::NbWorkers(0))
            .map_err(Error::Encoder)?;
    }

    Ok(())
}

#[cfg(not(feature = "zstdmt"))]
fn set_workers(_encoder: &mut zstd::stream::raw::Encoder<'_>, workers: u32) -> Result<(), Error> {
    log::warn!("built without the zstdmt feature, ignoring {workers} workers");

    Ok(())
}

enum SeekableEncoderState {
    NextChunk,
    Encoding { chunk: Chunk, frame: FrameProgress },
    FinishingFrame { chunk: Chunk, frame: FrameProgress },
    WritingTable(FixedBuffer<Vec<u8>>),
    Complete,
}

#[derive(Debug, Default, Clone, Copy)]
struct FrameProgress {
    consumed: usize,
    compressed_size: u64,
}

impl FrameProgress {
    fn add_sizes(&mut self, compressed_size: usize, consumed: usize) {
        self.compressed_size += compressed_size as u64;
        self.consumed += consumed;
    }
}
