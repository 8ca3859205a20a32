use crate::{
    async_writer::AsyncSeekableWriter,
    buffer::Buffer as _,
    config::CompressionConfig,
    encoder::{CompressionSummary, SeekableEncoder},
    planner::Mode,
    Error, ZstdOutcome,
};

/// Compresses whole input buffers into seekable zstd streams written to
/// `W`.
///
/// ## Construction
///
/// Create a builder with [`SeekableWriter::builder`], set the options on
/// [`SeekableWriterBuilder`], then call [`SeekableWriterBuilder::build`].
///
/// ```
/// # fn main() -> Result<(), tarseek::Error> {
/// let mut output = vec![];
/// let mut writer = tarseek::SeekableWriter::builder(&mut output)
///     .with_mode(tarseek::Mode::Raw)
///     .with_min_block_size(4096)
///     .build()?;
/// writer.compress(&[0; 10_000])?;
/// # Ok(())
/// # }
/// ```
pub struct SeekableWriter<W> {
    writer: W,
    config: CompressionConfig,
    buffer: crate::buffer::FixedBuffer<Vec<u8>>,
}

impl<W> SeekableWriter<W>
where
    W: std::io::Write,
{
    pub fn builder(writer: W) -> SeekableWriterBuilder<W> {
        SeekableWriterBuilder::new(writer)
    }

    /// Compress `input` as one run: every planned chunk becomes a frame,
    /// followed by the seek table unless it was disabled or abandoned.
    ///
    /// On error, the frames written so far stay in the sink but no seek
    /// table is written.
    pub fn compress(&mut self, input: &[u8]) -> Result<CompressionSummary, Error> {
        self.buffer.clear();

        let mut encoder = SeekableEncoder::new(input, &self.config)?;

        loop {
            self.flush_uncommitted()?;

            let outcome = match encoder.encode(&mut self.buffer) {
                Ok(outcome) => outcome,
                Err(error) => {
                    self.flush_uncommitted()?;
                    return Err(error);
                }
            };

            match outcome {
                ZstdOutcome::HasMore { .. } => {}
                ZstdOutcome::Complete(()) => break,
            }
        }

        self.flush_uncommitted()?;
        self.writer.flush()?;

        Ok(encoder.summary())
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn flush_uncommitted(&mut self) -> std::io::Result<()> {
        loop {
            let uncommitted = self.buffer.uncommitted();
            if uncommitted.is_empty() {
                return Ok(());
            }

            let committed = self.writer.write(uncommitted)?;
            self.buffer.commit(committed);

            if committed == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "failed to write buffered data",
                ));
            }
        }
    }
}

pub struct SeekableWriterBuilder<W> {
    writer: W,
    config: CompressionConfig,
}

impl<W> SeekableWriterBuilder<W> {
    fn new(writer: W) -> Self {
        Self {
            writer,
            config: CompressionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CompressionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.config.level = level;
        self
    }

    /// Embed a content checksum in every frame (enabled by default).
    pub fn with_checksum(mut self, checksum: bool) -> Self {
        self.config.checksum = checksum;
        self
    }

    /// Let zstd compress each frame with `workers` threads. Needs the
    /// `zstdmt` feature.
    pub fn with_workers(mut self, workers: u32) -> Self {
        self.config.workers = Some(workers);
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    /// In archive mode, the size records are merged up to. In raw mode,
    /// the exact size of every chunk but the last.
    pub fn with_min_block_size(mut self, size: usize) -> Self {
        self.config.limits.min_block_size = Some(size);
        self
    }

    /// In archive mode, the size no chunk may exceed, even if that splits
    /// a record. Ignored in raw mode.
    pub fn with_max_block_size(mut self, size: usize) -> Self {
        self.config.limits.max_block_size = Some(size);
        self
    }

    pub fn without_seek_table(mut self) -> Self {
        self.config.seek_table = false;
        self
    }

    pub fn build(self) -> Result<SeekableWriter<W>, Error>
    where
        W: std::io::Write,
    {
        self.config.validate()?;

        Ok(SeekableWriter {
            writer: self.writer,
            config: self.config,
            buffer: output_buffer(),
        })
    }

    /// Build a writer for an async sink. See [`AsyncSeekableWriter`].
    pub fn build_async(self) -> Result<AsyncSeekableWriter<W>, Error> {
        self.config.validate()?;

        Ok(AsyncSeekableWriter::new(
            self.writer,
            self.config,
            output_buffer(),
        ))
    }
}

pub(crate) fn output_buffer() -> crate::buffer::FixedBuffer<Vec<u8>> {
    crate::buffer::FixedBuffer::new(vec![0; zstd::zstd_safe::CCtx::out_size()])
}
