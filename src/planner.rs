use crate::{
    header::{RecordHeader, BLOCK_LEN},
    Error,
};

/// A byte range of the input that becomes one independent zstd frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub offset: usize,
    pub len: usize,
}

impl Chunk {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.end()
    }
}

/// How the input is cut into chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Follow tar record boundaries.
    #[default]
    Archive,

    /// No structure: fixed-size chunks, or the whole input as one chunk.
    Raw,
}

/// Chunk size constraints.
///
/// In archive mode, `min_block_size` merges consecutive records until a
/// chunk is at least that large, and `max_block_size` splits any chunk
/// (including a single record) that would grow past it. In raw mode,
/// `min_block_size` is the exact chunk size and `max_block_size` is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockLimits {
    pub min_block_size: Option<usize>,
    pub max_block_size: Option<usize>,
}

impl BlockLimits {
    /// The limits the planner applies in `mode`: raw mode has no maximum.
    /// Validate before calling this, `max < min` is an error in every mode.
    pub fn for_mode(self, mode: Mode) -> Self {
        match mode {
            Mode::Archive => self,
            Mode::Raw => Self {
                max_block_size: None,
                ..self
            },
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.min_block_size == Some(0) {
            return Err(Error::InvalidConfig(
                "minimum block size must be greater than 0".into(),
            ));
        }
        if self.max_block_size == Some(0) {
            return Err(Error::InvalidConfig(
                "maximum block size must be greater than 0".into(),
            ));
        }

        if let (Some(min), Some(max)) = (self.min_block_size, self.max_block_size) {
            if max < min {
                return Err(Error::InvalidConfig(format!(
                    "the maximum block size ({max}) can't be smaller than the minimum one ({min})"
                )));
            }
        }

        Ok(())
    }
}

/// Walks the input front to back and yields the chunks to compress.
///
/// Chunks are contiguous, never empty, and together cover the whole input.
/// Planning stops at the first error; the iterator is fused after that.
#[derive(Debug)]
pub struct BlockPlanner<'data> {
    input: &'data [u8],
    mode: Mode,
    limits: BlockLimits,
    chunk_pos: usize,
    header_pos: usize,
    residual: usize,
    failed: bool,
}

impl<'data> BlockPlanner<'data> {
    pub fn new(input: &'data [u8], mode: Mode, limits: BlockLimits) -> Result<Self, Error> {
        limits.validate()?;
        let limits = limits.for_mode(mode);

        Ok(Self {
            input,
            mode,
            limits,
            chunk_pos: 0,
            header_pos: 0,
            residual: 0,
            failed: false,
        })
    }

    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, Error> {
        if self.failed || self.is_exhausted() {
            return Ok(None);
        }

        let len = match self.mode {
            Mode::Raw => self.next_raw_len(),
            Mode::Archive => match self.next_archive_len() {
                Ok(len) => len,
                Err(error) => {
                    self.failed = true;
                    return Err(error);
                }
            },
        };

        log::debug!("# end of block ({len}, {})", self.header_pos);

        let chunk = Chunk {
            offset: self.chunk_pos,
            len,
        };
        self.chunk_pos += len;

        Ok(Some(chunk))
    }

    fn is_exhausted(&self) -> bool {
        self.chunk_pos >= self.input.len() && self.residual == 0
    }

    fn next_raw_len(&mut self) -> usize {
        let remaining = self.input.len() - self.chunk_pos;
        let len = match self.limits.min_block_size {
            Some(size) => size.min(remaining),
            None => remaining,
        };

        // No headers to follow, the cursor just tracks the chunk end
        self.header_pos = self.chunk_pos + len;
        len
    }

    fn next_archive_len(&mut self) -> Result<usize, Error> {
        let min_block_size = self.limits.min_block_size.unwrap_or(0);
        let mut block_size = 0;

        loop {
            if self.residual > 0 {
                // Continue a record that was split by the maximum block size
                let take = match self.limits.max_block_size {
                    Some(max) => self.residual.min(max),
                    None => self.residual,
                };
                block_size += take;
                self.residual -= take;
            } else {
                let span = self.record_span(self.header_pos)?;
                self.header_pos += span;
                block_size += span;

                if let Some(max) = self.limits.max_block_size {
                    if block_size > max {
                        self.residual = block_size - max;
                        block_size = max;
                    }
                }
            }

            let exhausted = self.header_pos >= self.input.len() && self.residual == 0;
            if block_size >= min_block_size || exhausted {
                break;
            }
        }

        Ok(block_size)
    }

    /// Length of the header block at `offset` plus its padded payload.
    /// A block starting with a zero byte is end-of-archive padding and
    /// spans exactly one block.
    fn record_span(&self, offset: usize) -> Result<usize, Error> {
        let available = self.input.len() - offset;
        let block: &[u8; BLOCK_LEN] = self
            .input
            .get(offset..offset + BLOCK_LEN)
            .and_then(|block| block.try_into().ok())
            .ok_or(Error::TruncatedRecord {
                offset,
                span: BLOCK_LEN as u64,
                available,
            })?;

        if block[0] == 0 {
            log::debug!("+ <null>");
            return Ok(BLOCK_LEN);
        }

        let header =
            RecordHeader::parse(block).map_err(|source| Error::InvalidHeader { offset, source })?;

        let span = header.span().unwrap_or(u64::MAX);
        let span_len = usize::try_from(span)
            .ok()
            .filter(|&span_len| span_len <= available)
            .ok_or(Error::TruncatedRecord {
                offset,
                span,
                available,
            })?;

        log::debug!("+ {} ({})", header.path(), span_len - BLOCK_LEN);

        Ok(span_len)
    }
}

impl Iterator for BlockPlanner<'_> {
    type Item = Result<Chunk, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

impl std::iter::FusedIterator for BlockPlanner<'_> {}
