#![cfg_attr(
    not(any(feature = "tokio", feature = "futures")),
    allow(dead_code, unused_imports)
)]

use crate::{
    buffer::FixedBuffer, config::CompressionConfig, encoder::CompressionSummary, Error,
};

/// The async counterpart of [`SeekableWriter`](crate::SeekableWriter). The
/// input is still a whole in-memory buffer; only the sink is async.
///
/// Output is byte-for-byte the same as the sync writer's. Enable the
/// `tokio` feature for [`Self::compress_tokio`] or the `futures` feature
/// for [`Self::compress_futures`].
///
/// Build one with [`SeekableWriterBuilder::build_async`](crate::SeekableWriterBuilder::build_async).
pub struct AsyncSeekableWriter<W> {
    writer: W,
    config: CompressionConfig,
    buffer: FixedBuffer<Vec<u8>>,
}

impl<W> AsyncSeekableWriter<W> {
    pub(crate) fn new(writer: W, config: CompressionConfig, buffer: FixedBuffer<Vec<u8>>) -> Self {
        Self {
            writer,
            config,
            buffer,
        }
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    #[cfg(feature = "tokio")]
    pub async fn compress_tokio(&mut self, input: &[u8]) -> Result<CompressionSummary, Error>
    where
        W: tokio::io::AsyncWrite + Unpin,
    {
        use crate::buffer::Buffer as _;
        use tokio::io::AsyncWriteExt as _;

        self.buffer.clear();

        let mut encoder = crate::encoder::SeekableEncoder::new(input, &self.config)?;

        loop {
            self.flush_uncommitted_tokio().await?;

            let outcome = match encoder.encode(&mut self.buffer) {
                Ok(outcome) => outcome,
                Err(error) => {
                    self.flush_uncommitted_tokio().await?;
                    return Err(error);
                }
            };

            match outcome {
                crate::ZstdOutcome::HasMore { .. } => {}
                crate::ZstdOutcome::Complete(()) => break,
            }
        }

        self.flush_uncommitted_tokio().await?;
        self.writer.flush().await?;

        Ok(encoder.summary())
    }

    #[cfg(feature = "tokio")]
    async fn flush_uncommitted_tokio(&mut self) -> std::io::Result<()>
    where
        W: tokio::io::AsyncWrite + Unpin,
    {
        use crate::buffer::Buffer as _;
        use tokio::io::AsyncWriteExt as _;

        loop {
            let uncommitted = self.buffer.uncommitted();
            if uncommitted.is_empty() {
                return Ok(());
            }

            let committed = self.writer.write(uncommitted).await?;
            self.buffer.commit(committed);

            if committed == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "failed to write buffered data",
                ));
            }
        }
    }

    #[cfg(feature = "futures")]
    pub async fn compress_futures(&mut self, input: &[u8]) -> Result<CompressionSummary, Error>
    where
        W: futures::AsyncWrite + Unpin,
    {
        use crate::buffer::Buffer as _;
        use futures::AsyncWriteExt as _;

        self.buffer.clear();

        let mut encoder = crate::encoder::SeekableEncoder::new(input, &self.config)?;

        loop {
            self.flush_uncommitted_futures().await?;

            let outcome = match encoder.encode(&mut self.buffer) {
                Ok(outcome) => outcome,
                Err(error) => {
                    self.flush_uncommitted_futures().await?;
                    return Err(error);
                }
            };

            match outcome {
                crate::ZstdOutcome::HasMore { .. } => {}
                crate::ZstdOutcome::Complete(()) => break,
            }
        }

        self.flush_uncommitted_futures().await?;
        self.writer.flush().await?;

        Ok(encoder.summary())
    }

    #[cfg(feature = "futures")]
    async fn flush_uncommitted_futures(&mut self) -> std::io::Result<()>
    where
        W: futures::AsyncWrite + Unpin,
    {
        use crate::buffer::Buffer as _;
        use futures::AsyncWriteExt as _;

        loop {
            let uncommitted = self.buffer.uncommitted();
            if uncommitted.is_empty() {
                return Ok(());
            }

            let committed = self.writer.write(uncommitted).await?;
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
