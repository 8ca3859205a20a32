//! Compress a tar archive (or any file) into the [zstd seekable format].
//!
//! The input is cut into chunks that follow the archive's record
//! boundaries, every chunk becomes an independent zstd frame, and a seek
//! table trailer maps decompressed offsets back to frames. Any zstd tool can
//! decompress the output; seek-aware readers can extract a single entry
//! without decompressing the whole archive.
//!
//! ```no_run
//! # fn main() -> Result<(), tarseek::Error> {
//! let archive = std::fs::read("archive.tar")?;
//! let mut output = vec![];
//!
//! let mut writer = tarseek::SeekableWriter::builder(&mut output)
//!     .with_min_block_size(1024 * 1024)
//!     .build()?;
//! let summary = writer.compress(&archive)?;
//! println!("{} frames", summary.frames);
//! # Ok(())
//! # }
//! ```
//!
//! [zstd seekable format]: https://github.com/facebook/zstd/tree/51eb7daf39c8e8a7c338ba214a9d4e2a6a086826/contrib/seekable_format

#[macro_use]
mod macros;

pub mod async_writer;
mod buffer;
pub mod config;
mod encoder;
mod error;
pub mod file;
pub mod header;
pub mod planner;
pub mod size;
pub mod table;
pub mod writer;

pub use config::CompressionConfig;
pub use encoder::CompressionSummary;
pub use error::Error;
pub use planner::{BlockLimits, BlockPlanner, Chunk, Mode};
pub use writer::{SeekableWriter, SeekableWriterBuilder};

#[derive(Debug, Clone, Copy)]
enum ZstdOutcome<T> {
    Complete(T),
    HasMore { remaining_bytes: usize },
}
