use std::path::{Path, PathBuf};

use crate::{config::CompressionConfig, encoder::CompressionSummary, planner::Mode, Error};

/// A read-only view of an input file's bytes.
pub enum InputBuffer {
    /// Zero-length files can't be mapped.
    Empty,
    Mapped(memmap2::Mmap),
}

impl InputBuffer {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Self::Empty);
        }

        // SAFETY: the mapping is private and read-only. Truncating the file
        // while it is mapped is outside what this tool supports.
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Ok(Self::Mapped(mmap))
    }
}

impl std::ops::Deref for InputBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Empty => &[],
            Self::Mapped(mmap) => &mmap[..],
        }
    }
}

/// Tar archives are recognized by name: anything ending in `tar`.
pub fn mode_for_path(path: &Path) -> Mode {
    if path.to_string_lossy().ends_with("tar") {
        Mode::Archive
    } else {
        Mode::Raw
    }
}

/// `<input>.zst`, next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let mut output = input.as_os_str().to_owned();
    output.push(".zst");
    PathBuf::from(output)
}

/// Compress the file at `input` into a new (or truncated) file at `output`.
pub fn compress_file(
    input: &Path,
    output: &Path,
    config: CompressionConfig,
) -> Result<CompressionSummary, Error> {
    config.validate()?;

    let input = InputBuffer::open(input)?;
    let output = std::fs::File::create(output)?;

    let mut writer = crate::SeekableWriter::builder(output)
        .with_config(config)
        .build()?;
    writer.compress(&input)
}
