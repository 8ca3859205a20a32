use std::path::PathBuf;

use clap::Parser;
use tarseek::size::ByteSize;

/// Compress a file into a seekable zstd archive, splitting it into
/// independently decompressible frames.
///
/// Tar archives (names ending in `tar`) keep every archived file in its own
/// frame unless -s or -S say otherwise, so a single file can be extracted
/// without decompressing the whole archive. Other files, or any file with
/// -r, are cut into fixed-size blocks. The result can be decompressed by
/// any Zstandard tool.
#[derive(Parser, Debug)]
#[command(name = "tarseek")]
#[command(author, version, about, long_about)]
pub struct Cli {
    /// File to compress
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Compression level
    #[arg(short = 'l', value_name = "LEVEL", default_value_t = 3, value_parser = clap::value_parser!(i32).range(1..=22))]
    pub level: i32,

    /// Output file name [default: INPUT.zst]
    #[arg(short = 'o', value_name = "FILENAME")]
    pub output: Option<PathBuf>,

    /// Raw mode: the exact size of each input block, except the last one.
    /// Tar mode: the minimum size of a block of whole files. Accepts the
    /// suffixes k/K/KiB, M/MiB, G/GiB (powers of 1024) and kB/KB, MB, GB
    /// (powers of 1000)
    #[arg(short = 's', value_name = "SIZE")]
    pub min_block_size: Option<ByteSize>,

    /// Tar mode: the maximum size of an input block, splitting big files if
    /// needed. Must not be smaller than -s. Ignored in raw mode
    #[arg(short = 'S', value_name = "SIZE")]
    pub max_block_size: Option<ByteSize>,

    /// Number of compression threads
    #[arg(short = 'T', value_name = "THREADS", value_parser = clap::value_parser!(u32).range(1..))]
    pub threads: Option<u32>,

    /// Raw mode: treat tar archives as regular files
    #[arg(short = 'r')]
    pub raw: bool,

    /// Do not generate a seek table
    #[arg(short = 'j')]
    pub no_seek_table: bool,

    /// List the elements of the tar archive and their size
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Overwrite the output without prompting
    #[arg(short = 'f')]
    pub force: bool,
}
