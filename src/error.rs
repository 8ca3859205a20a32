use crate::header::HeaderError;

/// Errors that abort a compression run.
///
/// The only degraded (non-fatal) condition is a seek table overflow, which
/// is reported through [`crate::table::TableOverflow`] and a log warning
/// instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid tar header at offset {offset} (if this is not a tar archive, use raw mode)")]
    InvalidHeader {
        offset: usize,
        #[source]
        source: HeaderError,
    },

    #[error("tar record at offset {offset} needs {span} bytes but only {available} remain")]
    TruncatedRecord {
        offset: usize,
        span: u64,
        available: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("zstd encoder failed")]
    Encoder(#[source] std::io::Error),

    #[error("planned chunk {offset}+{len} exceeds input of {input_len} bytes (this is a bug)")]
    BoundsViolation {
        offset: usize,
        len: usize,
        input_len: usize,
    },

    #[error("I/O error")]
    Io(#[from] std::io::Error),
}
