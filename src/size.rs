/// A positive byte count parsed from a string with an optional
/// multiplicative suffix:
///
/// | suffix | multiplier |
/// |---|---|
/// | `k`, `K`, `KiB` | 1024 |
/// | `M`, `MiB` | 1024² |
/// | `G`, `GiB` | 1024³ |
/// | `kB`, `KB` | 1000 |
/// | `MB` | 1000² |
/// | `GB` | 1000³ |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteSize(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseSizeError {
    #[error("invalid size {0:?}")]
    Invalid(String),

    #[error("unknown size suffix {0:?}")]
    UnknownSuffix(String),

    #[error("size must be greater than 0")]
    Zero,

    #[error("size {0:?} is too large")]
    Overflow(String),
}

const SUFFIXES: &[(&str, u64)] = &[
    ("k", 1 << 10),
    ("K", 1 << 10),
    ("KiB", 1 << 10),
    ("M", 1 << 20),
    ("MiB", 1 << 20),
    ("G", 1 << 30),
    ("GiB", 1 << 30),
    ("kB", 1_000),
    ("KB", 1_000),
    ("MB", 1_000_000),
    ("GB", 1_000_000_000),
];

impl ByteSize {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::str::FromStr for ByteSize {
    type Err = ParseSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits_len = s.bytes().take_while(u8::is_ascii_digit).count();
        let (digits, suffix) = s.split_at(digits_len);

        if digits.is_empty() {
            return Err(ParseSizeError::Invalid(s.to_string()));
        }

        let multiplier = if suffix.is_empty() {
            1
        } else {
            SUFFIXES
                .iter()
                .find(|(name, _)| *name == suffix)
                .map(|&(_, multiplier)| multiplier)
                .ok_or_else(|| ParseSizeError::UnknownSuffix(suffix.to_string()))?
        };

        let value: u64 = digits
            .parse()
            .map_err(|_| ParseSizeError::Overflow(s.to_string()))?;
        let size = value
            .checked_mul(multiplier)
            .ok_or_else(|| ParseSizeError::Overflow(s.to_string()))?;

        if size == 0 {
            return Err(ParseSizeError::Zero);
        }

        Ok(Self(size))
    }
}

impl std::fmt::Display for ByteSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
