use crate::{
    planner::{BlockLimits, Mode},
    Error,
};

pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Everything a single compression run needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionConfig {
    pub level: i32,
    /// Embed a content checksum in every frame.
    pub checksum: bool,
    /// Worker threads for the zstd context. `None` compresses on the
    /// calling thread.
    pub workers: Option<u32>,
    pub mode: Mode,
    pub limits: BlockLimits,
    /// Append the seek table trailer.
    pub seek_table: bool,
}

impl CompressionConfig {
    pub fn validate(&self) -> Result<(), Error> {
        let levels = zstd::compression_level_range();
        if !levels.contains(&self.level) {
            return Err(Error::InvalidConfig(format!(
                "compression level {} is outside {}..={}",
                self.level,
                levels.start(),
                levels.end()
            )));
        }

        if self.workers == Some(0) {
            return Err(Error::InvalidConfig(
                "number of workers must be greater than 0".into(),
            ));
        }

        self.limits.validate()
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_COMPRESSION_LEVEL,
            checksum: true,
            workers: None,
            mode: Mode::default(),
            limits: BlockLimits::default(),
            seek_table: true,
        }
    }
}
