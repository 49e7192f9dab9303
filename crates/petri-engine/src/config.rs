//! World configuration and validation.

use petri_core::SetupError;

/// Configuration for constructing a [`GridWorld`](crate::GridWorld).
///
/// Plain data; [`validate()`](WorldConfig::validate) checks structural
/// invariants before the world is built, so a constructed world never
/// carries an invalid configuration.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Grid width in cells.
    pub cols: u32,
    /// Grid height in cells.
    pub rows: u32,
    /// Seed for every random stream the world derives (construction
    /// initializers and per-chunk step streams).
    pub seed: u64,
    /// Run chunk workers concurrently. Serial mode walks the same
    /// chunk list on the calling thread and commits identical state.
    pub parallel: bool,
    /// Chunk edge length in cells. Default 64.
    pub chunk: u32,
    /// Worker thread count for parallel mode. `None` = auto-detect
    /// from available parallelism, clamped to `[1, 64]`.
    pub workers: Option<usize>,
}

impl WorldConfig {
    /// Default chunk edge length.
    pub const DEFAULT_CHUNK: u32 = 64;

    /// A parallel world of `cols x rows` cells with seed 0.
    pub fn new(cols: u32, rows: u32) -> Self {
        Self {
            cols,
            rows,
            seed: 0,
            parallel: true,
            chunk: Self::DEFAULT_CHUNK,
            workers: None,
        }
    }

    /// Set the seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Disable the worker pool; chunks run on the calling thread.
    pub fn serial(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Override the chunk edge length.
    pub fn chunk(mut self, chunk: u32) -> Self {
        self.chunk = chunk;
        self
    }

    /// Pin the worker count instead of auto-detecting.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.cols == 0 || self.rows == 0 {
            return Err(SetupError::EmptyGrid);
        }
        if self.cols > i32::MAX as u32 {
            return Err(SetupError::DimensionTooLarge {
                axis: "cols",
                value: self.cols,
            });
        }
        if self.rows > i32::MAX as u32 {
            return Err(SetupError::DimensionTooLarge {
                axis: "rows",
                value: self.rows,
            });
        }
        if self.chunk == 0 {
            return Err(SetupError::ZeroChunkSize);
        }
        Ok(())
    }

    /// Resolve the worker count, applying auto-detection if unset.
    ///
    /// Explicit values are clamped to `[1, 64]`; zero workers would
    /// stall every parallel step.
    pub fn resolved_workers(&self) -> usize {
        match self.workers {
            Some(n) => n.clamp(1, 64),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .clamp(1, 64),
        }
    }
}
