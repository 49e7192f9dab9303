//! Per-step timing metrics.

/// Timing breakdown for one committed generation.
///
/// Returned by the synchronous step path and retrievable afterwards via
/// [`GridWorld::last_metrics`](crate::GridWorld::last_metrics). Values
/// are wall-clock microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// Total step duration.
    pub total_us: u64,
    /// Time spent duplicating dynamic layers into write buffers.
    pub buffer_copy_us: u64,
    /// Time spent in the per-cell sweep (all chunks, including worker
    /// coordination).
    pub cell_update_us: u64,
    /// Time spent holding the commit write lock.
    pub commit_us: u64,
    /// Number of chunks the grid was partitioned into.
    pub chunks: u32,
    /// Number of cells updated.
    pub cells: u64,
}
