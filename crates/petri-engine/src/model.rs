//! The per-cell update rule interface.
//!
//! A [`Model`] is the plug-in rule a [`GridWorld`](crate::GridWorld)
//! runs: it declares its layers once at registration and is then
//! invoked once per cell per generation through a [`CellCtx`] — a
//! capability handle that only permits committed-snapshot reads and
//! additive write-buffer accumulation, so a rule cannot observe
//! partially-updated state by construction.

use indexmap::IndexMap;
use petri_core::{Cell, LayerDef, LayerId, Rgb, StepId};
use petri_grid::Layer;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// Read-only view of one committed generation.
///
/// Passed to [`Model::shade`] and [`Model::is_done`], and available to
/// pipeline stage providers through
/// [`GridWorld::with_view`](crate::GridWorld::with_view). Every read
/// resolves against the same committed layer set.
pub struct WorldView<'a> {
    pub(crate) layers: &'a [Arc<Layer>],
    pub(crate) registry: &'a IndexMap<String, LayerId>,
    pub(crate) cols: u32,
    pub(crate) rows: u32,
}

impl<'a> WorldView<'a> {
    /// Read the committed value of `layer` at `cell` (clamped,
    /// out-of-bounds policy applied).
    pub fn read(&self, layer: LayerId, cell: Cell) -> f32 {
        self.layers[layer.0 as usize].get(cell)
    }

    /// The committed layer itself, for neighbor and aggregate queries.
    pub fn layer(&self, layer: LayerId) -> &'a Layer {
        &self.layers[layer.0 as usize]
    }

    /// Resolve a layer key to its ID. Not for hot loops — models hold
    /// their IDs as constants in registration order.
    pub fn layer_id(&self, name: &str) -> Option<LayerId> {
        self.registry.get(name).copied()
    }

    /// Grid width in cells.
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Grid height in cells.
    pub fn rows(&self) -> u32 {
        self.rows
    }
}

/// Per-cell execution capability handed to [`Model::update_cell`].
///
/// Reads come from the pre-step committed snapshot; writes go to the
/// in-progress buffers through [`accumulate`](CellCtx::accumulate)
/// only. The random stream is the enclosing chunk's substream, derived
/// from `(seed, step, chunk index)` — identical in serial and parallel
/// execution.
pub struct CellCtx<'a> {
    pub(crate) snapshot: &'a [Arc<Layer>],
    pub(crate) buffers: &'a [Option<Layer>],
    pub(crate) step: StepId,
    pub(crate) rng: &'a mut ChaCha8Rng,
}

impl<'a> CellCtx<'a> {
    /// Read the committed (pre-step) value of `layer` at `cell`.
    pub fn read(&self, layer: LayerId, cell: Cell) -> f32 {
        self.snapshot[layer.0 as usize].get(cell)
    }

    /// The committed layer, for neighbor enumeration and aggregation.
    ///
    /// Borrows the snapshot, not the context, so a rule can hold the
    /// layer while drawing from [`rng`](CellCtx::rng).
    pub fn layer(&self, layer: LayerId) -> &'a Layer {
        &self.snapshot[layer.0 as usize]
    }

    /// Add `delta` to `layer` at `cell` in the write buffer.
    ///
    /// No-op for out-of-grid cells and for static layers (the step
    /// function never rewrites those).
    pub fn accumulate(&self, layer: LayerId, cell: Cell, delta: f32) {
        if let Some(buffer) = &self.buffers[layer.0 as usize] {
            buffer.add(cell, delta);
        }
    }

    /// The step being computed.
    pub fn step(&self) -> StepId {
        self.step
    }

    /// The chunk's random substream.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        self.rng
    }
}

/// A plug-in per-cell update rule plus its layer declarations and
/// render shading.
///
/// # Contract
///
/// - [`update_cell`](Model::update_cell) must read only through the
///   [`CellCtx`] it is given. It is called once per cell per
///   generation, from whichever worker owns the cell's chunk.
/// - `&self` during the sweep — per-generation mutable state belongs in
///   layers, per-run parameters may be adjusted in the
///   [`pre_step`](Model::pre_step)/[`post_step`](Model::post_step)
///   hooks, which run exclusively.
/// - [`layers`](Model::layers) is called once at world construction;
///   registration order defines the model's `LayerId` constants.
pub trait Model: Send + Sync + 'static {
    /// Layer declarations, in registration order.
    fn layers(&self) -> Vec<LayerDef>;

    /// Advance one cell: read the committed snapshot through `ctx`,
    /// accumulate deltas into the write buffers.
    fn update_cell(&self, cell: Cell, step: StepId, ctx: &mut CellCtx<'_>);

    /// Runs once, exclusively, before any cell work of step `step`.
    ///
    /// May adjust model parameters (e.g. a time-dependent coefficient);
    /// committed layers are not writable here.
    fn pre_step(&mut self, step: StepId) {
        let _ = step;
    }

    /// Runs once, exclusively, after the generation is committed.
    fn post_step(&mut self, step: StepId) {
        let _ = step;
    }

    /// The render color of `cell` for a committed generation.
    fn shade(&self, cell: Cell, view: &WorldView<'_>) -> Rgb;

    /// Whether the simulation has reached a terminal state.
    ///
    /// `step` is the last committed step. Default: never done (step
    /// limits, if any, are the pipeline's business).
    fn is_done(&self, step: StepId, view: &WorldView<'_>) -> bool {
        let _ = (step, view);
        false
    }
}
