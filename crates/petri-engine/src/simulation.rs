//! The object-safe simulation facade.

use crate::step::{StepOutcome, StepRequest};
use crate::world::GridWorld;
use petri_core::{Cell, Rect, Rgb, StepId};
use std::any::Any;

/// Uniform driver-facing surface over a running simulation.
///
/// Implemented by [`GridWorld`](crate::GridWorld) for every model and
/// by [`Pipeline`](crate::Pipeline) itself, so a display or recorder
/// drives a single simulation and a whole pipeline identically, and
/// pipelines nest.
pub trait Simulation: Send + Sync {
    /// Grid size as `(cols, rows)`.
    fn size(&self) -> (u32, u32);

    /// The last committed step.
    fn step_id(&self) -> StepId;

    /// Whether the simulation has reached a terminal state.
    fn is_done(&self) -> bool;

    /// Whether a step is currently in flight.
    fn is_stepping(&self) -> bool;

    /// Progress of the in-flight step in `[0, 1]`; 0 when idle.
    fn percent_complete(&self) -> f64;

    /// Advance one generation synchronously.
    fn step(&self) -> StepOutcome;

    /// Request one generation on a background thread.
    fn request_step(&self) -> StepRequest;

    /// Fetch render colors for `rect` from one committed generation.
    fn fetch_colors(&self, rect: Rect, sink: &mut dyn FnMut(Cell, Rgb));

    /// Read a committed value by layer key.
    fn value_by_name(&self, name: &str, cell: Cell) -> Option<f32>;

    /// Downcast support for pipeline stage providers that need the
    /// concrete simulation type to hand state across stages.
    fn as_any(&self) -> &dyn Any;
}

impl<M: crate::Model> Simulation for crate::GridWorld<M> {
    fn size(&self) -> (u32, u32) {
        GridWorld::size(self)
    }

    fn step_id(&self) -> StepId {
        GridWorld::step_id(self)
    }

    fn is_done(&self) -> bool {
        GridWorld::is_done(self)
    }

    fn is_stepping(&self) -> bool {
        GridWorld::is_stepping(self)
    }

    fn percent_complete(&self) -> f64 {
        GridWorld::percent_complete(self)
    }

    fn step(&self) -> StepOutcome {
        GridWorld::step(self)
    }

    fn request_step(&self) -> StepRequest {
        GridWorld::request_step(self)
    }

    fn fetch_colors(&self, rect: Rect, sink: &mut dyn FnMut(Cell, Rgb)) {
        GridWorld::fetch_colors(self, rect, sink)
    }

    fn value_by_name(&self, name: &str, cell: Cell) -> Option<f32> {
        GridWorld::value_by_name(self, name, cell)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
