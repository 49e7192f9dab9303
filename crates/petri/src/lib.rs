//! Petri: a discrete-time grid simulation engine with pluggable
//! cellular-automaton models.
//!
//! This is the top-level facade crate re-exporting the public API of
//! the petri sub-crates. For most users a single `petri` dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use petri::prelude::*;
//!
//! // A rule that relaxes each cell toward its neighborhood mean.
//! struct Relax;
//!
//! const HEAT: LayerId = LayerId(0);
//!
//! impl Model for Relax {
//!     fn layers(&self) -> Vec<LayerDef> {
//!         vec![LayerDef::new("heat").init_with(|cell, _| cell.x as f32)]
//!     }
//!
//!     fn update_cell(&self, cell: Cell, _step: StepId, ctx: &mut CellCtx<'_>) {
//!         let mean = ctx
//!             .layer(HEAT)
//!             .sum_neighbors(cell, NeighborQuery::orthogonal(), |v| v)
//!             / 4.0;
//!         ctx.accumulate(HEAT, cell, 0.5 * (mean - ctx.read(HEAT, cell)));
//!     }
//!
//!     fn shade(&self, cell: Cell, view: &WorldView<'_>) -> Rgb {
//!         let v = view.read(HEAT, cell).clamp(0.0, 255.0) as u8;
//!         Rgb(v, v, v)
//!     }
//! }
//!
//! let world = GridWorld::new(WorldConfig::new(16, 16).seed(42), Relax).unwrap();
//! assert!(world.step().is_stepped());
//! assert_eq!(world.step_id(), StepId(1));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `petri-core` | IDs, cells, colors, layer definitions, errors |
//! | [`grid`] | `petri-grid` | The bounded scalar [`grid::Layer`] |
//! | [`engine`] | `petri-engine` | [`engine::GridWorld`], [`engine::Pipeline`], the [`engine::Model`] trait |
//! | [`models`] | `petri-models` | Reference models: ants, blobs, Conway, inkblot |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and errors (`petri-core`).
pub use petri_core as types;

/// Grid layer storage and neighbor queries (`petri-grid`).
pub use petri_grid as grid;

/// The simulation engine and pipeline sequencer (`petri-engine`).
pub use petri_engine as engine;

/// Reference simulation models (`petri-models`).
pub use petri_models as models;

/// Common imports for typical petri usage.
///
/// ```rust
/// use petri::prelude::*;
/// ```
pub mod prelude {
    pub use petri_core::{
        Cell, LayerDef, LayerId, Mutability, Rect, RejectReason, Rgb, SetupError, StepId,
    };
    pub use petri_engine::{
        CellCtx, GridWorld, Model, Pipeline, Simulation, StepMetrics, StepOutcome, StepRequest,
        WorldConfig, WorldView,
    };
    pub use petri_grid::{Layer, NeighborQuery};
}
