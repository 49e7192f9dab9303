//! Core types for the petri grid simulation engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the rest of the workspace: typed IDs, grid
//! coordinates, render colors, layer definitions, and the error and
//! rejection taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cell;
pub mod color;
pub mod error;
pub mod id;
pub mod layer_def;

pub use cell::{Cell, Rect};
pub use color::Rgb;
pub use error::{RejectReason, SetupError};
pub use id::{LayerId, StepId};
pub use layer_def::{LayerDef, LayerInit, Mutability};

use smallvec::SmallVec;

/// A list of neighbor coordinates.
///
/// Holds up to the full 8-connected neighborhood inline, so enumeration
/// in per-cell hot loops never allocates.
pub type Neighbors = SmallVec<[Cell; 8]>;
