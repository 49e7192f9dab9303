//! Reference simulation models for the petri engine.
//!
//! Each model is a plug-in [`Model`](petri_engine::Model): a small
//! per-cell rule plus its layer declarations and render shading. The
//! interesting machinery — double-buffered generations, chunked
//! parallel sweeps, pipelines — lives in `petri-engine`; these rules
//! only read committed neighbors and accumulate deltas.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod ants;
pub mod blobs;
pub mod conway;
pub mod inkblot;
pub mod palette;
pub mod rorschach;
pub mod transfer;

pub use ants::Ants;
pub use blobs::Blobs;
pub use conway::Conway;
pub use inkblot::Inkblot;
