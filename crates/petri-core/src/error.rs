//! Error and rejection taxonomy.
//!
//! Setup-time failures are unrecoverable and propagate as [`SetupError`].
//! Runtime concurrency conflicts are not errors at all: they are typed
//! rejection outcomes carrying a [`RejectReason`], and never panic or
//! abort a committed generation.

use std::error::Error;
use std::fmt;

/// Errors detected while constructing a simulation world.
///
/// All variants are fatal to setup: the world is never partially built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetupError {
    /// A layer key was registered twice.
    DuplicateLayer {
        /// The offending key.
        name: String,
    },
    /// The grid has zero columns or zero rows.
    EmptyGrid,
    /// The model declared no layers.
    NoLayers,
    /// A grid dimension exceeds the coordinate range.
    DimensionTooLarge {
        /// Axis name (`"cols"` or `"rows"`).
        axis: &'static str,
        /// The configured value.
        value: u32,
    },
    /// The chunk edge length is zero.
    ZeroChunkSize,
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateLayer { name } => write!(f, "layer key already in use: {name}"),
            Self::EmptyGrid => write!(f, "grid has zero cells"),
            Self::NoLayers => write!(f, "model declared no layers"),
            Self::DimensionTooLarge { axis, value } => {
                write!(f, "{axis} = {value} exceeds coordinate range")
            }
            Self::ZeroChunkSize => write!(f, "chunk size must be at least 1"),
        }
    }
}

impl Error for SetupError {}

/// Why a step request was rejected.
///
/// Rejection is a no-op with an observable reason, not an error: the
/// step counter is untouched and the caller may retry later.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// A step is already in flight for this simulation instance.
    StepInFlight,
    /// The simulation (or the whole pipeline) reports done.
    Exhausted,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StepInFlight => write!(f, "a step is already in flight"),
            Self::Exhausted => write!(f, "simulation is exhausted"),
        }
    }
}
