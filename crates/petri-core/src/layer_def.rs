//! Layer definitions.
//!
//! A [`LayerDef`] describes one named scalar layer of simulation state:
//! its initial contents, optional clamp bounds applied on read, the
//! value returned for out-of-grid access, and whether the engine
//! rewrites it every generation.

use crate::cell::Cell;
use rand::RngCore;
use std::fmt;
use std::sync::Arc;

/// How a layer's storage behaves across generations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutability {
    /// Set once at construction, never touched by the step function.
    Static,
    /// Replaced wholesale at every generation commit.
    Dynamic,
}

/// Per-cell initializer: constant fill or a function of the coordinate.
///
/// `PerCell` initializers run once at construction, row-major, and draw
/// from the world's seed stream so that construction is reproducible.
#[derive(Clone)]
pub enum LayerInit {
    /// Every cell starts at the same value.
    Const(f32),
    /// Each cell starts at `f(cell, rng)`.
    PerCell(Arc<dyn Fn(Cell, &mut dyn RngCore) -> f32 + Send + Sync>),
}

impl LayerInit {
    /// Evaluate the initializer for one cell.
    pub fn value_for(&self, cell: Cell, rng: &mut dyn RngCore) -> f32 {
        match self {
            Self::Const(v) => *v,
            Self::PerCell(f) => f(cell, rng),
        }
    }
}

impl fmt::Debug for LayerInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(v) => f.debug_tuple("Const").field(v).finish(),
            Self::PerCell(_) => f.write_str("PerCell(..)"),
        }
    }
}

/// Definition of a layer registered in a simulation world.
///
/// Built with a fluent constructor set; only the key is required:
///
/// ```
/// use petri_core::LayerDef;
///
/// let trail = LayerDef::new("trail").min(0.0).max(16.0);
/// assert_eq!(trail.bounds, (Some(0.0), Some(16.0)));
/// ```
#[derive(Clone, Debug)]
pub struct LayerDef {
    /// Registration key, unique within a world.
    pub name: String,
    /// Initial contents.
    pub init: LayerInit,
    /// Optional `(min, max)` clamp bounds, applied on read only.
    pub bounds: (Option<f32>, Option<f32>),
    /// Value returned for coordinates outside the grid.
    pub out_of_bounds: f32,
    /// Whether the step function rewrites this layer.
    pub mutability: Mutability,
}

impl LayerDef {
    /// A dynamic, unbounded layer initialized to zero.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            init: LayerInit::Const(0.0),
            bounds: (None, None),
            out_of_bounds: 0.0,
            mutability: Mutability::Dynamic,
        }
    }

    /// Clamp reads to at least `v`.
    pub fn min(mut self, v: f32) -> Self {
        self.bounds.0 = Some(v);
        self
    }

    /// Clamp reads to at most `v`.
    pub fn max(mut self, v: f32) -> Self {
        self.bounds.1 = Some(v);
        self
    }

    /// Clamp reads to `[min, max]`.
    pub fn bounds(mut self, min: f32, max: f32) -> Self {
        self.bounds = (Some(min), Some(max));
        self
    }

    /// Value reported for out-of-grid coordinates (default 0).
    pub fn out_of_bounds(mut self, v: f32) -> Self {
        self.out_of_bounds = v;
        self
    }

    /// Initialize every cell to `v` (default 0).
    pub fn default_value(mut self, v: f32) -> Self {
        self.init = LayerInit::Const(v);
        self
    }

    /// Initialize each cell from a function of its coordinate.
    pub fn init_with(
        mut self,
        f: impl Fn(Cell, &mut dyn RngCore) -> f32 + Send + Sync + 'static,
    ) -> Self {
        self.init = LayerInit::PerCell(Arc::new(f));
        self
    }

    /// Mark the layer static: set once, never stepped.
    pub fn static_layer(mut self) -> Self {
        self.mutability = Mutability::Static;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn defaults_are_dynamic_zeroed_unbounded() {
        let def = LayerDef::new("ink");
        assert_eq!(def.name, "ink");
        assert_eq!(def.bounds, (None, None));
        assert_eq!(def.out_of_bounds, 0.0);
        assert_eq!(def.mutability, Mutability::Dynamic);
        let mut rng = StepRng::new(0, 1);
        assert_eq!(def.init.value_for(Cell::new(0, 0), &mut rng), 0.0);
    }

    #[test]
    fn per_cell_initializer_sees_the_coordinate() {
        let def = LayerDef::new("grad").init_with(|cell, _| cell.x as f32 + cell.y as f32);
        let mut rng = StepRng::new(0, 1);
        assert_eq!(def.init.value_for(Cell::new(2, 3), &mut rng), 5.0);
    }

    #[test]
    fn builder_composes() {
        let def = LayerDef::new("pressure")
            .min(-1.0)
            .max(1.0)
            .out_of_bounds(9.0)
            .static_layer();
        assert_eq!(def.bounds, (Some(-1.0), Some(1.0)));
        assert_eq!(def.out_of_bounds, 9.0);
        assert_eq!(def.mutability, Mutability::Static);
    }
}
