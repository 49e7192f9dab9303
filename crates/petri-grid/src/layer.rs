//! The [`Layer`] grid plane.

use crate::atomic::AtomicF32;
use crate::query::NeighborQuery;
use petri_core::{Cell, LayerDef, LayerInit, Neighbors, SetupError};
use rand::seq::SliceRandom;
use rand::Rng;

/// The four cardinal offsets, in canonical order: W, N, E, S.
const ORTHO_OFFSETS: [(i32, i32); 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];

/// The four diagonal offsets, in canonical order: NW, NE, SE, SW.
const DIAG_OFFSETS: [(i32, i32); 4] = [(-1, -1), (1, -1), (1, 1), (-1, 1)];

/// A dense W×H plane of `f32` cells with clamp-on-read bounds and a
/// fixed out-of-grid value.
///
/// # Mutation contract
///
/// [`add`](Layer::add) is the only mutation permitted while a
/// generation step is in flight; it is atomic per cell, so concurrent
/// accumulations from different chunk workers never lose an update.
/// [`set`](Layer::set) and [`fill`](Layer::fill) are overwrites for
/// construction and between-step state transfer only — interleaving
/// them with an in-flight step tears the generation they land in.
///
/// # Clamping
///
/// Bounds clamp on *read only*. The store keeps the raw accumulated
/// value, so a cell pushed past `max` by repeated `add`s still walks
/// back through its true unclamped total when negative deltas arrive.
#[derive(Debug)]
pub struct Layer {
    cols: u32,
    rows: u32,
    min: Option<f32>,
    max: Option<f32>,
    out_of_bounds: f32,
    default: f32,
    cells: Vec<AtomicF32>,
}

impl Layer {
    /// Maximum cells per axis — coordinates are `i32`.
    pub const MAX_DIM: u32 = i32::MAX as u32;

    /// Construct a layer from its definition.
    ///
    /// `Const` initializers are applied here; `PerCell` initializers
    /// are the world's job (they draw from the world's seed stream),
    /// so such layers start at zero until the world fills them.
    pub fn new(cols: u32, rows: u32, def: &LayerDef) -> Result<Self, SetupError> {
        if cols == 0 || rows == 0 {
            return Err(SetupError::EmptyGrid);
        }
        if cols > Self::MAX_DIM {
            return Err(SetupError::DimensionTooLarge {
                axis: "cols",
                value: cols,
            });
        }
        if rows > Self::MAX_DIM {
            return Err(SetupError::DimensionTooLarge {
                axis: "rows",
                value: rows,
            });
        }
        let default = match def.init {
            LayerInit::Const(v) => v,
            LayerInit::PerCell(_) => 0.0,
        };
        let len = cols as usize * rows as usize;
        Ok(Self {
            cols,
            rows,
            min: def.bounds.0,
            max: def.bounds.1,
            out_of_bounds: def.out_of_bounds,
            default,
            cells: (0..len).map(|_| AtomicF32::new(default)).collect(),
        })
    }

    /// Columns in the grid.
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Rows in the grid.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Total cell count.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// The configured `(min, max)` clamp bounds.
    pub fn bounds(&self) -> (Option<f32>, Option<f32>) {
        (self.min, self.max)
    }

    /// The value reported for out-of-grid coordinates.
    pub fn out_of_bounds_value(&self) -> f32 {
        self.out_of_bounds
    }

    /// Whether `cell` lies inside `[0, cols) × [0, rows)`.
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && (cell.x as u32) < self.cols && cell.y >= 0 && (cell.y as u32) < self.rows
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if self.contains(cell) {
            Some(cell.y as usize * self.cols as usize + cell.x as usize)
        } else {
            None
        }
    }

    fn clamp(&self, v: f32) -> f32 {
        if let Some(max) = self.max {
            if v > max {
                return max;
            }
        }
        if let Some(min) = self.min {
            if v < min {
                return min;
            }
        }
        v
    }

    /// Read the value at `cell`, clamped to the configured bounds.
    ///
    /// Out-of-grid coordinates resolve to the out-of-bounds value —
    /// never an error. Safe for concurrent callers.
    pub fn get(&self, cell: Cell) -> f32 {
        match self.index(cell) {
            Some(i) => self.clamp(self.cells[i].load()),
            None => self.out_of_bounds,
        }
    }

    /// Read the raw stored value at `cell`, without clamping.
    ///
    /// Returns `None` out of grid. Used for duplication and tests;
    /// update rules read through [`get`](Layer::get).
    pub fn raw(&self, cell: Cell) -> Option<f32> {
        self.index(cell).map(|i| self.cells[i].load())
    }

    /// Overwrite the value at `cell`; no-op out of grid.
    ///
    /// Construction and between-step use only — see the type-level
    /// mutation contract.
    pub fn set(&self, cell: Cell, v: f32) {
        if let Some(i) = self.index(cell) {
            self.cells[i].store(v);
        }
    }

    /// Overwrite every cell with `v`.
    ///
    /// Construction and between-step use only.
    pub fn fill(&self, v: f32) {
        for cell in &self.cells {
            cell.store(v);
        }
    }

    /// Atomically add `delta` to the value at `cell`; no-op out of grid.
    ///
    /// The only mutation permitted during a step. Concurrent calls from
    /// different chunk workers targeting the same cell serialize; no
    /// update is lost.
    pub fn add(&self, cell: Cell, delta: f32) {
        if let Some(i) = self.index(cell) {
            self.cells[i].fetch_add(delta);
        }
    }

    /// Enumerate the neighbors of `cell` selected by `query`.
    ///
    /// Candidates come in a fixed canonical order (cardinals W, N, E, S
    /// then diagonals NW, NE, SE, SW); with `valid_only` the out-of-grid
    /// candidates are dropped, so an interior cell yields 8 and a corner
    /// yields 3 for the full neighborhood.
    pub fn neighbors(&self, cell: Cell, query: NeighborQuery) -> Neighbors {
        let mut out = Neighbors::new();
        if query.orthogonal {
            for (dx, dy) in ORTHO_OFFSETS {
                let n = cell.offset(dx, dy);
                if !query.valid_only || self.contains(n) {
                    out.push(n);
                }
            }
        }
        if query.diagonal {
            for (dx, dy) in DIAG_OFFSETS {
                let n = cell.offset(dx, dy);
                if !query.valid_only || self.contains(n) {
                    out.push(n);
                }
            }
        }
        out
    }

    /// Like [`neighbors`](Layer::neighbors), in an order randomized by
    /// `rng`.
    ///
    /// Rules that pick "any one free neighbor" use this to avoid the
    /// directional bias a fixed enumeration order would bake in.
    pub fn neighbors_shuffled<R: Rng + ?Sized>(
        &self,
        cell: Cell,
        query: NeighborQuery,
        rng: &mut R,
    ) -> Neighbors {
        let mut out = self.neighbors(cell, query);
        out.shuffle(rng);
        out
    }

    /// Fold `transform(get(n))` over the selected neighbors of `cell`.
    pub fn sum_neighbors(
        &self,
        cell: Cell,
        query: NeighborQuery,
        transform: impl Fn(f32) -> f32,
    ) -> f32 {
        self.neighbors(cell, query)
            .iter()
            .map(|&n| transform(self.get(n)))
            .sum()
    }

    /// A new layer with identical configuration.
    ///
    /// With `empty` false, every cell's raw (unclamped) stored value is
    /// copied — this is how generation write buffers are seeded. With
    /// `empty` true, cells start at the layer's default value.
    pub fn duplicate(&self, empty: bool) -> Layer {
        let cells = if empty {
            (0..self.cells.len())
                .map(|_| AtomicF32::new(self.default))
                .collect()
        } else {
            self.cells.iter().map(|c| AtomicF32::new(c.load())).collect()
        };
        Layer {
            cols: self.cols,
            rows: self.rows,
            min: self.min,
            max: self.max,
            out_of_bounds: self.out_of_bounds,
            default: self.default,
            cells,
        }
    }
}
