//! Conway-style life with configurable birth/death count sets.
//!
//! The classic rule counts all 8 neighbors; this variant additionally
//! lets the orthogonal and diagonal rings trigger births and deaths on
//! their own counts, which is enough to express a family of related
//! automata. The defaults reproduce Conway's Game of Life.

use crate::palette;
use petri_core::{Cell, LayerDef, LayerId, Rgb, StepId};
use petri_engine::{CellCtx, Model, WorldView};
use petri_grid::NeighborQuery;
use rand::Rng;

/// Live cells, clamped to `[0, 1]` on read.
pub const CELLS: LayerId = LayerId(0);

/// The life rule.
#[derive(Clone, Debug)]
pub struct Conway {
    /// Chance each cell starts alive.
    pub spawn_rate: f64,
    /// Total live-neighbor counts that kill a live cell.
    pub die_total: Vec<u32>,
    /// Total live-neighbor counts that spawn into a dead cell.
    pub spawn_total: Vec<u32>,
    /// Orthogonal-ring counts that kill.
    pub die_ortho: Vec<u32>,
    /// Orthogonal-ring counts that spawn.
    pub spawn_ortho: Vec<u32>,
    /// Diagonal-ring counts that kill.
    pub die_diag: Vec<u32>,
    /// Diagonal-ring counts that spawn.
    pub spawn_diag: Vec<u32>,
}

impl Conway {
    /// Conway's Game of Life: die outside 2-3 neighbors, spawn on 3.
    pub fn life(spawn_rate: f64) -> Self {
        Self {
            spawn_rate,
            die_total: vec![0, 1, 4, 5, 6, 7, 8],
            spawn_total: vec![3],
            die_ortho: Vec::new(),
            spawn_ortho: Vec::new(),
            die_diag: Vec::new(),
            spawn_diag: Vec::new(),
        }
    }
}

impl Default for Conway {
    fn default() -> Self {
        Self::life(0.1)
    }
}

impl Model for Conway {
    fn layers(&self) -> Vec<LayerDef> {
        let spawn_rate = self.spawn_rate;
        vec![LayerDef::new("cells").min(0.0).max(1.0).init_with(
            move |_, rng| {
                if rng.gen::<f64>() < spawn_rate {
                    1.0
                } else {
                    0.0
                }
            },
        )]
    }

    fn update_cell(&self, cell: Cell, _step: StepId, ctx: &mut CellCtx<'_>) {
        let layer = ctx.layer(CELLS);
        let total = layer.sum_neighbors(cell, NeighborQuery::all(), |v| v) as u32;
        let ortho = layer.sum_neighbors(cell, NeighborQuery::orthogonal(), |v| v) as u32;
        let diag = total - ortho;

        if layer.get(cell) > 0.0 {
            if self.die_total.contains(&total)
                || self.die_ortho.contains(&ortho)
                || self.die_diag.contains(&diag)
            {
                ctx.accumulate(CELLS, cell, -1.0);
            }
        } else if self.spawn_total.contains(&total)
            || self.spawn_ortho.contains(&ortho)
            || self.spawn_diag.contains(&diag)
        {
            ctx.accumulate(CELLS, cell, 1.0);
        }
    }

    fn shade(&self, cell: Cell, view: &WorldView<'_>) -> Rgb {
        if view.read(CELLS, cell) > 0.0 {
            palette::BLACK
        } else {
            palette::WHITE
        }
    }
}
