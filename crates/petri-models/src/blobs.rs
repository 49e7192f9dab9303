//! Scent-following blobs with a cooling diffusion schedule.
//!
//! Blobs emit scent that diffuses to the 8-neighborhood and evaporates
//! in place. A blob climbs toward the neighbor with the best fitness —
//! a sqrt-damped weighted count of nearby blobs plus the local scent —
//! and random-walks when stranded with zero fitness of its own. The
//! scent diffusion rate cools over time and hits zero at
//! `cooling_time`, freezing the colony's shape.

use crate::palette;
use petri_core::{Cell, LayerDef, LayerId, Neighbors, Rect, Rgb, StepId};
use petri_engine::{CellCtx, Model, WorldView};
use petri_grid::{Layer, NeighborQuery};
use rand::Rng;
use smallvec::SmallVec;

/// Blobs per cell, clamped to `[0, 10]` on read.
pub const BLOBS: LayerId = LayerId(0);
/// Diffusing scent per cell.
pub const SCENT: LayerId = LayerId(1);

/// Fitness a blocked (occupied) neighbor reports.
const BLOCKED: f32 = -2.0;

/// The blob colony rule.
#[derive(Clone, Debug)]
pub struct Blobs {
    cols: u32,
    rows: u32,
    /// Chance each inner-rectangle cell starts with a blob.
    pub spawn_rate: f64,
    /// Margin (as a fraction of each axis) left empty at construction.
    pub boundary_percent: f64,
    /// Fitness weight of an orthogonal blob neighbor.
    pub ortho_weight: f32,
    /// Fitness weight of a diagonal blob neighbor.
    pub diag_weight: f32,
    /// Scent each blob emits per step (times the diffusion rate).
    pub scent_weight: f32,
    /// Diffusion rate before cooling is applied.
    pub base_diffusion: f32,
    /// Step at which the diffusion rate reaches zero.
    pub cooling_time: u64,
    /// Cooling curve exponent.
    pub cooling_pow: f32,
    /// Current diffusion rate; recomputed each step in `pre_step`.
    diffusion_rate: f32,
}

impl Blobs {
    /// A blob colony for a `cols x rows` grid.
    ///
    /// The grid size parameterizes the construction-time spawn
    /// rectangle, so it must match the world's configuration.
    pub fn new(cols: u32, rows: u32, spawn_rate: f64) -> Self {
        Self {
            cols,
            rows,
            spawn_rate,
            boundary_percent: 0.25,
            ortho_weight: 2.0,
            diag_weight: 1.0,
            scent_weight: 5.0,
            base_diffusion: 1.0,
            cooling_time: 100,
            cooling_pow: 1.0,
            diffusion_rate: -1.0,
        }
    }

    /// Set the cooling schedule.
    pub fn cooling(mut self, cooling_time: u64, cooling_pow: f32) -> Self {
        self.cooling_time = cooling_time;
        self.cooling_pow = cooling_pow;
        self
    }

    /// Total blobs in a committed generation.
    pub fn count(view: &WorldView<'_>) -> f32 {
        Rect::grid(view.cols(), view.rows())
            .cells()
            .map(|cell| view.read(BLOBS, cell))
            .sum()
    }

    /// Fitness of `cell` from the committed snapshot: sqrt-damped
    /// weighted blob-neighbor count plus the local scent (quartered on
    /// an occupied cell).
    fn fitness(&self, blobs: &Layer, scent: &Layer, cell: Cell) -> f32 {
        let mut fitness = blobs.sum_neighbors(cell, NeighborQuery::orthogonal(), |v| {
            self.ortho_weight * v
        }) + blobs.sum_neighbors(cell, NeighborQuery::diagonal(), |v| {
            self.diag_weight * v
        });
        if fitness > 0.0 {
            fitness = fitness.sqrt();
        }
        if blobs.get(cell) == 0.0 {
            fitness + scent.get(cell)
        } else {
            fitness + scent.get(cell) / 4.0
        }
    }

    /// Like [`fitness`](Blobs::fitness), but an occupied cell reports
    /// [`BLOCKED`] — used when scoring a move target.
    fn fitness_or_blocked(&self, blobs: &Layer, scent: &Layer, cell: Cell) -> f32 {
        if blobs.get(cell) > 0.0 {
            BLOCKED
        } else {
            self.fitness(blobs, scent, cell)
        }
    }
}

impl Model for Blobs {
    fn layers(&self) -> Vec<LayerDef> {
        let (cols, rows) = (self.cols as f64, self.rows as f64);
        let margin = self.boundary_percent;
        let spawn_rate = self.spawn_rate;
        vec![
            LayerDef::new("blobs").min(0.0).max(10.0).init_with(move |cell, rng| {
                let (x, y) = (cell.x as f64, cell.y as f64);
                let inside = cols * margin <= x
                    && x <= cols * (1.0 - margin)
                    && rows * margin <= y
                    && y <= rows * (1.0 - margin);
                if inside && rng.gen::<f64>() < spawn_rate {
                    1.0
                } else {
                    0.0
                }
            }),
            LayerDef::new("scent").min(0.0),
        ]
    }

    fn pre_step(&mut self, step: StepId) {
        let progress = step.0 as f32 / self.cooling_time as f32;
        let cooling_scale = 1.0 - progress.powf(1.0 / self.cooling_pow);
        self.diffusion_rate = (self.base_diffusion * cooling_scale).max(0.0);
    }

    fn update_cell(&self, cell: Cell, _step: StepId, ctx: &mut CellCtx<'_>) {
        let blobs = ctx.layer(BLOBS);
        let scent = ctx.layer(SCENT);

        // Scent evaporates in place and spreads an eighth of itself to
        // each in-grid neighbor, scaled by the cooling diffusion rate.
        let my_scent = scent.get(cell);
        ctx.accumulate(SCENT, cell, -my_scent);
        if my_scent > 0.001 && self.diffusion_rate > 0.0 {
            for n in scent.neighbors(cell, NeighborQuery::all()) {
                ctx.accumulate(SCENT, n, self.diffusion_rate * my_scent / 8.0);
            }
        }
        if self.diffusion_rate > 0.0 && blobs.get(cell) > 0.0 {
            ctx.accumulate(SCENT, cell, self.diffusion_rate * self.scent_weight);
        }

        if blobs.get(cell) == 0.0 {
            return;
        }

        let my_fitness = self.fitness(blobs, scent, cell);

        let mut better: SmallVec<[(Cell, f32); 8]> = SmallVec::new();
        let mut open: Neighbors = Neighbors::new();
        let candidates = blobs
            .neighbors(cell, NeighborQuery::orthogonal())
            .into_iter()
            .map(|n| (n, self.ortho_weight))
            .chain(
                blobs
                    .neighbors(cell, NeighborQuery::diagonal())
                    .into_iter()
                    .map(|n| (n, self.diag_weight)),
            );
        for (n, travel_cost) in candidates {
            let raw = self.fitness_or_blocked(blobs, scent, n);
            if raw == BLOCKED {
                continue;
            }
            open.push(n);
            let n_fitness = raw - travel_cost;
            if n_fitness > my_fitness && n_fitness > 0.0 {
                better.push((n, n_fitness));
            }
        }

        if !better.is_empty() {
            // Move toward improvement, weighted by fitness.
            let total: f32 = better.iter().map(|&(_, w)| w).sum();
            let mut draw = ctx.rng().gen::<f32>() * total;
            let mut target = better[better.len() - 1].0;
            for &(n, w) in &better {
                draw -= w;
                if draw <= 0.0 {
                    target = n;
                    break;
                }
            }
            ctx.accumulate(BLOBS, cell, -1.0);
            ctx.accumulate(BLOBS, target, 1.0);
        } else if my_fitness == 0.0 && !open.is_empty() {
            // Stranded: random walk.
            let target = open[ctx.rng().gen_range(0..open.len())];
            ctx.accumulate(BLOBS, cell, -1.0);
            ctx.accumulate(BLOBS, target, 1.0);
        }
    }

    fn shade(&self, cell: Cell, view: &WorldView<'_>) -> Rgb {
        if view.read(BLOBS, cell) > 0.0 {
            return palette::BLACK;
        }
        if self.scent_weight <= 0.0 {
            return palette::WHITE;
        }
        let levels = [
            palette::WHITE,
            palette::LIGHT_BLUE,
            palette::PURPLE,
            palette::LIGHT_RED,
            palette::YELLOW,
        ];
        let scent = view.read(SCENT, cell);
        for i in 1..levels.len() {
            if scent < i as f32 * self.scent_weight {
                let f = (scent - (i - 1) as f32 * self.scent_weight) / self.scent_weight;
                return levels[i - 1].lerp(levels[i], f);
            }
        }
        levels[levels.len() - 1]
    }

    fn is_done(&self, step: StepId, _view: &WorldView<'_>) -> bool {
        // Fully cooled: the diffusion rate is pinned to zero and the
        // colony shape is frozen apart from residual evaporation.
        step.0 >= self.cooling_time
    }
}
