//! Trail-laying ants.
//!
//! Each ant wanders into fresh territory — a random neighbor with no
//! trail and no corpse — laying trail behind it. With a little luck an
//! ant splits into two; an ant with nowhere untouched to go dies in
//! place. Trail on empty cells decays one unit per step.

use crate::palette;
use petri_core::{Cell, LayerDef, LayerId, Rect, Rgb, StepId};
use petri_engine::{CellCtx, Model, WorldView};
use petri_grid::NeighborQuery;
use rand::Rng;

/// Live ants per cell.
pub const ANTS: LayerId = LayerId(0);
/// Trail strength per cell, clamped to `[0, trail_strength]` on read.
pub const TRAIL: LayerId = LayerId(1);
/// Dead ants per cell.
pub const DEAD: LayerId = LayerId(2);

/// The ant colony rule.
#[derive(Clone, Debug)]
pub struct Ants {
    /// Chance each cell starts with an ant.
    pub spawn_chance: f64,
    /// Chance a moving ant splits into two instead.
    pub split_chance: f64,
    /// Trail laid per visited cell; also the read clamp ceiling.
    pub trail_strength: f32,
}

impl Ants {
    /// An ant colony with the given initial spawn chance.
    pub fn new(spawn_chance: f64) -> Self {
        Self {
            spawn_chance,
            split_chance: 0.01,
            trail_strength: 16.0,
        }
    }

    /// Total live ants in a committed generation.
    pub fn alive(view: &WorldView<'_>) -> f32 {
        Rect::grid(view.cols(), view.rows())
            .cells()
            .map(|cell| view.read(ANTS, cell))
            .sum()
    }
}

impl Default for Ants {
    fn default() -> Self {
        Self::new(0.01)
    }
}

impl Model for Ants {
    fn layers(&self) -> Vec<LayerDef> {
        let spawn_chance = self.spawn_chance;
        vec![
            LayerDef::new("ants").min(0.0).init_with(move |_, rng| {
                if rng.gen::<f64>() < spawn_chance {
                    1.0
                } else {
                    0.0
                }
            }),
            LayerDef::new("trail").min(0.0).max(self.trail_strength),
            LayerDef::new("dead").min(0.0),
        ]
    }

    fn update_cell(&self, cell: Cell, _step: StepId, ctx: &mut CellCtx<'_>) {
        let ants = ctx.layer(ANTS);
        let trail = ctx.layer(TRAIL);
        let dead = ctx.layer(DEAD);

        let ant_count = ctx.read(ANTS, cell) as i64;
        if ant_count == 0 {
            ctx.accumulate(TRAIL, cell, -1.0);
            return;
        }

        for _ in 0..ant_count {
            let mut fresh = ants.neighbors_shuffled(cell, NeighborQuery::all(), ctx.rng());
            fresh.retain(|n| trail.get(*n) == 0.0 && dead.get(*n) == 0.0);

            if fresh.len() >= 2 && ctx.rng().gen::<f64>() < self.split_chance {
                ctx.accumulate(ANTS, fresh[0], 1.0);
                ctx.accumulate(ANTS, fresh[1], 1.0);
                ctx.accumulate(ANTS, cell, -1.0);
                ctx.accumulate(TRAIL, cell, self.trail_strength);
            } else if let Some(&target) = fresh.first() {
                ctx.accumulate(ANTS, target, 1.0);
                ctx.accumulate(ANTS, cell, -1.0);
                ctx.accumulate(TRAIL, cell, self.trail_strength);
            } else {
                // Boxed in: the ant dies where it stands.
                ctx.accumulate(ANTS, cell, -1.0);
                ctx.accumulate(DEAD, cell, 1.0);
            }
        }
    }

    fn shade(&self, cell: Cell, view: &WorldView<'_>) -> Rgb {
        if view.read(ANTS, cell) > 0.0 {
            return palette::BLACK;
        }
        if view.read(DEAD, cell) > 0.0 {
            return palette::RED;
        }
        let trail = view.read(TRAIL, cell);
        if trail > 0.0 {
            palette::WHITE.lerp(palette::PURPLE, trail / self.trail_strength)
        } else {
            palette::WHITE
        }
    }
}
