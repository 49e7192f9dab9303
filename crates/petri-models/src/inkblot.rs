//! Pressure-driven ink diffusion.
//!
//! Wet ink sits on paper with a static ambient-pressure map: high
//! along the sheet's edge (pushing ink inward) and mildly noisy in the
//! interior (breaking up symmetric flows). Each step, ink flows toward
//! neighbors with lower potential (ink height + pressure) under a
//! Jacobi-style exchange kernel, and a fraction of every cell's ink
//! dries in place. Once no wet ink remains the blot is finished.

use crate::palette;
use petri_core::{Cell, LayerDef, LayerId, Rect, Rgb, StepId};
use petri_engine::{CellCtx, Model, WorldView};
use petri_grid::NeighborQuery;
use rand::Rng;
use smallvec::SmallVec;

/// Static ambient pressure per cell.
pub const PRESSURE: LayerId = LayerId(0);
/// Wet ink height per cell.
pub const INK: LayerId = LayerId(1);
/// Dried ink per cell.
pub const DRIED: LayerId = LayerId(2);

/// The inkblot rule.
#[derive(Clone, Debug)]
pub struct Inkblot {
    cols: u32,
    rows: u32,
    /// Interior pressure noise ceiling.
    pub max_static_pressure: f32,
    /// Pressure at the sheet's edge.
    pub boundary_pressure: f32,
    /// Ink height rendered as fully black.
    pub max_render_value: f32,
    /// Fraction of a potential difference that flows per step.
    pub flow_rate: f32,
    /// Fraction of a cell's wet ink that dries per step.
    pub dry_rate: f32,
    /// Wet ink below this dries completely at once.
    pub dry_threshold: f32,
}

impl Inkblot {
    /// An inkblot sheet for a `cols x rows` grid.
    ///
    /// The grid size parameterizes the static pressure map, so it must
    /// match the world's configuration.
    pub fn new(cols: u32, rows: u32) -> Self {
        Self {
            cols,
            rows,
            max_static_pressure: 0.45,
            boundary_pressure: 1.2,
            max_render_value: 1.33,
            flow_rate: 0.5,
            dry_rate: 0.05,
            dry_threshold: 0.05,
        }
    }

    /// Total ink (wet plus dried) in a committed generation.
    pub fn total_ink(view: &WorldView<'_>) -> f32 {
        Rect::grid(view.cols(), view.rows())
            .cells()
            .map(|cell| view.read(INK, cell) + view.read(DRIED, cell))
            .sum()
    }
}

impl Model for Inkblot {
    fn layers(&self) -> Vec<LayerDef> {
        let (cols, rows) = (self.cols as i32, self.rows as i32);
        let boundary = self.boundary_pressure;
        let interior = self.max_static_pressure;
        // Edge pressure falls off over roughly a tenth of the short axis.
        let falloff = (cols.min(rows) as f32 / 10.0).max(1.0);
        vec![
            LayerDef::new("pressure")
                .static_layer()
                .out_of_bounds(boundary)
                .init_with(move |cell, rng| {
                    let edge_dist = cell
                        .x
                        .min(cell.y)
                        .min(cols - 1 - cell.x)
                        .min(rows - 1 - cell.y) as f32;
                    let edge_term = boundary * (1.0 - edge_dist / falloff).max(0.0);
                    edge_term + rng.gen::<f32>() * interior
                }),
            LayerDef::new("ink").min(0.0),
            LayerDef::new("dried").min(0.0),
        ]
    }

    fn update_cell(&self, cell: Cell, _step: StepId, ctx: &mut CellCtx<'_>) {
        let ink_layer = ctx.layer(INK);
        let pressure = ctx.layer(PRESSURE);

        let ink = ctx.read(INK, cell);
        if ink <= 0.0 {
            return;
        }

        // Drying first: thin films dry outright, the rest loses a
        // fixed fraction. Total wet ink shrinks geometrically, so the
        // blot always settles.
        let dried = if ink < self.dry_threshold {
            ink
        } else {
            ink * self.dry_rate
        };
        ctx.accumulate(INK, cell, -dried);
        ctx.accumulate(DRIED, cell, dried);
        let wet = ink - dried;
        if wet <= 0.0 {
            return;
        }

        // Flow toward lower potential, computed entirely from the
        // committed snapshot so the exchange is order-independent.
        let own_potential = ink + pressure.get(cell);
        let mut flows: SmallVec<[(Cell, f32); 8]> = SmallVec::new();
        let mut outflow = 0.0;
        for n in ink_layer.neighbors(cell, NeighborQuery::all()) {
            let diff = own_potential - (ink_layer.get(n) + pressure.get(n));
            if diff > 0.0 {
                let amount = self.flow_rate * diff / 8.0;
                flows.push((n, amount));
                outflow += amount;
            }
        }
        if flows.is_empty() {
            return;
        }

        // Never drain more than half the wet ink in one step.
        let cap = wet * 0.5;
        let scale = if outflow > cap { cap / outflow } else { 1.0 };
        for (n, amount) in flows {
            ctx.accumulate(INK, n, amount * scale);
            ctx.accumulate(INK, cell, -(amount * scale));
        }
    }

    fn shade(&self, cell: Cell, view: &WorldView<'_>) -> Rgb {
        let coverage = (view.read(INK, cell) + view.read(DRIED, cell)) / self.max_render_value;
        palette::WHITE.lerp(palette::BLACK, coverage.min(1.0))
    }

    fn is_done(&self, _step: StepId, view: &WorldView<'_>) -> bool {
        let ink = view.layer(INK);
        Rect::grid(self.cols, self.rows)
            .cells()
            .all(|cell| ink.get(cell) <= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petri_engine::{GridWorld, WorldConfig};

    fn world() -> GridWorld<Inkblot> {
        GridWorld::new(WorldConfig::new(16, 12).seed(2).chunk(8), Inkblot::new(16, 12)).unwrap()
    }

    fn drop_ink(world: &GridWorld<Inkblot>, cell: Cell, amount: f32) {
        world.with_view(|view| view.layer(INK).set(cell, amount));
    }

    #[test]
    fn pressure_is_static_and_highest_at_the_edge() {
        let world = world();
        let edge = world.value(PRESSURE, Cell::new(0, 5));
        let center = world.value(PRESSURE, Cell::new(8, 6));
        assert!(edge > center);

        drop_ink(&world, Cell::new(8, 6), 2.0);
        world.step();
        assert_eq!(world.value(PRESSURE, Cell::new(0, 5)), edge);
        assert_eq!(world.value(PRESSURE, Cell::new(8, 6)), center);
    }

    #[test]
    fn a_dry_sheet_is_born_done() {
        let world = world();
        assert!(world.is_done());
        assert!(world.step().rejection().is_some());
    }

    #[test]
    fn ink_spreads_to_lower_potential_neighbors() {
        let world = world();
        let center = Cell::new(8, 6);
        drop_ink(&world, center, 2.0);
        world.step();

        let spread: f32 = world.with_view(|view| {
            view.layer(INK)
                .sum_neighbors(center, NeighborQuery::all(), |v| v)
        });
        assert!(spread > 0.0, "tall ink column failed to spread");
        assert!(world.value(INK, center) < 2.0);
    }

    #[test]
    fn ink_is_conserved_while_it_dries() {
        let world = world();
        drop_ink(&world, Cell::new(8, 6), 2.0);
        drop_ink(&world, Cell::new(9, 6), 1.0);

        let initial = world.with_view(Inkblot::total_ink);
        for _ in 0..20 {
            world.step();
            let total = world.with_view(Inkblot::total_ink);
            assert!(
                (total - initial).abs() < 1e-3,
                "ink leaked: {total} vs {initial}"
            );
        }
    }

    #[test]
    fn the_blot_eventually_dries_and_reports_done() {
        let world = world();
        drop_ink(&world, Cell::new(8, 6), 1.5);

        let mut steps = 0;
        while !world.is_done() {
            assert!(world.step().is_stepped());
            steps += 1;
            assert!(steps < 2000, "blot never dried");
        }
        // Everything that was wet is now dried.
        let dried: f32 = Rect::grid(16, 12)
            .cells()
            .map(|cell| world.value(DRIED, cell))
            .sum();
        assert!((dried - 1.5).abs() < 1e-3);
    }

    #[test]
    fn heavier_coverage_renders_darker() {
        let world = world();
        drop_ink(&world, Cell::new(3, 3), 10.0);
        drop_ink(&world, Cell::new(4, 3), 0.4);
        let mut colors = Vec::new();
        world.fetch_colors(Rect::new(3, 3, 2, 1), &mut |_, c| colors.push(c));
        assert_eq!(colors[0], palette::BLACK);
        assert!(colors[1].0 > 0 && colors[1].0 < 255);
    }
}
