//! Layer-to-layer state transfer between pipeline stages.
//!
//! Stage providers use these helpers to seed a new simulation's layer
//! from an outgoing simulation's committed state — including resampled,
//! rotated, or mirrored copies via a rectangle-to-rectangle coordinate
//! mapping. Strictly construction-time: transfers overwrite cells with
//! [`Layer::set`], which is not for use while a step is in flight.

use petri_core::Cell;
use petri_grid::Layer;

/// A linear mapping from one rectangle's coordinates to another's.
///
/// `from` and `to` are corner pairs; a coordinate at fraction `t` along
/// an axis of `from` maps to fraction `t` along the same axis of `to`,
/// rounded to the nearest cell. Inverted corner pairs mirror the axis,
/// which is how the mirrored halves of a blot are produced.
pub fn rect_mapping(from: (Cell, Cell), to: (Cell, Cell)) -> impl Fn(Cell) -> Cell {
    move |cell: Cell| {
        let tx = (cell.x - from.0.x) as f32 / (from.1.x - from.0.x) as f32;
        let ty = (cell.y - from.0.y) as f32 / (from.1.y - from.0.y) as f32;
        Cell::new(
            ((1.0 - tx) * to.0.x as f32 + tx * to.1.x as f32).round() as i32,
            ((1.0 - ty) * to.0.y as f32 + ty * to.1.y as f32).round() as i32,
        )
    }
}

/// Rewrite every cell of `dst` as `xform(src_value, dst_value)`, where
/// the source value is read at `map(cell)`.
///
/// Mapped coordinates outside the source grid read the source layer's
/// out-of-bounds value, so a partial overlap simply leaves the
/// uncovered destination cells at `xform(oob, current)`.
pub fn transfer_layer(
    src: &Layer,
    dst: &Layer,
    map: impl Fn(Cell) -> Cell,
    xform: impl Fn(f32, f32) -> f32,
) {
    for y in 0..dst.rows() as i32 {
        for x in 0..dst.cols() as i32 {
            let cell = Cell::new(x, y);
            let src_value = src.get(map(cell));
            let dst_value = dst.get(cell);
            dst.set(cell, xform(src_value, dst_value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petri_core::{LayerDef, Rect};

    fn layer(cols: u32, rows: u32) -> Layer {
        Layer::new(cols, rows, &LayerDef::new("t")).unwrap()
    }

    #[test]
    fn identity_mapping_copies_in_place() {
        let src = layer(4, 4);
        let dst = layer(4, 4);
        src.set(Cell::new(1, 2), 7.0);

        let corners = (Cell::new(0, 0), Cell::new(3, 3));
        transfer_layer(&src, &dst, rect_mapping(corners, corners), |s, d| s + d);
        assert_eq!(dst.get(Cell::new(1, 2)), 7.0);
        assert_eq!(dst.get(Cell::new(2, 1)), 0.0);
    }

    #[test]
    fn inverted_corners_mirror_the_axis() {
        let src = layer(4, 1);
        let dst = layer(4, 1);
        for x in 0..4 {
            src.set(Cell::new(x, 0), x as f32);
        }

        let map = rect_mapping(
            (Cell::new(3, 0), Cell::new(0, 0)),
            (Cell::new(0, 0), Cell::new(3, 0)),
        );
        transfer_layer(&src, &dst, map, |s, _| s);
        let values: Vec<f32> = Rect::grid(4, 1).cells().map(|c| dst.get(c)).collect();
        assert_eq!(values, vec![3.0, 2.0, 1.0, 0.0]);
    }

    #[test]
    fn upscaling_resamples_by_nearest_cell() {
        let src = layer(2, 2);
        let dst = layer(4, 4);
        src.set(Cell::new(0, 0), 1.0);
        src.set(Cell::new(1, 1), 2.0);

        let map = rect_mapping(
            (Cell::new(0, 0), Cell::new(3, 3)),
            (Cell::new(0, 0), Cell::new(1, 1)),
        );
        transfer_layer(&src, &dst, map, |s, _| s);
        assert_eq!(dst.get(Cell::new(0, 0)), 1.0);
        assert_eq!(dst.get(Cell::new(3, 3)), 2.0);
        // The far corner of the top-left quadrant rounds to src (1, 1).
        assert_eq!(dst.get(Cell::new(2, 2)), 2.0);
    }

    #[test]
    fn out_of_source_coordinates_read_the_oob_value() {
        let src = Layer::new(2, 2, &LayerDef::new("t").out_of_bounds(9.0)).unwrap();
        let dst = layer(2, 2);
        let map = |cell: Cell| cell.offset(10, 10);
        transfer_layer(&src, &dst, map, |s, _| s);
        assert_eq!(dst.get(Cell::new(0, 0)), 9.0);
    }
}
