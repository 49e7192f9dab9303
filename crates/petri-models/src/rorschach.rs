//! The blob → inkblot pipeline.
//!
//! A blob colony grows and cools for three quarters of its cooling
//! time; its final silhouette is then stamped twice — through mirrored,
//! rotated rectangle mappings — into a triple-resolution inkblot sheet,
//! which spreads and dries the ink into a symmetric blot.

use crate::blobs::{self, Blobs};
use crate::inkblot::{self, Inkblot};
use crate::transfer::{rect_mapping, transfer_layer};
use petri_core::{Cell, SetupError};
use petri_engine::pipeline::StageProvider;
use petri_engine::{GridWorld, Pipeline, Simulation, WorldConfig};

/// The blob colony stage: dense spawn, linear cooling, serial sweep.
pub fn blob_stage(
    cols: u32,
    rows: u32,
    cooling_time: u64,
    seed: u64,
) -> Result<GridWorld<Blobs>, SetupError> {
    let model = Blobs::new(cols, rows, 0.8).cooling(cooling_time, 1.0);
    GridWorld::new(WorldConfig::new(cols, rows).seed(seed).serial(), model)
}

/// A stage that restarts the blob simulation from the outgoing one's
/// final silhouette.
pub fn blob_duplicator(seed: u64) -> StageProvider {
    Box::new(move |outgoing: &dyn Simulation| {
        let previous = outgoing
            .as_any()
            .downcast_ref::<GridWorld<Blobs>>()
            .expect("blob duplicator follows a blob stage");
        let (cols, rows) = previous.size();
        let cooling = previous.with_model(|m| m.cooling_time);
        let next = blob_stage(cols, rows, cooling, seed).expect("blob duplicator configuration");

        previous.with_view(|src_view| {
            next.with_view(|dst_view| {
                let src = src_view.layer(blobs::BLOBS);
                let dst = dst_view.layer(blobs::BLOBS);
                let corners = (Cell::new(0, 0), Cell::new(cols as i32, rows as i32));
                transfer_layer(src, dst, rect_mapping(corners, corners), |b, _| b);
            })
        });
        Box::new(next)
    })
}

/// A stage that maps the outgoing blob silhouette into a fresh inkblot
/// sheet, `upscale` times the blob grid's resolution.
///
/// The silhouette is stamped twice through mirrored, rotated rectangle
/// mappings centered on the sheet, so the resulting blot is symmetric
/// about the vertical midline.
pub fn ink_stage(upscale: u32, ink_height: f32, seed: u64) -> StageProvider {
    Box::new(move |outgoing: &dyn Simulation| {
        let blob_world = outgoing
            .as_any()
            .downcast_ref::<GridWorld<Blobs>>()
            .expect("ink stage follows a blob stage");
        let (blob_cols, blob_rows) = blob_world.size();
        let (cols, rows) = (blob_cols * upscale, blob_rows * upscale);
        let ink_world = GridWorld::new(
            WorldConfig::new(cols, rows).seed(seed).serial(),
            Inkblot::new(cols, rows),
        )
        .expect("ink stage configuration");

        let (w, h) = (cols as i32, rows as i32);
        let x_offs = w / 5;
        let mid_x = w / 2;
        let mid_y = h / 2;
        let src_corners = (Cell::new(0, 0), Cell::new(blob_cols as i32, blob_rows as i32));
        let stamp = |blob: f32, ink: f32| ink + if blob > 0.0 { ink_height } else { 0.0 };

        blob_world.with_view(|src_view| {
            ink_world.with_view(|dst_view| {
                let src = src_view.layer(blobs::BLOBS);
                let dst = dst_view.layer(inkblot::INK);
                let left = rect_mapping(
                    (
                        Cell::new(mid_x + x_offs, mid_y - w / 2),
                        Cell::new(mid_x + x_offs - h, mid_y + w / 2),
                    ),
                    src_corners,
                );
                transfer_layer(src, dst, left, stamp);
                let right = rect_mapping(
                    (
                        Cell::new(mid_x - x_offs, mid_y - w / 2),
                        Cell::new(mid_x - x_offs + h, mid_y + w / 2),
                    ),
                    src_corners,
                );
                transfer_layer(src, dst, right, stamp);
            })
        });
        Box::new(ink_world)
    })
}

/// The full two-stage pipeline: blobs for three quarters of a
/// 100-step cooling run, then the inkblot stage until the blot dries.
pub fn pipeline(cols: u32, rows: u32, seed: u64) -> Result<Pipeline, SetupError> {
    let cooling_time = 100;
    let blob_steps = cooling_time * 3 / 4;
    let first = blob_stage(cols, rows, cooling_time, seed)?;
    let pipe = Pipeline::new(Box::new(first), Some(blob_steps));
    pipe.push_stage(ink_stage(3, 1.5, seed ^ 1), None);
    Ok(pipe)
}
