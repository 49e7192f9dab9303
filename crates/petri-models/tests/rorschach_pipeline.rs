//! End-to-end pipeline tests: blob stage → inkblot stage with state
//! hand-off and cumulative step accounting.

use petri_core::{Cell, Rect, StepId};
use petri_engine::Simulation;
use petri_models::rorschach;
use petri_models::{blobs::Blobs, inkblot};

#[test]
fn blob_silhouette_lands_in_the_ink_sheet() {
    let pipeline = rorschach::pipeline(16, 12, 42).unwrap();

    // Stage 1 runs to its 75-step limit; the swap happens after the
    // 75th step, strictly between generations.
    for expected in 1..=75u64 {
        assert!(pipeline.step().is_stepped());
        assert_eq!(pipeline.step_id(), StepId(expected));
    }

    // The active simulation is now the upscaled ink sheet, and the
    // global counter carried over.
    assert_eq!(pipeline.size(), (48, 36));
    assert_eq!(pipeline.step_id(), StepId(75));
    assert!(!pipeline.is_done());

    let ink_total: f32 = Rect::grid(48, 36)
        .cells()
        .filter_map(|cell| pipeline.value_by_name("ink", cell))
        .sum();
    assert!(ink_total > 0.0, "no ink was transferred from the blobs");

    // Stepping continues on the new stage with the counter still
    // accumulating.
    assert!(pipeline.step().is_stepped());
    assert_eq!(pipeline.step_id(), StepId(76));
}

#[test]
fn the_fresh_blot_is_mirror_symmetric() {
    let pipeline = rorschach::pipeline(16, 12, 7).unwrap();
    for _ in 0..75 {
        pipeline.step();
    }

    // The two stamps are reflections about the vertical midline: for
    // every cell, ink(x, y) == ink(2 * mid_x - x, y).
    let mid_x = 48 / 2;
    for cell in Rect::grid(48, 36).cells() {
        let mirror = Cell::new(2 * mid_x - cell.x, cell.y);
        if mirror.x < 0 || mirror.x >= 48 {
            continue;
        }
        let a = pipeline.value_by_name("ink", cell).unwrap();
        let b = pipeline.value_by_name("ink", mirror).unwrap();
        assert_eq!(a, b, "asymmetry at {cell} vs {mirror}");
    }
}

#[test]
fn blob_duplicator_restarts_with_the_same_silhouette() {
    let first = rorschach::blob_stage(12, 10, 100, 3).unwrap();
    let pipeline = petri_engine::Pipeline::new(Box::new(first), Some(3));
    pipeline.push_stage(rorschach::blob_duplicator(4), None);

    // Two steps in: still the first stage.
    pipeline.step();
    pipeline.step();
    let count_before: f32 = Rect::grid(12, 10)
        .cells()
        .filter_map(|cell| pipeline.value_by_name("blobs", cell))
        .sum();
    assert!(count_before > 0.0);

    // The 3rd step hits the limit and swaps; the new stage carries the
    // outgoing silhouette and the global counter holds at 3.
    pipeline.step();
    assert_eq!(pipeline.step_id(), StepId(3));
    let count_after: f32 = Rect::grid(12, 10)
        .cells()
        .filter_map(|cell| pipeline.value_by_name("blobs", cell))
        .sum();
    assert_eq!(count_before, count_after);

    pipeline.step();
    assert_eq!(pipeline.step_id(), StepId(4));
}

#[test]
fn the_pipeline_finishes_when_the_blot_dries() {
    // A tiny, nearly-empty run so the drying tail stays short.
    let first = rorschach::blob_stage(6, 6, 8, 1).unwrap();
    let pipeline = petri_engine::Pipeline::new(Box::new(first), Some(4));
    pipeline.push_stage(rorschach::ink_stage(2, 1.0, 2), None);

    let mut steps = 0;
    while !pipeline.is_done() {
        pipeline.step();
        steps += 1;
        assert!(steps < 3000, "pipeline never finished");
    }

    // All transferred ink ended up dried.
    let wet: f32 = Rect::grid(12, 12)
        .cells()
        .filter_map(|cell| pipeline.value_by_name("ink", cell))
        .sum();
    assert_eq!(wet, 0.0);
    let dried: f32 = Rect::grid(12, 12)
        .cells()
        .filter_map(|cell| pipeline.value_by_name("dried", cell))
        .sum();
    assert!(dried > 0.0);
}

#[test]
fn inkblot_constants_match_the_blob_mapper_defaults() {
    // The ink stage inherits the mapper's tuning.
    let sheet = inkblot::Inkblot::new(10, 10);
    assert_eq!(sheet.max_static_pressure, 0.45);
    assert_eq!(sheet.boundary_pressure, 1.2);
    assert_eq!(sheet.max_render_value, 1.33);

    let colony = Blobs::new(10, 10, 0.8);
    assert_eq!(colony.scent_weight, 5.0);
    assert_eq!(colony.ortho_weight, 2.0);
    assert_eq!(colony.diag_weight, 1.0);
}
