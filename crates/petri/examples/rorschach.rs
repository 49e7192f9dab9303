//! Run the blob → inkblot pipeline to completion and print a coarse
//! ASCII rendering of the finished blot.
//!
//! Run with: `cargo run --example rorschach`

use petri::models::rorschach;
use petri::prelude::*;

fn main() {
    let pipeline = rorschach::pipeline(60, 45, 7).unwrap();

    while !pipeline.is_done() {
        if let StepOutcome::Stepped(metrics) = Pipeline::step(&pipeline) {
            if pipeline.step_id().0 % 25 == 0 {
                println!(
                    "step {} ({} cells in {} us)",
                    pipeline.step_id(),
                    metrics.cells,
                    metrics.total_us
                );
            }
        }
    }
    println!("finished after {} steps", pipeline.step_id());

    // Sample every third cell into a character ramp.
    let (cols, rows) = pipeline.size();
    let ramp = [' ', '.', ':', '*', '#', '@'];
    let mut canvas = vec![vec![' '; (cols / 3) as usize]; (rows / 3) as usize];
    pipeline.fetch_colors(Rect::grid(cols, rows), &mut |cell, color| {
        if cell.x % 3 == 0 && cell.y % 3 == 0 {
            let darkness = 255 - color.0 as usize;
            let glyph = ramp[(darkness * (ramp.len() - 1)) / 255];
            canvas[(cell.y / 3) as usize][(cell.x / 3) as usize] = glyph;
        }
    });
    for row in canvas {
        println!("{}", row.into_iter().collect::<String>());
    }
}
