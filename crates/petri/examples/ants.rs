//! Drive an ant colony with asynchronous steps, polling progress while
//! each generation is in flight.
//!
//! Run with: `cargo run --example ants`

use petri::models::ants::Ants;
use petri::prelude::*;
use std::thread;
use std::time::Duration;

fn main() {
    let world = GridWorld::new(WorldConfig::new(640, 64).seed(42), Ants::new(0.01)).unwrap();
    let target = StepId(20);

    world.request_step();
    loop {
        thread::sleep(Duration::from_millis(50));
        if world.is_stepping() {
            println!(
                "step {}:\t{:.1}% done",
                world.step_id(),
                world.percent_complete() * 100.0
            );
            continue;
        }

        let alive = world.with_view(|view| Ants::alive(view));
        println!("step {}:\tfinished with {alive} ants alive", world.step_id());

        if world.step_id() >= target {
            break;
        }
        if let StepRequest::Rejected(reason) = world.request_step() {
            println!("step request rejected: {reason}");
        }
    }
}
