//! The simulation pipeline sequencer.
//!
//! A [`Pipeline`] chains simulations end to end: it drives the active
//! stage, detects completion (self-reported or by step limit), and
//! replaces the active simulation with the next stage's — constructed
//! from the outgoing one — while a cumulative counter keeps the global
//! timestep monotone across the hand-off.

use crate::simulation::Simulation;
use crate::step::{StepOutcome, StepRequest};
use petri_core::{Cell, Rect, RejectReason, Rgb, StepId};
use std::any::Any;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

const POISONED: &str = "pipeline lock poisoned";

/// Builds the next stage's simulation from the one that just finished.
///
/// Invoked exactly once per stage transition, between steps, with the
/// outgoing simulation still fully readable (state hand-off happens
/// here — e.g. copying a layer into the new simulation's grid).
pub type StageProvider = Box<dyn FnOnce(&dyn Simulation) -> Box<dyn Simulation> + Send>;

struct Stage {
    provider: StageProvider,
    limit: Option<u64>,
}

/// The active simulation plus the cumulative past-step counter.
///
/// Guarded by the swap lock: a reader of the global timestep can never
/// observe a fresh `past_steps` paired with an already-replaced
/// simulation, or vice versa.
struct ActiveStage {
    sim: Box<dyn Simulation>,
    past_steps: u64,
    limit: Option<u64>,
}

impl ActiveStage {
    fn limit_reached(&self) -> bool {
        self.limit.is_some_and(|n| self.sim.step_id().0 >= n)
    }
}

/// A sequence of simulations driven as one.
///
/// Cheap to clone (handle semantics, like
/// [`GridWorld`](crate::GridWorld)). Implements [`Simulation`], so
/// pipelines compose and front-ends drive them like any single
/// simulation.
pub struct Pipeline {
    shared: Arc<PipelineShared>,
}

impl Clone for Pipeline {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct PipelineShared {
    /// The swap lock (distinct from any per-simulation step lock).
    active: RwLock<ActiveStage>,
    /// Pending stages. Lock order: `active` before `queue`.
    queue: Mutex<VecDeque<Stage>>,
    /// Pipeline-level in-flight flag; a second request is rejected,
    /// not queued.
    stepping: AtomicBool,
}

impl Pipeline {
    /// A pipeline whose first stage is `first`, stepped at most `limit`
    /// times before the next stage takes over (`None` = no limit).
    pub fn new(first: Box<dyn Simulation>, limit: Option<u64>) -> Self {
        Self {
            shared: Arc::new(PipelineShared {
                active: RwLock::new(ActiveStage {
                    sim: first,
                    past_steps: 0,
                    limit,
                }),
                queue: Mutex::new(VecDeque::new()),
                stepping: AtomicBool::new(false),
            }),
        }
    }

    /// Append a stage: `provider` builds its simulation from the
    /// outgoing one; `limit` caps its steps before the next swap.
    pub fn push_stage(&self, provider: StageProvider, limit: Option<u64>) {
        self.shared
            .queue
            .lock()
            .expect(POISONED)
            .push_back(Stage { provider, limit });
    }

    /// The global timestep: committed steps of every finished stage
    /// plus the active stage's counter, read under the swap lock.
    pub fn step_id(&self) -> StepId {
        let active = self.shared.active.read().expect(POISONED);
        StepId(active.past_steps + active.sim.step_id().0)
    }

    /// Done only when the active simulation reports done and no stages
    /// remain — a pipeline with pending stages is never done.
    pub fn is_done(&self) -> bool {
        let active = self.shared.active.read().expect(POISONED);
        active.sim.is_done() && self.shared.queue.lock().expect(POISONED).is_empty()
    }

    /// Whether this pipeline (or its active simulation) has a step in
    /// flight.
    pub fn is_stepping(&self) -> bool {
        self.shared.stepping.load(Ordering::SeqCst)
            || self
                .shared
                .active
                .read()
                .expect(POISONED)
                .sim
                .is_stepping()
    }

    /// Advance the active stage one generation, then swap stages if the
    /// active one finished or hit its limit. Blocks until the commit.
    pub fn step(&self) -> StepOutcome {
        if let Err(reason) = self.try_begin() {
            return StepOutcome::Rejected(reason);
        }
        let outcome = self.drive();
        self.shared.stepping.store(false, Ordering::SeqCst);
        outcome
    }

    /// Like [`step`](Pipeline::step), on a background thread.
    ///
    /// The stage swap, if due, also happens on that thread — still
    /// strictly between steps.
    pub fn request_step(&self) -> StepRequest {
        if let Err(reason) = self.try_begin() {
            return StepRequest::Rejected(reason);
        }
        let shared = Arc::clone(&self.shared);
        let join = std::thread::Builder::new()
            .name("petri-pipeline-step".into())
            .spawn(move || {
                let pipeline = Pipeline { shared };
                let outcome = pipeline.drive();
                pipeline.shared.stepping.store(false, Ordering::SeqCst);
                match outcome {
                    StepOutcome::Stepped(metrics) => metrics,
                    StepOutcome::Rejected(_) => Default::default(),
                }
            })
            .expect("spawn pipeline step thread");
        StepRequest::Started(crate::step::StepHandle { join })
    }

    fn try_begin(&self) -> Result<(), RejectReason> {
        if self.is_done() {
            return Err(RejectReason::Exhausted);
        }
        self.shared
            .stepping
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|_| RejectReason::StepInFlight)
    }

    /// Step the active simulation synchronously, then swap if due.
    fn drive(&self) -> StepOutcome {
        let outcome = {
            let active = self.shared.active.read().expect(POISONED);
            active.sim.step()
        };
        // The swap condition is evaluated regardless of the outcome: an
        // active stage that reports done rejects its own step, but the
        // pipeline must still move on to the next stage.
        self.maybe_swap();
        outcome
    }

    /// Swap in the next stage if the active one is done or at its
    /// limit. Only ever called between steps by the single in-flight
    /// driver.
    fn maybe_swap(&self) {
        let due = {
            let active = self.shared.active.read().expect(POISONED);
            if self.shared.queue.lock().expect(POISONED).is_empty() {
                return;
            }
            active.sim.is_done() || active.limit_reached()
        };
        if !due {
            return;
        }

        let mut active = self.shared.active.write().expect(POISONED);
        let stage = match self.shared.queue.lock().expect(POISONED).pop_front() {
            Some(stage) => stage,
            None => return,
        };
        active.past_steps += active.sim.step_id().0;
        active.sim = (stage.provider)(active.sim.as_ref());
        active.limit = stage.limit;
    }
}

impl Simulation for Pipeline {
    fn size(&self) -> (u32, u32) {
        self.shared.active.read().expect(POISONED).sim.size()
    }

    fn step_id(&self) -> StepId {
        Pipeline::step_id(self)
    }

    fn is_done(&self) -> bool {
        Pipeline::is_done(self)
    }

    fn is_stepping(&self) -> bool {
        Pipeline::is_stepping(self)
    }

    fn percent_complete(&self) -> f64 {
        self.shared
            .active
            .read()
            .expect(POISONED)
            .sim
            .percent_complete()
    }

    fn step(&self) -> StepOutcome {
        Pipeline::step(self)
    }

    fn request_step(&self) -> StepRequest {
        Pipeline::request_step(self)
    }

    fn fetch_colors(&self, rect: Rect, sink: &mut dyn FnMut(Cell, Rgb)) {
        self.shared
            .active
            .read()
            .expect(POISONED)
            .sim
            .fetch_colors(rect, sink)
    }

    fn value_by_name(&self, name: &str, cell: Cell) -> Option<f32> {
        self.shared
            .active
            .read()
            .expect(POISONED)
            .sim
            .value_by_name(name, cell)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let active = self.shared.active.read().expect(POISONED);
        f.debug_struct("Pipeline")
            .field("step_id", &(active.past_steps + active.sim.step_id().0))
            .field("past_steps", &active.past_steps)
            .field("limit", &active.limit)
            .field(
                "pending",
                &self.shared.queue.lock().expect(POISONED).len(),
            )
            .finish()
    }
}
