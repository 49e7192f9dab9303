//! The [`GridWorld`] simulation engine.

use crate::chunk::{self, Chunk};
use crate::config::WorldConfig;
use crate::metrics::StepMetrics;
use crate::model::{CellCtx, Model, WorldView};
use crate::step::{StepHandle, StepOutcome, StepRequest};
use indexmap::IndexMap;
use petri_core::{
    Cell, LayerId, LayerInit, Mutability, Rect, RejectReason, Rgb, SetupError, StepId,
};
use petri_grid::Layer;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

const POISONED: &str = "world lock poisoned";

/// A simulation world: a set of named scalar layers over a 2D grid,
/// advanced one generation at a time by a [`Model`]'s per-cell rule.
///
/// # Step protocol
///
/// Each step increments the counter, runs the model's `pre_step` hook,
/// duplicates every dynamic layer into a write buffer, sweeps all cells
/// (chunked, optionally across a worker pool) with reads pinned to the
/// pre-step snapshot and writes accumulating into the buffers, waits
/// for every chunk, then atomically swaps the buffers in under the same
/// lock that render fetches take — a reader never observes a mix of two
/// generations.
///
/// # Handle semantics
///
/// `GridWorld` is a cheap handle over shared state: clones observe and
/// drive the same world. [`request_step`](GridWorld::request_step)
/// moves the whole step onto a background thread; only one step per
/// world is ever in flight — concurrent requests are rejected, not
/// queued.
pub struct GridWorld<M: Model> {
    inner: Arc<WorldInner<M>>,
}

impl<M: Model> Clone for GridWorld<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct WorldInner<M> {
    config: WorldConfig,
    registry: IndexMap<String, LayerId>,
    mutability: Vec<Mutability>,
    /// Committed layer set, one `Arc<Layer>` slot per `LayerId`.
    /// Static slots never change; dynamic slots are swapped at commit.
    committed: RwLock<Vec<Arc<Layer>>>,
    model: RwLock<M>,
    step_id: AtomicU64,
    stepping: AtomicBool,
    /// Cells completed in the in-flight step; progress reporting only.
    progress: AtomicU64,
    total_cells: u64,
    last_metrics: Mutex<StepMetrics>,
}

impl<M: Model> GridWorld<M> {
    /// Construct a world from a validated configuration and a model.
    ///
    /// Registers `model.layers()` in declaration order (a duplicate key
    /// is fatal), then evaluates per-cell initializers row-major from
    /// the world's seed stream. Layer registration happens here and
    /// only here; there is no way to add a layer to a stepped world.
    pub fn new(config: WorldConfig, model: M) -> Result<Self, SetupError> {
        config.validate()?;
        let defs = model.layers();
        if defs.is_empty() {
            return Err(SetupError::NoLayers);
        }

        let mut registry = IndexMap::with_capacity(defs.len());
        let mut mutability = Vec::with_capacity(defs.len());
        let mut layers = Vec::with_capacity(defs.len());
        let mut rng = chunk::init_rng(config.seed);
        for def in &defs {
            if registry.contains_key(&def.name) {
                return Err(SetupError::DuplicateLayer {
                    name: def.name.clone(),
                });
            }
            let layer = Layer::new(config.cols, config.rows, def)?;
            if matches!(def.init, LayerInit::PerCell(_)) {
                for cell in Rect::grid(config.cols, config.rows).cells() {
                    layer.set(cell, def.init.value_for(cell, &mut rng));
                }
            }
            registry.insert(def.name.clone(), LayerId(registry.len() as u32));
            mutability.push(def.mutability);
            layers.push(Arc::new(layer));
        }

        let total_cells = config.cols as u64 * config.rows as u64;
        Ok(Self {
            inner: Arc::new(WorldInner {
                config,
                registry,
                mutability,
                committed: RwLock::new(layers),
                model: RwLock::new(model),
                step_id: AtomicU64::new(0),
                stepping: AtomicBool::new(false),
                progress: AtomicU64::new(0),
                total_cells,
                last_metrics: Mutex::new(StepMetrics::default()),
            }),
        })
    }

    /// Grid size as `(cols, rows)`.
    pub fn size(&self) -> (u32, u32) {
        (self.inner.config.cols, self.inner.config.rows)
    }

    /// The world's seed.
    pub fn seed(&self) -> u64 {
        self.inner.config.seed
    }

    /// The last committed step (0 before any step; already incremented
    /// while a step is in flight).
    pub fn step_id(&self) -> StepId {
        StepId(self.inner.step_id.load(Ordering::SeqCst))
    }

    /// Whether a step is currently in flight.
    pub fn is_stepping(&self) -> bool {
        self.inner.stepping.load(Ordering::SeqCst)
    }

    /// Fraction of the in-flight step's cells completed, in `[0, 1]`.
    ///
    /// 0 when idle; monotonically non-decreasing during a step,
    /// reaching 1 just before the transition back to idle. Approximate
    /// — never used for correctness.
    pub fn percent_complete(&self) -> f64 {
        if !self.is_stepping() {
            return 0.0;
        }
        let done = self.inner.progress.load(Ordering::Relaxed);
        (done as f64 / self.inner.total_cells as f64).min(1.0)
    }

    /// Resolve a layer key registered by the model.
    pub fn layer_id(&self, name: &str) -> Option<LayerId> {
        self.inner.registry.get(name).copied()
    }

    /// Read the committed value of `layer` at `cell`.
    ///
    /// Safe at any time, including mid-step: the write buffers are not
    /// published until the commit swap.
    ///
    /// # Panics
    ///
    /// Panics if `layer` was not registered by this world's model.
    pub fn value(&self, layer: LayerId, cell: Cell) -> f32 {
        self.inner.committed.read().expect(POISONED)[layer.0 as usize].get(cell)
    }

    /// Read a committed value by layer key.
    pub fn value_by_name(&self, name: &str, cell: Cell) -> Option<f32> {
        let id = self.layer_id(name)?;
        Some(self.value(id, cell))
    }

    /// Run `f` against a read-only view of the committed generation.
    ///
    /// The commit lock is held for the duration of `f`, so everything
    /// read through the view belongs to one generation. Used by
    /// pipeline stage providers to hand state across simulations.
    pub fn with_view<R>(&self, f: impl FnOnce(&WorldView<'_>) -> R) -> R {
        let committed = self.inner.committed.read().expect(POISONED);
        f(&self.view_of(&committed))
    }

    /// Whether the model reports a terminal state.
    pub fn is_done(&self) -> bool {
        let committed = self.inner.committed.read().expect(POISONED);
        let model = self.inner.model.read().expect(POISONED);
        model.is_done(self.step_id(), &self.view_of(&committed))
    }

    /// Invoke `sink` with the model's color for every cell of `rect`
    /// (clamped to the grid), all sourced from one committed
    /// generation.
    pub fn fetch_colors(&self, rect: Rect, sink: &mut dyn FnMut(Cell, Rgb)) {
        let committed = self.inner.committed.read().expect(POISONED);
        let model = self.inner.model.read().expect(POISONED);
        let view = self.view_of(&committed);
        let (cols, rows) = self.size();
        for cell in rect.clamped(cols, rows).cells() {
            sink(cell, model.shade(cell, &view));
        }
    }

    /// Metrics of the most recently committed step.
    pub fn last_metrics(&self) -> StepMetrics {
        self.inner.last_metrics.lock().expect(POISONED).clone()
    }

    /// Inspect the model (parameters, counters).
    pub fn with_model<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&self.inner.model.read().expect(POISONED))
    }

    /// Advance one generation synchronously.
    ///
    /// Blocks the caller until the commit. Returns
    /// [`StepOutcome::Rejected`] — a no-op, counter untouched — if a
    /// step is already in flight or the simulation is done.
    pub fn step(&self) -> StepOutcome {
        match self.try_begin() {
            Err(reason) => StepOutcome::Rejected(reason),
            Ok(()) => {
                let metrics = self.inner.run_step();
                self.inner.finish_step();
                StepOutcome::Stepped(metrics)
            }
        }
    }

    /// Request one generation on a background thread.
    ///
    /// Returns immediately. The returned handle need not be awaited;
    /// the step always runs to completion (no cancellation). A request
    /// while a step is in flight is rejected, not queued.
    pub fn request_step(&self) -> StepRequest {
        if let Err(reason) = self.try_begin() {
            return StepRequest::Rejected(reason);
        }
        let inner = Arc::clone(&self.inner);
        let join = std::thread::Builder::new()
            .name("petri-step".into())
            .spawn(move || {
                let metrics = inner.run_step();
                inner.finish_step();
                metrics
            })
            .expect("spawn step thread");
        StepRequest::Started(StepHandle { join })
    }

    fn try_begin(&self) -> Result<(), RejectReason> {
        if self.is_done() {
            return Err(RejectReason::Exhausted);
        }
        self.inner
            .stepping
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|_| RejectReason::StepInFlight)
    }

    fn view_of<'a>(&'a self, committed: &'a [Arc<Layer>]) -> WorldView<'a> {
        WorldView {
            layers: committed,
            registry: &self.inner.registry,
            cols: self.inner.config.cols,
            rows: self.inner.config.rows,
        }
    }
}

impl<M: Model> WorldInner<M> {
    /// Execute one full generation. The in-flight flag is already held.
    fn run_step(&self) -> StepMetrics {
        let step_start = Instant::now();

        // 1. Advance the counter; readers polling for a new generation
        //    see it move before the commit lands (the committed layers
        //    stay on the previous generation until the swap).
        let step = StepId(self.step_id.fetch_add(1, Ordering::SeqCst) + 1);

        // 2. Fresh progress counter.
        self.progress.store(0, Ordering::Relaxed);

        // 3. Exclusive pre-step hook.
        self.model.write().expect(POISONED).pre_step(step);

        // 4. Snapshot the committed set and duplicate the dynamic
        //    layers into write buffers. The duplication — not the cell
        //    loop — is what makes per-cell writes order-independent.
        let snapshot: Vec<Arc<Layer>> = self.committed.read().expect(POISONED).clone();
        let copy_start = Instant::now();
        let buffers: Vec<Option<Layer>> = snapshot
            .iter()
            .zip(&self.mutability)
            .map(|(layer, mutability)| match mutability {
                Mutability::Dynamic => Some(layer.duplicate(false)),
                Mutability::Static => None,
            })
            .collect();
        let buffer_copy_us = elapsed_us(copy_start);

        // 5. Sweep every chunk; 6. the scope join is the barrier.
        let chunks = chunk::partition(self.config.cols, self.config.rows, self.config.chunk);
        let sweep_start = Instant::now();
        {
            let model = self.model.read().expect(POISONED);
            if self.config.parallel && chunks.len() > 1 {
                self.sweep_parallel(&model, step, &snapshot, &buffers, &chunks);
            } else {
                for (index, c) in chunks.iter().enumerate() {
                    self.sweep_chunk(&model, step, &snapshot, &buffers, index, *c);
                }
            }
        }
        let cell_update_us = elapsed_us(sweep_start);

        // 7. Commit: swap the buffers in under the render lock.
        let commit_start = Instant::now();
        {
            let mut committed = self.committed.write().expect(POISONED);
            for (slot, buffer) in committed.iter_mut().zip(buffers) {
                if let Some(buffer) = buffer {
                    *slot = Arc::new(buffer);
                }
            }
        }
        let commit_us = elapsed_us(commit_start);

        // 8. Exclusive post-step hook.
        self.model.write().expect(POISONED).post_step(step);

        let metrics = StepMetrics {
            total_us: elapsed_us(step_start),
            buffer_copy_us,
            cell_update_us,
            commit_us,
            chunks: chunks.len() as u32,
            cells: self.total_cells,
        };
        *self.last_metrics.lock().expect(POISONED) = metrics.clone();
        metrics
    }

    /// 9. Transition back to idle.
    ///
    /// The flag clears before the progress counter resets, so observers
    /// never see a mid-step counter rewind: once `is_stepping` is
    /// false, progress reads as 0.
    fn finish_step(&self) {
        self.stepping.store(false, Ordering::SeqCst);
        self.progress.store(0, Ordering::Relaxed);
    }

    fn sweep_parallel(
        &self,
        model: &M,
        step: StepId,
        snapshot: &[Arc<Layer>],
        buffers: &[Option<Layer>],
        chunks: &[Chunk],
    ) {
        let (tx, rx) = crossbeam_channel::unbounded::<(usize, Chunk)>();
        for job in chunks.iter().copied().enumerate() {
            tx.send(job).expect("chunk queue");
        }
        drop(tx);

        let workers = self.config.resolved_workers().min(chunks.len());
        std::thread::scope(|scope| {
            for _ in 0..workers {
                let rx = rx.clone();
                scope.spawn(move || {
                    while let Ok((index, c)) = rx.recv() {
                        self.sweep_chunk(model, step, snapshot, buffers, index, c);
                    }
                });
            }
        });
    }

    fn sweep_chunk(
        &self,
        model: &M,
        step: StepId,
        snapshot: &[Arc<Layer>],
        buffers: &[Option<Layer>],
        index: usize,
        c: Chunk,
    ) {
        let mut rng = chunk::chunk_rng(self.config.seed, step, index);
        let mut ctx = CellCtx {
            snapshot,
            buffers,
            step,
            rng: &mut rng,
        };
        for y in c.y0..c.y1 {
            for x in c.x0..c.x1 {
                model.update_cell(Cell::new(x, y), step, &mut ctx);
            }
            self.progress.fetch_add(c.width(), Ordering::Relaxed);
        }
    }
}

fn elapsed_us(start: Instant) -> u64 {
    start.elapsed().as_micros() as u64
}

impl<M: Model> std::fmt::Debug for GridWorld<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridWorld")
            .field("size", &self.size())
            .field("step_id", &self.step_id())
            .field("stepping", &self.is_stepping())
            .field("layers", &self.inner.registry.len())
            .finish()
    }
}
