//! Step request outcomes.
//!
//! Requesting a generation while one is in flight (or after the
//! simulation is exhausted) is not an error — it is a rejected request
//! with an observable reason, and the caller may retry. These types are
//! that observable signal.

use crate::metrics::StepMetrics;
use petri_core::RejectReason;
use std::thread::JoinHandle;

/// Outcome of a synchronous [`step()`](crate::GridWorld::step) call.
#[derive(Debug)]
pub enum StepOutcome {
    /// The generation was committed.
    Stepped(StepMetrics),
    /// Nothing happened; the step counter is unchanged.
    Rejected(RejectReason),
}

impl StepOutcome {
    /// Whether a generation was committed.
    pub fn is_stepped(&self) -> bool {
        matches!(self, Self::Stepped(_))
    }

    /// The rejection reason, if the request was rejected.
    pub fn rejection(&self) -> Option<RejectReason> {
        match self {
            Self::Stepped(_) => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }
}

/// Outcome of an asynchronous
/// [`request_step()`](crate::GridWorld::request_step) call.
#[derive(Debug)]
pub enum StepRequest {
    /// The step was handed to a background thread; the handle need not
    /// be awaited.
    Started(StepHandle),
    /// Nothing was started; the step counter is unchanged.
    Rejected(RejectReason),
}

impl StepRequest {
    /// Whether a background step was started.
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }

    /// The rejection reason, if the request was rejected.
    pub fn rejection(&self) -> Option<RejectReason> {
        match self {
            Self::Started(_) => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }

    /// Block until the background step commits, if one was started.
    ///
    /// Returns the step's metrics, or `None` if the request had been
    /// rejected.
    pub fn wait(self) -> Option<StepMetrics> {
        match self {
            Self::Started(handle) => Some(handle.wait()),
            Self::Rejected(_) => None,
        }
    }
}

/// Handle to a step running on a background thread.
///
/// Dropping the handle detaches the step; it still runs to completion
/// and commits. There is no cancellation.
#[derive(Debug)]
pub struct StepHandle {
    pub(crate) join: JoinHandle<StepMetrics>,
}

impl StepHandle {
    /// Block until the step commits and return its metrics.
    pub fn wait(self) -> StepMetrics {
        // A panic here means a model's update rule panicked; propagate.
        self.join.join().expect("step thread panicked")
    }
}
