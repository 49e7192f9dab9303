//! A minimal atomic `f32` built on `AtomicU32` bit casts.
//!
//! Std has no float atomics; accumulation goes through a CAS loop on
//! the bit pattern. All orderings are `Relaxed`: cross-thread
//! visibility at generation boundaries is established by the chunk
//! barrier (thread join), not by these cells.

use std::sync::atomic::{AtomicU32, Ordering};

pub(crate) struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(v: f32) -> Self {
        Self(AtomicU32::new(v.to_bits()))
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, v: f32) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }

    /// Atomically add `delta`, returning the previous value.
    ///
    /// Concurrent callers targeting the same cell serialize through the
    /// CAS retry loop; no addition is ever lost.
    pub fn fetch_add(&self, delta: f32) -> f32 {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f32::from_bits(current) + delta).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return f32::from_bits(current),
                Err(actual) => current = actual,
            }
        }
    }
}

impl std::fmt::Debug for AtomicF32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.load())
    }
}
