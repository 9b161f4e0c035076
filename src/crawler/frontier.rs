//! Seed queue shared by the worker pool

use crate::url::Address;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Ordered queue of seed addresses awaiting a worker
///
/// Each entry is handed to exactly one worker. Links discovered during a
/// traversal never come back here; the worker that owns the seed follows
/// them itself.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: Mutex<VecDeque<Address>>,
}

impl Frontier {
    pub fn new<I>(seeds: I) -> Self
    where
        I: IntoIterator<Item = Address>,
    {
        Self {
            queue: Mutex::new(seeds.into_iter().collect()),
        }
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Address>> {
        // A panicking worker cannot leave a half-popped VecDeque behind
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes the next seed, or `None` once the frontier is drained
    pub fn pop(&self) -> Option<Address> {
        self.queue().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }
}
