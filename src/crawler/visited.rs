//! Process-wide registry of dispatched addresses

use crate::url::Address;
use dashmap::DashSet;

/// Set of addresses already claimed by some worker
///
/// The registry only grows during a run. Claiming is a single atomic
/// test-and-insert, so two workers can never both be told to fetch the
/// same address.
#[derive(Debug, Default)]
pub struct VisitedRegistry {
    seen: DashSet<Address>,
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `address` for the caller
    ///
    /// Returns true iff this call inserted the address, meaning the caller
    /// must proceed with the fetch. Returns false if any caller, on any
    /// worker, claimed it first.
    pub fn mark_visited(&self, address: &Address) -> bool {
        self.seen.insert(address.clone())
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.seen.contains(address)
    }

    /// Number of addresses claimed so far
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
