// src/identity.rs
//! Per-run document identifiers.
//!
//! Ids start at 0 on every process start and are never persisted, so a
//! restart overwrites the documents stored under the low ids of a previous run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(u64);

impl DocumentId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owned counter for the single consuming context. `&mut self` keeps it
/// out of reach of concurrent producers.
#[derive(Debug, Default)]
pub struct IdentityAllocator {
    next: u64,
}

impl IdentityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the current id and advance the counter.
    pub fn next(&mut self) -> DocumentId {
        let id = DocumentId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u64 {
        self.next
    }
}

/// Atomic variant for fan-out setups with more than one producer.
#[derive(Debug, Default)]
pub struct SharedIdentityAllocator {
    next: AtomicU64,
}

impl SharedIdentityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> DocumentId {
        DocumentId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn owned_counter_starts_at_zero_without_gaps() {
        let mut ids = IdentityAllocator::new();
        let got: Vec<u64> = (0..5).map(|_| ids.next().get()).collect();
        assert_eq!(got, vec![0, 1, 2, 3, 4]);
        assert_eq!(ids.allocated(), 5);
    }

    #[test]
    fn shared_counter_stays_unique_across_threads() {
        let ids = Arc::new(SharedIdentityAllocator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..250).map(|_| ids.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 1000);
        assert_eq!(seen.iter().map(|id| id.get()).max(), Some(999));
    }

    #[test]
    fn display_is_the_raw_number() {
        assert_eq!(DocumentId::new(42).to_string(), "42");
    }
}
