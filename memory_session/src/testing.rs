//! Test double for the platform allocator
//!
//! A deterministic in-process stand-in for the physical-memory allocator the
//! trusted core wraps. Used by this crate's tests and by the contract tests;
//! not part of the production surface.

use crate::session::{PhysAllocError, PhysicalAllocator};
use core_types::{CacheAttribute, DataspaceCap};
use std::collections::HashMap;

/// Simulated physical allocator with a fixed backing capacity
///
/// Hands out capabilities with increasing ids and fails once the configured
/// capacity is exhausted, which lets tests trigger the within-quota
/// allocation-failure path on demand.
pub struct SimPhysAllocator {
    capacity: u64,
    allocated: u64,
    next_cap: u64,
    live: HashMap<u64, u64>,
}

impl SimPhysAllocator {
    /// Creates an allocator backed by `capacity` bytes
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            capacity,
            allocated: 0,
            next_cap: 1,
            live: HashMap::new(),
        }
    }

    /// Bytes currently backed
    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    /// Number of live dataspaces
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

impl PhysicalAllocator for SimPhysAllocator {
    fn alloc(&mut self, size: u64, _cache: CacheAttribute) -> Result<DataspaceCap, PhysAllocError> {
        let fits = self
            .allocated
            .checked_add(size)
            .map(|needed| needed <= self.capacity)
            .unwrap_or(false);
        if !fits {
            return Err(PhysAllocError::BackingFailed { requested: size });
        }
        let cap = DataspaceCap::new(self.next_cap);
        self.next_cap += 1;
        self.allocated += size;
        self.live.insert(cap.id(), size);
        Ok(cap)
    }

    fn free(&mut self, ds: DataspaceCap) {
        if let Some(size) = self.live.remove(&ds.id()) {
            self.allocated -= size;
        }
    }
}
