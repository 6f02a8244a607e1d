//! Registry of trace sources
//!
//! The registry is the single place in the trusted process where trace
//! sources live. It owns the storage of every [`Source`] it contains and
//! serializes all mutation and scanning behind one non-re-entrant lock.
//!
//! External subsystems hold [`SourceHandle`] values: weak references carrying
//! a slot index and the slot's generation at insertion time. Removing a
//! source bumps the slot generation under the lock, so every outstanding
//! handle turns invalid atomically with destruction. A handle is re-resolved
//! through the registry on each use and yields `None` once stale; no dangling
//! reference can survive a removal.

use crate::source::{Source, SourceId};
use core_types::SessionLabel;
use parking_lot::Mutex;

/// Weak, non-owning reference to a source in a registry
///
/// Obtained from [`SourceRegistry::insert`] or [`SourceRegistry::export_sources`].
/// Carries no liveness guarantee: resolution checks the slot generation under
/// the registry lock and fails once the source has been removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceHandle {
    index: usize,
    generation: u64,
}

/// Arena slot holding one source
///
/// The generation advances on every removal; handles created against an
/// older generation no longer resolve.
struct Slot {
    generation: u64,
    source: Option<Source>,
}

struct Inner {
    slots: Vec<Slot>,
    free: Vec<usize>,
    /// Live slot indices in insertion order
    order: Vec<usize>,
}

impl Inner {
    fn resolve(&self, handle: SourceHandle) -> Option<&Source> {
        let slot = self.slots.get(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.source.as_ref()
    }

    fn resolve_mut(&mut self, handle: SourceHandle) -> Option<&mut Source> {
        let slot = self.slots.get_mut(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.source.as_mut()
    }
}

/// Registry of trace sources
///
/// One instance per trusted process, constructed explicitly and passed by
/// reference to every consumer. All operations are serialized by a single
/// internal lock; none of them blocks beyond that lock, and none acquires
/// any other lock while holding it.
pub struct SourceRegistry {
    inner: Mutex<Inner>,
}

impl SourceRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: Vec::new(),
                free: Vec::new(),
                order: Vec::new(),
            }),
        }
    }

    /// Inserts a source, transferring its storage to the registry
    ///
    /// Returns the weak handle under which the source is discoverable. The
    /// registering context keeps the handle for teardown.
    pub fn insert(&self, source: Source) -> SourceHandle {
        let mut inner = self.inner.lock();
        let index = match inner.free.pop() {
            Some(index) => {
                inner.slots[index].source = Some(source);
                index
            }
            None => {
                inner.slots.push(Slot {
                    generation: 0,
                    source: Some(source),
                });
                inner.slots.len() - 1
            }
        };
        inner.order.push(index);
        SourceHandle {
            index,
            generation: inner.slots[index].generation,
        }
    }

    /// Removes the source behind `handle` and returns its storage
    ///
    /// Bumps the slot generation under the lock, invalidating every
    /// outstanding handle to the source before its storage leaves the
    /// registry. Removing through a stale handle is a `None` no-op, so
    /// context teardown is idempotent.
    pub fn remove(&self, handle: SourceHandle) -> Option<Source> {
        let mut inner = self.inner.lock();
        let slot = inner.slots.get_mut(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        let source = slot.source.take()?;
        slot.generation += 1;
        inner.free.push(handle.index);
        inner.order.retain(|&index| index != handle.index);
        Some(source)
    }

    /// Updates the quota overlay of every source whose live label equals
    /// `label`
    ///
    /// An empty `label` is treated as the literal label `"core"`. Scanning an
    /// empty registry is a no-op.
    pub fn set_quota(&self, amount: u64, label: SessionLabel) {
        let label = Self::effective_label(label);
        let mut inner = self.inner.lock();
        let Inner { slots, order, .. } = &mut *inner;
        for &index in order.iter() {
            if let Some(source) = slots[index].source.as_mut() {
                if source.info().label == label {
                    source.set_quota(amount);
                }
            }
        }
    }

    /// Updates the used overlay of every source whose live label equals
    /// `label`
    ///
    /// Same label substitution and empty-registry behavior as
    /// [`set_quota`](SourceRegistry::set_quota).
    pub fn set_used(&self, amount: u64, label: SessionLabel) {
        let label = Self::effective_label(label);
        let mut inner = self.inner.lock();
        let Inner { slots, order, .. } = &mut *inner;
        for &index in order.iter() {
            if let Some(source) = slots[index].source.as_mut() {
                if source.info().label == label {
                    source.set_used(amount);
                }
            }
        }
    }

    /// Exports sources not yet known to the caller
    ///
    /// Iterates all registered sources in insertion order; for each id for
    /// which `is_known` returns false, calls `emit` with the id, a weak
    /// handle, and the source's current label and name. This lets a consumer
    /// maintain an incremental directory without the registry copying its
    /// membership on every call.
    ///
    /// Both callbacks run while the registry lock is held and must not call
    /// back into this registry.
    pub fn export_sources<T, E>(&self, mut is_known: T, mut emit: E)
    where
        T: FnMut(SourceId) -> bool,
        E: FnMut(SourceId, SourceHandle, SessionLabel, String),
    {
        let inner = self.inner.lock();
        for &index in inner.order.iter() {
            let slot = &inner.slots[index];
            if let Some(source) = slot.source.as_ref() {
                let id = source.unique_id();
                if !is_known(id) {
                    let info = source.info();
                    let handle = SourceHandle {
                        index,
                        generation: slot.generation,
                    };
                    emit(id, handle, info.label, info.name);
                }
            }
        }
    }

    /// Resolves a weak handle and reads the source under the lock
    ///
    /// Returns `None` if the source has been removed since the handle was
    /// produced. The closure must not call back into this registry.
    pub fn with_source<R>(&self, handle: SourceHandle, f: impl FnOnce(&Source) -> R) -> Option<R> {
        let inner = self.inner.lock();
        inner.resolve(handle).map(f)
    }

    /// Resolves a weak handle and mutates the source under the lock
    ///
    /// Used by external subsystems for ownership arbitration and trace
    /// control. Returns `None` if the handle is stale. The closure must not
    /// call back into this registry.
    pub fn with_source_mut<R>(
        &self,
        handle: SourceHandle,
        f: impl FnOnce(&mut Source) -> R,
    ) -> Option<R> {
        let mut inner = self.inner.lock();
        inner.resolve_mut(handle).map(f)
    }

    /// Returns the number of registered sources
    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    /// Checks whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().order.is_empty()
    }

    fn effective_label(label: SessionLabel) -> SessionLabel {
        if label.is_empty() {
            SessionLabel::core()
        } else {
            label
        }
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
