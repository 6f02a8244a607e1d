//! Lock-guarded session wrapper
//!
//! The accounting engine is not thread-safe, but one session is shared by
//! every service thread of the trusted process. [`Synced`] draws the
//! mutual-exclusion boundary: one lock, all operations inside it, the same
//! operation set outside it. Callers never lock anything themselves.
//!
//! Operations that involve two sessions (`transfer_quota`, `ref_account`)
//! acquire the two locks strictly one after the other, never nested. The
//! donating half decides success or failure entirely under the first lock,
//! so a failed transfer leaves both sessions untouched, and no lock ordering
//! exists that could deadlock.

use crate::session::{SessionError, SessionInterface};
use core_types::{CacheAttribute, DataspaceCap, SessionId, SessionLabel};
use parking_lot::Mutex;

/// Lock-guarded wrapper around an allocation session
///
/// Generic over the wrapped session type by composition: `Synced<S>` holds
/// the lock and the engine value and re-exposes the engine's operation set.
pub struct Synced<S> {
    inner: Mutex<S>,
}

impl<S: SessionInterface> Synced<S> {
    /// Wraps a session in its mutual-exclusion boundary
    pub fn new(session: S) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    /// Runs a closure against the wrapped session under the lock
    ///
    /// Escape hatch for composition and test code. The closure must not
    /// call back into this wrapper.
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Identity of the wrapped entitlement scope
    pub fn session_id(&self) -> SessionId {
        self.inner.lock().session_id()
    }

    /// Allocates a freshly backed dataspace
    pub fn alloc(&self, size: u64, cache: CacheAttribute) -> Result<DataspaceCap, SessionError> {
        self.inner.lock().alloc(size, cache)
    }

    /// Releases a dataspace of this session
    ///
    /// Guarded like every other mutating operation; `free` moves the `used`
    /// counter and takes the same lock.
    pub fn free(&self, ds: DataspaceCap) -> Result<(), SessionError> {
        self.inner.lock().free(ds)
    }

    /// Links `peer` as the reference account for quota donation
    ///
    /// Fails with [`SessionError::CyclicLink`] if `peer` is this session or
    /// already donates back to it, and with [`SessionError::AlreadyLinked`]
    /// if a reference account exists. No state changes on failure.
    pub fn ref_account(&self, peer: &Synced<S>) -> Result<(), SessionError> {
        let self_id = self.session_id();
        let (peer_id, peer_link) = peer.with(|p| (p.session_id(), p.ref_account()));
        if peer_id == self_id || peer_link == Some(self_id) {
            return Err(SessionError::CyclicLink(peer_id));
        }
        self.inner.lock().set_ref_account(peer_id)
    }

    /// Moves `amount` bytes of unused headroom to `target`
    ///
    /// Fails with [`SessionError::InsufficientHeadroom`] before any counter
    /// moves; on success the withdrawal and the deposit each commit under
    /// their own session's lock.
    pub fn transfer_quota(&self, target: &Synced<S>, amount: u64) -> Result<(), SessionError> {
        self.inner.lock().withdraw(amount)?;
        target.inner.lock().deposit(amount);
        Ok(())
    }

    /// Current quota limit in bytes
    pub fn quota(&self) -> u64 {
        self.inner.lock().quota()
    }

    /// Bytes currently used against the quota
    pub fn used(&self) -> u64 {
        self.inner.lock().used()
    }

    /// Current label
    pub fn label(&self) -> SessionLabel {
        self.inner.lock().label()
    }

    /// Updates the descriptive label
    pub fn set_label(&self, label: SessionLabel) {
        self.inner.lock().set_label(label)
    }
}
