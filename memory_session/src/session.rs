//! Quota-accounted allocation engine
//!
//! [`MemorySession`] tracks one client entitlement scope: a quota limit, the
//! bytes currently used against it, and the dataspaces backing that usage.
//! The engine itself is not thread-safe; concurrent use goes through
//! [`Synced`](crate::Synced).
//!
//! Quota checks happen before anything else: a request that would exceed the
//! limit fails without consulting the wrapped allocator and without mutating
//! any counter. A request within quota can still fail in the allocator
//! (physical fragmentation); the two failures are distinct error kinds.

use crate::audit::{QuotaAuditLog, QuotaEvent};
use core_types::{CacheAttribute, DataspaceCap, SessionId, SessionLabel};
use std::collections::HashMap;
use thiserror::Error;

/// Failure of the wrapped platform allocator
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PhysAllocError {
    /// The allocator could not back the request, e.g. due to fragmentation
    #[error("physical allocator failed to back {requested} bytes")]
    BackingFailed { requested: u64 },
}

/// Errors reported by an allocation session
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The request would push usage past the quota; nothing was mutated
    #[error("quota exceeded: requested {requested} bytes with quota {quota} and used {used}")]
    QuotaExceeded {
        requested: u64,
        quota: u64,
        used: u64,
    },

    /// The request fit the quota but the platform allocator failed
    #[error("allocation failed within quota: {0}")]
    AllocationFailed(#[from] PhysAllocError),

    /// A quota transfer asked for more than the unused headroom
    #[error("insufficient quota headroom: requested {requested} bytes, {available} available")]
    InsufficientHeadroom { requested: u64, available: u64 },

    /// The session already has a reference account
    #[error("session is already linked to reference account {0}")]
    AlreadyLinked(SessionId),

    /// The reference-account link would make the donation chain cyclic
    #[error("reference-account link would be cyclic with session {0}")]
    CyclicLink(SessionId),

    /// The capability does not name a dataspace of this session
    #[error("unknown dataspace capability {0}")]
    UnknownDataspace(DataspaceCap),
}

/// Platform-specific physical-memory allocator
///
/// External collaborator: backs dataspaces with physical memory and releases
/// them. The session performs all quota accounting; the allocator only needs
/// to hand out capabilities and may fail even when the session has headroom.
pub trait PhysicalAllocator: Send {
    fn alloc(&mut self, size: u64, cache: CacheAttribute) -> Result<DataspaceCap, PhysAllocError>;
    fn free(&mut self, ds: DataspaceCap);
}

/// Configuration of a session at creation time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Quota limit in bytes
    pub quota: u64,
    /// Descriptive label used for accounting and reporting
    pub label: SessionLabel,
}

impl SessionConfig {
    pub fn new(quota: u64) -> Self {
        Self {
            quota,
            label: SessionLabel::empty(),
        }
    }

    /// Builder: sets the label
    pub fn with_label(mut self, label: SessionLabel) -> Self {
        self.label = label;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Operation set of an allocation session
///
/// The synchronization wrapper is parameterized over this trait, so the same
/// lock-guarded surface works for any engine implementation.
pub trait SessionInterface {
    /// Identity of the entitlement scope
    fn session_id(&self) -> SessionId;

    /// Allocates a freshly backed dataspace, accounting `size` bytes
    fn alloc(&mut self, size: u64, cache: CacheAttribute) -> Result<DataspaceCap, SessionError>;

    /// Releases a dataspace of this session, returning its bytes to the
    /// headroom
    fn free(&mut self, ds: DataspaceCap) -> Result<(), SessionError>;

    /// Removes `amount` bytes of unused headroom, the donating half of a
    /// quota transfer
    fn withdraw(&mut self, amount: u64) -> Result<(), SessionError>;

    /// Adds `amount` bytes of quota, the receiving half of a transfer
    fn deposit(&mut self, amount: u64);

    /// Returns the linked reference account, if any
    fn ref_account(&self) -> Option<SessionId>;

    /// Links the reference account used for quota donation
    fn set_ref_account(&mut self, peer: SessionId) -> Result<(), SessionError>;

    /// Current quota limit in bytes
    fn quota(&self) -> u64;

    /// Bytes currently used against the quota
    fn used(&self) -> u64;

    /// Current label
    fn label(&self) -> SessionLabel;

    /// Updates the descriptive label
    fn set_label(&mut self, label: SessionLabel);
}

/// Quota-accounted allocation session
///
/// One instance per client entitlement scope, created when the scope is
/// granted and destroyed when it is revoked. Not thread-safe on its own.
///
/// Invariant: `used <= quota` after every completed operation.
pub struct MemorySession<A: PhysicalAllocator> {
    id: SessionId,
    label: SessionLabel,
    quota: u64,
    used: u64,
    ref_account: Option<SessionId>,
    /// Live dataspaces of this session: capability id to accounted size
    dataspaces: HashMap<u64, u64>,
    phys: A,
    audit: QuotaAuditLog,
}

impl<A: PhysicalAllocator> MemorySession<A> {
    /// Creates a session over the given allocator
    pub fn new(phys: A, config: SessionConfig) -> Self {
        Self {
            id: SessionId::new(),
            label: config.label,
            quota: config.quota,
            used: 0,
            ref_account: None,
            dataspaces: HashMap::new(),
            phys,
            audit: QuotaAuditLog::new(),
        }
    }

    /// Returns the audit log of this session
    pub fn audit(&self) -> &QuotaAuditLog {
        &self.audit
    }

    /// Number of live dataspaces
    pub fn dataspace_count(&self) -> usize {
        self.dataspaces.len()
    }
}

impl<A: PhysicalAllocator> SessionInterface for MemorySession<A> {
    fn session_id(&self) -> SessionId {
        self.id
    }

    fn alloc(&mut self, size: u64, cache: CacheAttribute) -> Result<DataspaceCap, SessionError> {
        let fits = self
            .used
            .checked_add(size)
            .map(|needed| needed <= self.quota)
            .unwrap_or(false);
        if !fits {
            self.audit.record(QuotaEvent::QuotaExceeded {
                session: self.id,
                requested: size,
                quota: self.quota,
                used: self.used,
            });
            return Err(SessionError::QuotaExceeded {
                requested: size,
                quota: self.quota,
                used: self.used,
            });
        }

        let ds = self.phys.alloc(size, cache)?;

        let used_before = self.used;
        self.used += size;
        self.dataspaces.insert(ds.id(), size);
        self.audit.record(QuotaEvent::Allocated {
            session: self.id,
            size,
            used_before,
            used_after: self.used,
        });
        Ok(ds)
    }

    fn free(&mut self, ds: DataspaceCap) -> Result<(), SessionError> {
        let size = self
            .dataspaces
            .remove(&ds.id())
            .ok_or(SessionError::UnknownDataspace(ds))?;
        self.phys.free(ds);

        let used_before = self.used;
        self.used = self.used.saturating_sub(size);
        self.audit.record(QuotaEvent::Freed {
            session: self.id,
            size,
            used_before,
            used_after: self.used,
        });
        Ok(())
    }

    fn withdraw(&mut self, amount: u64) -> Result<(), SessionError> {
        let available = self.quota - self.used;
        if amount > available {
            return Err(SessionError::InsufficientHeadroom {
                requested: amount,
                available,
            });
        }
        self.quota -= amount;
        self.audit.record(QuotaEvent::QuotaWithdrawn {
            session: self.id,
            amount,
            quota_after: self.quota,
        });
        Ok(())
    }

    fn deposit(&mut self, amount: u64) {
        self.quota = self.quota.saturating_add(amount);
        self.audit.record(QuotaEvent::QuotaDeposited {
            session: self.id,
            amount,
            quota_after: self.quota,
        });
    }

    fn ref_account(&self) -> Option<SessionId> {
        self.ref_account
    }

    fn set_ref_account(&mut self, peer: SessionId) -> Result<(), SessionError> {
        if let Some(existing) = self.ref_account {
            return Err(SessionError::AlreadyLinked(existing));
        }
        if peer == self.id {
            return Err(SessionError::CyclicLink(peer));
        }
        self.ref_account = Some(peer);
        self.audit.record(QuotaEvent::RefAccountLinked {
            session: self.id,
            peer,
        });
        Ok(())
    }

    fn quota(&self) -> u64 {
        self.quota
    }

    fn used(&self) -> u64 {
        self.used
    }

    fn label(&self) -> SessionLabel {
        self.label.clone()
    }

    fn set_label(&mut self, label: SessionLabel) {
        self.label = label;
    }
}
