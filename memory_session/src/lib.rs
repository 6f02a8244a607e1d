//! # Memory Session
//!
//! This crate implements Basalt's quota-accounted memory-allocation session.
//!
//! ## Philosophy
//!
//! - **Budgets are enforced, not advisory**: An allocation that would push a
//!   client past its quota fails before any state changes.
//! - **Accounting is deterministic and testable**: Every quota movement is
//!   recorded in a structured audit log that tests can query.
//! - **Mechanism, not policy**: The session arbitrates entitlement; how much
//!   quota a client deserves is decided elsewhere.
//!
//! ## Structure
//!
//! [`MemorySession`] is the single-threaded accounting engine wrapping a
//! [`PhysicalAllocator`]. [`Synced`] adds the mutual-exclusion boundary that
//! lets many concurrent service threads share one session; it is generic over
//! [`SessionInterface`] by composition, not by subclassing the engine.

pub mod audit;
pub mod session;
pub mod synced;
pub mod testing;

pub use audit::{QuotaAuditEntry, QuotaAuditLog, QuotaEvent};
pub use session::{
    MemorySession, PhysAllocError, PhysicalAllocator, SessionConfig, SessionError,
    SessionInterface,
};
pub use synced::Synced;
