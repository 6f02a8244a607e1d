//! # Trace Registry
//!
//! This crate implements the per-execution-context trace sources of Basalt's
//! trusted core and the process-wide registry that owns them.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: The registry is a constructed object passed
//!   to its consumers, not an ambient singleton. Tests instantiate as many
//!   independent registries as they need.
//! - **Lifetime safety first**: External subsystems never hold pointers into
//!   the registry. They hold [`SourceHandle`] values that must be re-resolved
//!   under the registry lock on every use and turn invalid the moment a
//!   source is removed.
//! - **Advisory arbitration**: Source ownership is a cooperative handshake
//!   between subsystems, not a blocking lock. A loser of the race decides its
//!   own retry policy.
//!
//! ## Key Types
//!
//! - [`Source`]: one per traceable execution context
//! - [`SourceRegistry`]: single-lock collection owning all sources
//! - [`SourceHandle`]: weak, generation-checked reference into the registry
//! - [`InfoAccessor`] / [`TraceControl`]: interfaces consumed from the
//!   execution context and the scheduler

pub mod registry;
pub mod source;
pub mod testing;

pub use registry::{SourceHandle, SourceRegistry};
pub use source::{
    Affinity, ExecutionTime, InfoAccessor, Source, SourceId, SourceInfo, TraceControl,
};
