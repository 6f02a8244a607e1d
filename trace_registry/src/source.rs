//! Trace sources
//!
//! A [`Source`] is the per-execution-context record that external subsystems
//! observe and control instruction tracing through. There is one instance per
//! kernel-visible thread. The source itself caches nothing about the context:
//! live fields come from an [`InfoAccessor`] on every query, control actions
//! go straight to a [`TraceControl`].
//!
//! Two independent subsystems compete for sources: the tracing service and
//! the processor-management service. Exclusivity between them is advisory;
//! [`Source::try_acquire`] either records the candidate as owner or reports
//! the conflict, and never blocks.

use core_types::{DataspaceCap, OwnerToken, SessionLabel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counter backing [`SourceId`] allocation. Ids are never reused.
static NEXT_UNIQUE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique identifier of a trace source
///
/// Assigned once at construction from a monotonically increasing counter;
/// concurrent construction of sources yields pairwise-distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceId(u64);

impl SourceId {
    fn allocate() -> Self {
        Self(NEXT_UNIQUE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the numeric value of the id
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source:{}", self.0)
    }
}

/// Accumulated execution time of a context
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ExecutionTime(pub u64);

impl ExecutionTime {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn saturating_add(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for ExecutionTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} us", self.0)
    }
}

/// Placement of a context on the processor topology
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Affinity {
    /// Index of the core the context is placed on
    pub core: u32,
}

impl Affinity {
    pub fn new(core: u32) -> Self {
        Self { core }
    }
}

impl fmt::Display for Affinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "core {}", self.core)
    }
}

/// Snapshot of a trace source
///
/// Combines the live fields supplied by the context's [`InfoAccessor`] with
/// the accounting overlay maintained by the registry. The overlay fields
/// (`quota`, `used`) in an accessor-produced value are placeholders; the
/// source overwrites them with its committed values on every
/// [`Source::info`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Hierarchical label of the client the context belongs to
    pub label: SessionLabel,
    /// Name of the execution context
    pub name: String,
    /// Accumulated execution time
    pub execution_time: ExecutionTime,
    /// Current placement
    pub affinity: Affinity,
    /// Scheduling priority
    pub priority: u32,
    /// Per-core online flags
    pub cores_online: Vec<bool>,
    /// Number of cores the flags cover
    pub core_count: u32,
    /// Accounting overlay: memory quota in bytes
    pub quota: u64,
    /// Accounting overlay: memory used in bytes
    pub used: u64,
}

impl SourceInfo {
    /// Creates a snapshot with all live fields at their defaults
    pub fn new(label: SessionLabel, name: impl Into<String>) -> Self {
        Self {
            label,
            name: name.into(),
            execution_time: ExecutionTime::zero(),
            affinity: Affinity::default(),
            priority: 0,
            cores_online: Vec::new(),
            core_count: 0,
            quota: 0,
            used: 0,
        }
    }

    /// Builder: sets the accumulated execution time
    pub fn with_execution_time(mut self, time: ExecutionTime) -> Self {
        self.execution_time = time;
        self
    }

    /// Builder: sets the placement
    pub fn with_affinity(mut self, affinity: Affinity) -> Self {
        self.affinity = affinity;
        self
    }

    /// Builder: sets the scheduling priority
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Builder: sets the per-core online flags and the core count
    pub fn with_core_topology(mut self, cores_online: Vec<bool>) -> Self {
        self.core_count = cores_online.len() as u32;
        self.cores_online = cores_online;
        self
    }
}

/// Interface for querying live trace-source information
///
/// Supplied by the execution context owning the source. Implementations
/// return current values on every call; the source does not cache them.
pub trait InfoAccessor: Send + Sync {
    fn source_info(&self) -> SourceInfo;
}

/// Interface for controlling instruction tracing of a context
///
/// Supplied by the scheduler/tracing subsystem.
pub trait TraceControl: Send + Sync {
    fn trace(&self);
    fn enable(&self);
    fn disable(&self);
    fn has_error(&self) -> bool;
    fn is_enabled(&self) -> bool;
}

/// Source of tracing data
///
/// There is one instance per traceable execution context. Storage is owned
/// exclusively by the [`SourceRegistry`](crate::SourceRegistry); all access
/// from external subsystems goes through weak handles resolved under the
/// registry lock.
pub struct Source {
    unique_id: SourceId,
    info: Arc<dyn InfoAccessor>,
    control: Arc<dyn TraceControl>,
    policy: Option<DataspaceCap>,
    buffer: Option<DataspaceCap>,
    owner: Option<OwnerToken>,
    quota: u64,
    used: u64,
}

impl Source {
    /// Creates a source for a newly constructed execution context
    pub fn new(info: Arc<dyn InfoAccessor>, control: Arc<dyn TraceControl>) -> Self {
        Self {
            unique_id: SourceId::allocate(),
            info,
            control,
            policy: None,
            buffer: None,
            owner: None,
            quota: 0,
            used: 0,
        }
    }

    /// Overwrites the quota value of the accounting overlay
    ///
    /// The registry is the sole caller and is trusted to keep the overlay
    /// consistent with actual allocator state; no bounds are checked here.
    pub fn set_quota(&mut self, quota: u64) {
        self.quota = quota;
    }

    /// Overwrites the used value of the accounting overlay
    pub fn set_used(&mut self, used: u64) {
        self.used = used;
    }

    /// Returns a snapshot of the source
    ///
    /// Live fields are fetched from the accessor, then the committed
    /// accounting overlay is merged in. Read-only.
    pub fn info(&self) -> SourceInfo {
        let mut info = self.info.source_info();
        info.quota = self.quota;
        info.used = self.used;
        info
    }

    /// Hands the policy and buffer dataspaces to the source and requests
    /// that tracing starts
    ///
    /// The two capabilities are recorded together; afterwards [`enabled`]
    /// and [`error`] reflect the control interface's state.
    ///
    /// [`enabled`]: Source::enabled
    /// [`error`]: Source::error
    pub fn trace(&mut self, policy: DataspaceCap, buffer: DataspaceCap) {
        self.policy = Some(policy);
        self.buffer = Some(buffer);
        self.control.trace();
    }

    pub fn enable(&self) {
        self.control.enable();
    }

    pub fn disable(&self) {
        self.control.disable();
    }

    /// Attempts to acquire advisory ownership for `candidate`
    ///
    /// Succeeds if the source is unowned or already owned by `candidate`.
    /// On failure the owner is left unchanged; the caller decides its own
    /// retry policy.
    pub fn try_acquire(&mut self, candidate: OwnerToken) -> bool {
        match self.owner {
            Some(owner) if owner != candidate => false,
            _ => {
                self.owner = Some(candidate);
                true
            }
        }
    }

    /// Checks whether `owner` currently holds the source
    pub fn is_owned_by(&self, owner: OwnerToken) -> bool {
        self.owner == Some(owner)
    }

    /// Releases ownership held by `owner`
    ///
    /// A release by a token that is not the current owner is a no-op.
    pub fn release_ownership(&mut self, owner: OwnerToken) {
        if self.is_owned_by(owner) {
            self.owner = None;
        }
    }

    pub fn unique_id(&self) -> SourceId {
        self.unique_id
    }

    pub fn buffer(&self) -> Option<DataspaceCap> {
        self.buffer
    }

    pub fn policy(&self) -> Option<DataspaceCap> {
        self.policy
    }

    pub fn error(&self) -> bool {
        self.control.has_error()
    }

    pub fn enabled(&self) -> bool {
        self.control.is_enabled()
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("unique_id", &self.unique_id)
            .field("owner", &self.owner)
            .field("quota", &self.quota)
            .field("used", &self.used)
            .field("buffer", &self.buffer)
            .field("policy", &self.policy)
            .finish()
    }
}
