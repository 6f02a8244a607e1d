//! Test doubles for the consumed interfaces
//!
//! Deterministic stand-ins for the info accessor and trace control an
//! execution context would supply. Used by this crate's tests and by the
//! contract tests; not part of the production surface.

use crate::source::{InfoAccessor, SourceInfo, TraceControl};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Info accessor returning a configurable snapshot
///
/// The snapshot can be swapped at runtime to model a context whose live
/// fields change between queries.
pub struct FixedInfo {
    info: Mutex<SourceInfo>,
}

impl FixedInfo {
    pub fn new(info: SourceInfo) -> Self {
        Self {
            info: Mutex::new(info),
        }
    }

    /// Replaces the snapshot returned by subsequent queries
    pub fn update(&self, info: SourceInfo) {
        *self.info.lock() = info;
    }
}

impl InfoAccessor for FixedInfo {
    fn source_info(&self) -> SourceInfo {
        self.info.lock().clone()
    }
}

/// Trace control tracking its own state
///
/// Records every `trace()` request and models the enabled/error flags a
/// scheduler-side control block would expose.
pub struct ControlState {
    enabled: AtomicBool,
    error: AtomicBool,
    trace_calls: AtomicU64,
}

impl ControlState {
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            error: AtomicBool::new(false),
            trace_calls: AtomicU64::new(0),
        }
    }

    /// Number of times tracing has been requested
    pub fn trace_calls(&self) -> u64 {
        self.trace_calls.load(Ordering::Relaxed)
    }

    /// Raises the error flag, as the scheduler would on a tracing fault
    pub fn inject_error(&self) {
        self.error.store(true, Ordering::Relaxed);
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceControl for ControlState {
    fn trace(&self) {
        self.trace_calls.fetch_add(1, Ordering::Relaxed);
        self.enabled.store(true, Ordering::Relaxed);
    }

    fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    fn has_error(&self) -> bool {
        self.error.load(Ordering::Relaxed)
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}
