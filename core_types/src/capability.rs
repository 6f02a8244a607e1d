//! Capability handles
//!
//! Basalt's trusted core hands out access to kernel objects exclusively
//! through capabilities.
//!
//! ## Design Principles
//!
//! 1. **Unforgeable**: Capabilities cannot be created except through
//!    authorized mechanisms
//! 2. **Transferable**: Capabilities can be explicitly passed between
//!    subsystems
//! 3. **Typed**: Each capability has a phantom type ensuring type safety
//! 4. **Testable**: The entire system works under `cargo test`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

/// A strongly-typed capability handle
///
/// `Cap<T>` represents a capability to a kernel object of kind `T`. The type
/// parameter is a marker that ensures capabilities cannot be confused.
///
/// Capabilities are unforgeable: they can only be created by trusted code
/// (the privileged core, or a component with authority to grant them).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Cap<T> {
    /// Unique identifier for this capability
    id: u64,
    /// Phantom data to enforce type safety
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

impl<T> Cap<T> {
    /// Creates a new capability
    ///
    /// # Security Note
    ///
    /// In a deployed system, only trusted core code constructs capabilities.
    /// For testing and simulation, construction is public.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Returns the capability ID
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<T> PartialEq for Cap<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Cap<T> {}

impl<T> std::hash::Hash for Cap<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Display for Cap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cap<{}>({})", std::any::type_name::<T>(), self.id)
    }
}

/// Marker type for dataspace capabilities
///
/// A dataspace is a contiguous memory region. Dataspace capabilities back
/// client allocations as well as trace buffers and trace policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dataspace;

/// Capability to a contiguous memory region
pub type DataspaceCap = Cap<Dataspace>;

/// Errors related to capability operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapabilityError {
    /// Attempted to use a capability that has been revoked
    #[error("Capability has been revoked")]
    Revoked,
    /// Attempted to grant a capability without authority
    #[error("Insufficient authority to grant capability")]
    InsufficientAuthority,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct TraceBuffer;

    #[test]
    fn test_capability_creation() {
        let cap: Cap<Dataspace> = Cap::new(1);
        assert_eq!(cap.id(), 1);
    }

    #[test]
    fn test_capability_equality() {
        let cap1: DataspaceCap = Cap::new(1);
        let cap2: DataspaceCap = Cap::new(1);
        let cap3: DataspaceCap = Cap::new(2);

        assert_eq!(cap1, cap2);
        assert_ne!(cap1, cap3);
    }

    #[test]
    fn test_capability_type_safety() {
        let ds_cap: Cap<Dataspace> = Cap::new(1);
        let buf_cap: Cap<TraceBuffer> = Cap::new(2);

        // Different marker types cannot be compared; this would not compile:
        // assert_ne!(ds_cap, buf_cap);
        assert_eq!(ds_cap.id(), 1);
        assert_eq!(buf_cap.id(), 2);
    }

    #[test]
    fn test_capability_display() {
        let cap: DataspaceCap = Cap::new(42);
        let display = format!("{}", cap);
        assert!(display.contains("Cap"));
        assert!(display.contains("42"));
    }

    #[test]
    fn test_capability_error_display() {
        assert_eq!(
            CapabilityError::Revoked.to_string(),
            "Capability has been revoked"
        );
    }
}
