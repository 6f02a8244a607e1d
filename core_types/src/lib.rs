//! # Core Types
//!
//! This crate defines the fundamental types shared by Basalt's trusted core.
//!
//! ## Philosophy
//!
//! Core types are designed with these principles:
//! - **Explicit over implicit**: Capabilities are typed and cannot be confused.
//! - **No ambient authority**: All access requires an explicit capability or token.
//! - **Identity over value**: Sessions and owners are compared by identity,
//!   never by the data they happen to carry.
//!
//! ## Key Types
//!
//! - [`Cap<T>`]: A strongly-typed capability handle
//! - [`DataspaceCap`]: Capability to a contiguous memory region
//! - [`SessionId`]: Identity of an allocation-session entitlement scope
//! - [`OwnerToken`]: Identity token for advisory trace-source ownership
//! - [`SessionLabel`]: Hierarchical human-readable client label
//! - [`CacheAttribute`]: Caching mode requested for backed memory

pub mod cache;
pub mod capability;
pub mod ids;
pub mod label;

pub use cache::CacheAttribute;
pub use capability::{Cap, CapabilityError, Dataspace, DataspaceCap};
pub use ids::{OwnerToken, SessionId};
pub use label::SessionLabel;
