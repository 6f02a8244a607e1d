//! Cache attributes for backed memory
//!
//! Clients request a caching mode when allocating memory. The attribute is a
//! logical request; the platform allocator maps it to page-table
//! configuration on real hardware.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caching mode of a memory region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheAttribute {
    /// Normal write-back cached memory
    Cached,
    /// Write-combined memory (framebuffers and similar)
    WriteCombined,
    /// Uncached memory (device buffers, trace buffers shared across cores)
    Uncached,
}

impl fmt::Display for CacheAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheAttribute::Cached => write!(f, "Cached"),
            CacheAttribute::WriteCombined => write!(f, "WriteCombined"),
            CacheAttribute::Uncached => write!(f, "Uncached"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_attribute_display() {
        assert_eq!(CacheAttribute::Cached.to_string(), "Cached");
        assert_eq!(CacheAttribute::WriteCombined.to_string(), "WriteCombined");
        assert_eq!(CacheAttribute::Uncached.to_string(), "Uncached");
    }
}
