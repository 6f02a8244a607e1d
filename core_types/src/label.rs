//! Session labels
//!
//! A label is the hierarchical, human-readable path a client carries through
//! the system, e.g. `"core"` or `"init -> app1"`. Labels identify clients in
//! accounting and reporting; they are descriptive, not authority-bearing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between path elements of a hierarchical label
pub const LABEL_SEPARATOR: &str = " -> ";

/// Label of the privileged core itself
pub const CORE_LABEL: &str = "core";

/// Hierarchical human-readable client label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionLabel(String);

impl SessionLabel {
    /// Creates a label from a string
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Returns the label of the privileged core
    pub fn core() -> Self {
        Self(CORE_LABEL.to_string())
    }

    /// Returns an empty label
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Returns the label as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks whether the label is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the last path element of the label
    pub fn last_element(&self) -> &str {
        self.0
            .rsplit(LABEL_SEPARATOR)
            .next()
            .unwrap_or(self.0.as_str())
    }

    /// Extends the label with a child element
    pub fn child(&self, element: &str) -> Self {
        if self.0.is_empty() {
            Self(element.to_string())
        } else {
            Self(format!("{}{}{}", self.0, LABEL_SEPARATOR, element))
        }
    }
}

impl Default for SessionLabel {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for SessionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionLabel {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}
