//! Allocation-session contract tests
//!
//! These tests define the stable contract of the quota-accounted allocation
//! session as seen by environment and service code.
