//! Trace-source contract tests
//!
//! These tests define the stable contract of the trace-source registry as
//! seen by the tracing and processor-management subsystems.
