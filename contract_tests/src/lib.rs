//! # Core Contract Tests
//!
//! This crate provides "golden" tests for the trusted core's contracts to
//! ensure they don't drift accidentally over time.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: Contracts are written as code
//! - **Testability first**: Contract tests fail when interfaces change
//! - **Mechanism not policy**: Define what must be stable, not how to use it
//!
//! ## Structure
//!
//! Each subsystem has a module with contract tests that verify:
//! - Serialized shapes of the exported data types
//! - Error message wording callers match on in diagnostics
//! - Behavioral constants (the `"core"` default label, id monotonicity)

pub mod quota_session;
pub mod trace_sources;

/// Common test helpers for contract validation
pub mod test_helpers {
    use serde::Serialize;

    /// Serializes a value and asserts the JSON field set is exactly `fields`
    pub fn verify_field_set<T: Serialize>(value: &T, fields: &[&str]) {
        let json = serde_json::to_value(value).expect("contract type serializes");
        let object = json.as_object().expect("contract type is a JSON object");

        let mut actual: Vec<&str> = object.keys().map(|k| k.as_str()).collect();
        actual.sort_unstable();
        let mut expected = fields.to_vec();
        expected.sort_unstable();

        assert_eq!(
            actual, expected,
            "serialized field set changed; update consumers before the contract"
        );
    }
}
