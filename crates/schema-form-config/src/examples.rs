// crates/schema-form-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `schema-form.toml`. The example is kept valid: it loads
//! through [`crate::SchemaFormConfig::load`] unchanged.

/// Returns a canonical example `schema-form.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[limits]
max_schema_bytes = 5242880
max_group_depth = 10
max_saved_values_bytes = 1048576

[integrations]
default_debounce_ms = 500
allowed_endpoints = ["fetchAddressFromPostalCode", "fetchCompanyDetails", "validateDocument"]

[autosave]
enabled = true
debounce_ms = 300
key_prefix = "schema-form-autosave-"

[diagnostics]
sink = "file"
path = "schema-form-diagnostics.jsonl"

[value_store]
type = "sqlite"
path = "schema-form-values.db"
journal_mode = "wal"
sync_mode = "full"
busy_timeout_ms = 5000
"#,
    )
}
