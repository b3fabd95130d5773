// crates/schema-form-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Value Store
// Description: Durable ValueStore backend using SQLite.
// Purpose: Persist saved form values across process restarts.
// Dependencies: schema-form-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`schema_form_core::ValueStore`] for
//! autosaved form values. Stored payloads are untrusted on read; the core
//! persistence helpers re-validate their shape and size before use.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_KEY_BYTES;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use store::SqliteValueStore;
