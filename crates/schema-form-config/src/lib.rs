// crates/schema-form-config/src/lib.rs
// ============================================================================
// Module: Schema Form Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for schema-form.toml semantics.
// Dependencies: schema-form-core, schema-form-runtime, serde, toml
// ============================================================================

//! ## Overview
//! `schema-form-config` defines the configuration model for the schema form
//! engine and its runtime. Validation is strict and fails closed; accessors
//! convert the validated model into the limit and settings types the other
//! crates consume.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
