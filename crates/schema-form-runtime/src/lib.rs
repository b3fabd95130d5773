// crates/schema-form-runtime/src/lib.rs
// ============================================================================
// Module: Schema Form Runtime Library
// Description: Asynchronous collaborators around the schema form core.
// Purpose: Expose integrations, autosave, form state, and diagnostics.
// Dependencies: crate::{allowlist, autosave, diagnostics, integration,
//               interfaces, lookup, state}
// ============================================================================

//! ## Overview
//! The runtime hosts the parts of a mounted form that wait on time or on
//! other services: debounced API integrations with cooperative cancellation,
//! debounced autosave, and the built-in lookup service. Form values live in
//! a [`FormStateContainer`]; [`InMemoryFormState`] is the reference
//! container.
//!
//! Failures here never reach users. They are absorbed and reported through
//! a [`DiagnosticSink`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod allowlist;
pub mod autosave;
pub mod diagnostics;
pub mod integration;
pub mod interfaces;
pub mod lookup;
pub mod state;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use allowlist::EndpointAllowlist;
pub use autosave::AutoSave;
pub use autosave::AutoSaveSettings;
pub use autosave::DEFAULT_AUTOSAVE_DEBOUNCE_MS;
pub use autosave::DEFAULT_AUTOSAVE_KEY_PREFIX;
pub use autosave::clear_saved_values;
pub use autosave::load_saved_values;
pub use autosave::save_snapshot;
pub use diagnostics::AutoSaveEvent;
pub use diagnostics::DiagnosticSink;
pub use diagnostics::FileDiagnosticSink;
pub use diagnostics::IntegrationEvent;
pub use diagnostics::IntegrationPhase;
pub use diagnostics::MemoryDiagnosticSink;
pub use diagnostics::NoopDiagnosticSink;
pub use diagnostics::StderrDiagnosticSink;
pub use integration::ApiIntegrationController;
pub use integration::IntegrationRuntime;
pub use integration::IntegrationSettings;
pub use integration::build_payload;
pub use interfaces::FormStateContainer;
pub use interfaces::LookupPayload;
pub use interfaces::RemoteCall;
pub use interfaces::RemoteCallError;
pub use lookup::BUILTIN_ENDPOINTS;
pub use lookup::FETCH_ADDRESS_ENDPOINT;
pub use lookup::FETCH_COMPANY_ENDPOINT;
pub use lookup::StaticLookupService;
pub use lookup::VALIDATE_DOCUMENT_ENDPOINT;
pub use state::InMemoryFormState;
