// crates/schema-form-runtime/src/interfaces.rs
// ============================================================================
// Module: Runtime Interfaces
// Description: Contracts for the form-state container and remote lookups.
// Purpose: Decouple integrations and autosave from concrete hosts and services.
// Dependencies: async-trait, schema-form-core, thiserror, tokio, tokio-util
// ============================================================================

//! ## Overview
//! The runtime never owns form state or network transport. It reads and
//! writes values through a [`FormStateContainer`] and issues lookups through
//! a [`RemoteCall`] implementation that must honour the cancellation token
//! it is handed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use schema_form_core::FormValue;
use schema_form_core::FormValues;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

// ============================================================================
// SECTION: Form State
// ============================================================================

/// Host container that holds current field values.
///
/// # Invariants
/// - The receiver returned by [`FormStateContainer::subscribe`] observes a
///   new version after every value change.
pub trait FormStateContainer: Send + Sync {
    /// Registers interest in a field path.
    fn register_field(&self, path: &str);

    /// Returns the current value at `path`.
    fn get_value(&self, path: &str) -> Option<FormValue>;

    /// Returns the current values at each of `paths`, in order.
    fn watch(&self, paths: &[String]) -> Vec<Option<FormValue>> {
        paths.iter().map(|path| self.get_value(path)).collect()
    }

    /// Writes a value at `path`.
    fn set_value(&self, path: &str, value: FormValue);

    /// Returns a copy of the full value tree.
    fn snapshot(&self) -> FormValues;

    /// Subscribes to "any value changed" notifications.
    fn subscribe(&self) -> watch::Receiver<u64>;
}

// ============================================================================
// SECTION: Remote Calls
// ============================================================================

/// Payload sent to a remote lookup: field path or final segment to text.
pub type LookupPayload = BTreeMap<String, String>;

/// Errors raised by remote lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteCallError {
    /// The call observed its cancellation token.
    #[error("remote call cancelled")]
    Cancelled,
    /// The call failed.
    #[error("remote call failed: {0}")]
    Failed(String),
}

/// Remote lookup service behind an integration endpoint.
#[async_trait]
pub trait RemoteCall: Send + Sync {
    /// Performs a lookup.
    ///
    /// Implementations must stop and return [`RemoteCallError::Cancelled`]
    /// once `cancel` fires instead of resolving with a value.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteCallError`] when the call is cancelled or fails.
    async fn call(
        &self,
        endpoint: &str,
        payload: &LookupPayload,
        cancel: &CancellationToken,
    ) -> Result<Option<FormValues>, RemoteCallError>;
}
