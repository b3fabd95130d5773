// crates/schema-form-core/src/persistence.rs
// ============================================================================
// Module: Persisted Values
// Description: Key/value store interface and guarded value persistence.
// Purpose: Save and restore in-progress form values without trusting storage.
// Dependencies: serde_json, thiserror, crate::values
// ============================================================================

//! ## Overview
//! In-progress values are stored as JSON text under a caller-chosen key in a
//! [`ValueStore`]. Writes are shape-checked and size-capped before the store
//! is touched. Reads treat missing, oversized, unparsable, or mis-shaped
//! payloads as absent rather than as errors.
//!
//! Security posture: stored payloads are untrusted on read; see
//! [`validate_form_values`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use serde_json::Value;
use thiserror::Error;

use crate::values::FormValues;
use crate::values::validate_form_values;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum serialized size of persisted values in bytes.
pub const MAX_SAVED_VALUES_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Store Interface
// ============================================================================

/// Errors raised by value store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend I/O failure.
    #[error("value store io error: {0}")]
    Io(String),
    /// Backend rejected the write, for example because a quota was reached.
    #[error("value store rejected write: {0}")]
    Rejected(String),
    /// Generic backend failure.
    #[error("value store error: {0}")]
    Store(String),
}

/// String key/value storage for persisted values.
pub trait ValueStore: Send + Sync {
    /// Returns the payload stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `payload` under `key`, replacing any previous payload.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot be written.
    fn set(&self, key: &str, payload: &str) -> Result<(), StoreError>;

    /// Removes the payload stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<T: ValueStore + ?Sized> ValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.as_ref().get(key)
    }

    fn set(&self, key: &str, payload: &str) -> Result<(), StoreError> {
        self.as_ref().set(key, payload)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.as_ref().remove(key)
    }
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory value store for tests and embedders without durable storage.
#[derive(Debug, Default, Clone)]
pub struct InMemoryValueStore {
    /// Payload map protected by a mutex.
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl InMemoryValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }
}

impl ValueStore for InMemoryValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| StoreError::Store("value store mutex poisoned".to_string()))?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, payload: &str) -> Result<(), StoreError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| StoreError::Store("value store mutex poisoned".to_string()))?;
        guard.insert(key.to_string(), payload.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| StoreError::Store("value store mutex poisoned".to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

// ============================================================================
// SECTION: Persistence
// ============================================================================

/// Errors raised while persisting values.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Values do not have the form value shape.
    #[error("values are not a valid form value tree")]
    InvalidShape,
    /// Serialized values exceed the size cap.
    #[error("serialized values exceed size limit: {actual_bytes} > {max_bytes}")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual serialized bytes.
        actual_bytes: usize,
    },
    /// Values failed to serialize.
    #[error("values failed to serialize: {0}")]
    Serialize(String),
    /// The store rejected the write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validates, size-caps, and stores values under `key`.
///
/// # Errors
///
/// Returns [`PersistError`] when the values are mis-shaped, too large, or the
/// store fails. The store is not touched unless both checks pass.
pub fn persist_values<S>(
    store: &S,
    key: &str,
    values: &Value,
    max_bytes: usize,
) -> Result<(), PersistError>
where
    S: ValueStore + ?Sized,
{
    if !validate_form_values(values) {
        return Err(PersistError::InvalidShape);
    }
    let payload =
        serde_json::to_string(values).map_err(|err| PersistError::Serialize(err.to_string()))?;
    if payload.len() > max_bytes {
        return Err(PersistError::TooLarge {
            max_bytes,
            actual_bytes: payload.len(),
        });
    }
    store.set(key, &payload)?;
    Ok(())
}

/// Loads values stored under `key`.
///
/// Missing, unreadable, oversized, unparsable, or mis-shaped payloads all
/// yield `None`.
#[must_use]
pub fn load_values<S>(store: &S, key: &str, max_bytes: usize) -> Option<FormValues>
where
    S: ValueStore + ?Sized,
{
    let payload = store.get(key).ok().flatten()?;
    if payload.len() > max_bytes {
        return None;
    }
    let value: Value = serde_json::from_str(&payload).ok()?;
    if !validate_form_values(&value) {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Removes values stored under `key`.
///
/// # Errors
///
/// Returns [`StoreError`] when the store cannot be written.
pub fn clear_values<S>(store: &S, key: &str) -> Result<(), StoreError>
where
    S: ValueStore + ?Sized,
{
    store.remove(key)
}
