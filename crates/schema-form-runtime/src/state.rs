// crates/schema-form-runtime/src/state.rs
// ============================================================================
// Module: In-Memory Form State
// Description: Reference form-state container backed by a value tree.
// Purpose: Host form values for embedders and tests without a UI framework.
// Dependencies: schema-form-core, tokio
// ============================================================================

//! ## Overview
//! [`InMemoryFormState`] keeps the value tree behind a mutex and publishes a
//! version counter on a `tokio::sync::watch` channel. Writes that leave a
//! value unchanged do not bump the version.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use schema_form_core::FormValue;
use schema_form_core::FormValues;
use tokio::sync::watch;

use crate::interfaces::FormStateContainer;

// ============================================================================
// SECTION: Container
// ============================================================================

/// Mutable state guarded by the container mutex.
#[derive(Debug, Default)]
struct FormStateInner {
    /// Current value tree.
    values: FormValues,
    /// Paths registered by consumers.
    registered: BTreeSet<String>,
}

/// In-memory form-state container.
#[derive(Debug)]
pub struct InMemoryFormState {
    /// Values and registrations.
    inner: Mutex<FormStateInner>,
    /// Change version publisher.
    version: watch::Sender<u64>,
}

impl Default for InMemoryFormState {
    fn default() -> Self {
        Self::new(FormValues::new())
    }
}

impl InMemoryFormState {
    /// Creates a container seeded with `values`.
    #[must_use]
    pub fn new(values: FormValues) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: Mutex::new(FormStateInner {
                values,
                registered: BTreeSet::new(),
            }),
            version,
        }
    }

    /// Returns the registered field paths.
    #[must_use]
    pub fn registered_fields(&self) -> Vec<String> {
        self.lock().registered.iter().cloned().collect()
    }

    /// Returns the current change version.
    #[must_use]
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Replaces the whole value tree and notifies subscribers.
    pub fn reset(&self, values: FormValues) {
        let changed = {
            let mut guard = self.lock();
            let changed = guard.values != values;
            guard.values = values;
            changed
        };
        if changed {
            self.bump();
        }
    }

    /// Locks the inner state, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, FormStateInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes a new change version.
    fn bump(&self) {
        self.version.send_modify(|version| *version = version.wrapping_add(1));
    }
}

impl FormStateContainer for InMemoryFormState {
    fn register_field(&self, path: &str) {
        self.lock().registered.insert(path.to_string());
    }

    fn get_value(&self, path: &str) -> Option<FormValue> {
        self.lock().values.get_path(path).cloned()
    }

    fn set_value(&self, path: &str, value: FormValue) {
        let changed = {
            let mut guard = self.lock();
            if guard.values.get_path(path) == Some(&value) {
                false
            } else {
                guard.values.set_path(path, value);
                true
            }
        };
        if changed {
            self.bump();
        }
    }

    fn snapshot(&self) -> FormValues {
        self.lock().values.clone()
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}
