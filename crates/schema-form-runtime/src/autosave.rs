// crates/schema-form-runtime/src/autosave.rs
// ============================================================================
// Module: AutoSave
// Description: Debounced persistence of the current form values.
// Purpose: Keep in-progress submissions across reloads without blocking input.
// Dependencies: schema-form-core, tokio, tokio-util
// ============================================================================

//! ## Overview
//! [`AutoSave`] subscribes to the form-state container and, once changes stop
//! arriving for the debounce delay, persists the whole value tree under
//! `key_prefix + schema_id`. Store failures and rejected payloads degrade to
//! "nothing saved this cycle" and are reported only as diagnostics.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use schema_form_core::FormValues;
use schema_form_core::MAX_SAVED_VALUES_BYTES;
use schema_form_core::PersistError;
use schema_form_core::StoreError;
use schema_form_core::ValueStore;
use schema_form_core::clear_values;
use schema_form_core::load_values;
use schema_form_core::persist_values;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::diagnostics::AutoSaveEvent;
use crate::diagnostics::DiagnosticSink;
use crate::integration::sleep_until_deadline;
use crate::interfaces::FormStateContainer;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Default autosave debounce in milliseconds.
pub const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 300;

/// Default storage key prefix.
pub const DEFAULT_AUTOSAVE_KEY_PREFIX: &str = "schema-form-autosave-";

/// Autosave settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoSaveSettings {
    /// Whether autosave runs at all.
    pub enabled: bool,
    /// Quiet period before a save.
    pub debounce_ms: u64,
    /// Prefix joined with the schema id to form the storage key.
    pub key_prefix: String,
    /// Maximum serialized payload size.
    pub max_bytes: usize,
}

impl Default for AutoSaveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: DEFAULT_AUTOSAVE_DEBOUNCE_MS,
            key_prefix: DEFAULT_AUTOSAVE_KEY_PREFIX.to_string(),
            max_bytes: MAX_SAVED_VALUES_BYTES,
        }
    }
}

impl AutoSaveSettings {
    /// Returns the storage key for `schema_id`.
    #[must_use]
    pub fn storage_key(&self, schema_id: &str) -> String {
        format!("{}{schema_id}", self.key_prefix)
    }
}

// ============================================================================
// SECTION: AutoSave
// ============================================================================

/// Background autosave for one mounted form.
///
/// Dropping the handle cancels any pending save.
pub struct AutoSave {
    /// Storage key.
    key: String,
    /// Teardown signal.
    shutdown: CancellationToken,
    /// Save loop, absent when disabled.
    task: Option<JoinHandle<()>>,
}

impl AutoSave {
    /// Starts autosave for `schema_id` on the current tokio runtime.
    ///
    /// No task is spawned when autosave is disabled.
    ///
    /// # Panics
    ///
    /// Panics when enabled and called outside a tokio runtime.
    #[must_use]
    pub fn spawn(
        schema_id: &str,
        state: Arc<dyn FormStateContainer>,
        store: Arc<dyn ValueStore>,
        settings: &AutoSaveSettings,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        let key = settings.storage_key(schema_id);
        let shutdown = CancellationToken::new();
        let task = settings.enabled.then(|| {
            let save = SaveLoop {
                key: key.clone(),
                state,
                store,
                debounce: Duration::from_millis(settings.debounce_ms),
                max_bytes: settings.max_bytes,
                sink,
                shutdown: shutdown.clone(),
            };
            tokio::spawn(save.run())
        });
        Self {
            key,
            shutdown,
            task,
        }
    }

    /// Returns the storage key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns true when a save loop is running.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.task.is_some()
    }

    /// Cancels any pending save.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Cancels any pending save and waits for the loop to stop.
    pub async fn join(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for AutoSave {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

/// Debounced save loop.
struct SaveLoop {
    /// Storage key.
    key: String,
    /// Container whose values are saved.
    state: Arc<dyn FormStateContainer>,
    /// Destination store.
    store: Arc<dyn ValueStore>,
    /// Quiet period before a save.
    debounce: Duration,
    /// Maximum serialized payload size.
    max_bytes: usize,
    /// Diagnostic sink.
    sink: Arc<dyn DiagnosticSink>,
    /// Teardown signal.
    shutdown: CancellationToken,
}

impl SaveLoop {
    /// Saves after each quiet period until teardown.
    async fn run(self) {
        let mut changes = self.state.subscribe();
        let mut deadline = None;
        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    deadline = Some(Instant::now() + self.debounce);
                }
                () = sleep_until_deadline(deadline) => {
                    deadline = None;
                    save_snapshot(
                        self.state.as_ref(),
                        self.store.as_ref(),
                        &self.key,
                        self.max_bytes,
                        self.sink.as_ref(),
                    );
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Persists the container's current values under `key`.
///
/// Returns true when the values were stored. Failures are reported to `sink`.
pub fn save_snapshot(
    state: &dyn FormStateContainer,
    store: &dyn ValueStore,
    key: &str,
    max_bytes: usize,
    sink: &dyn DiagnosticSink,
) -> bool {
    let payload = state.snapshot().to_json();
    match persist_values(store, key, &payload, max_bytes) {
        Ok(()) => {
            let bytes = serde_json::to_string(&payload).map_or(0, |text| text.len());
            sink.record_autosave(&AutoSaveEvent::saved(key, bytes));
            true
        }
        Err(err) => {
            sink.record_autosave(&AutoSaveEvent::skipped(key, skip_reason(&err)));
            false
        }
    }
}

/// Loads values previously saved for `schema_id`.
#[must_use]
pub fn load_saved_values(
    store: &dyn ValueStore,
    settings: &AutoSaveSettings,
    schema_id: &str,
) -> Option<FormValues> {
    load_values(store, &settings.storage_key(schema_id), settings.max_bytes)
}

/// Removes values saved for `schema_id`.
///
/// # Errors
///
/// Returns [`StoreError`] when the store cannot be written.
pub fn clear_saved_values(
    store: &dyn ValueStore,
    settings: &AutoSaveSettings,
    schema_id: &str,
) -> Result<(), StoreError> {
    clear_values(store, &settings.storage_key(schema_id))
}

/// Describes a persistence failure without echoing values.
fn skip_reason(err: &PersistError) -> String {
    match err {
        PersistError::InvalidShape => "invalid_shape".to_string(),
        PersistError::TooLarge {
            ..
        } => "too_large".to_string(),
        PersistError::Serialize(_) => "serialize_failed".to_string(),
        PersistError::Store(err) => format!("store_failed: {err}"),
    }
}
