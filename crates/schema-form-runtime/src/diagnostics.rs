// crates/schema-form-runtime/src/diagnostics.rs
// ============================================================================
// Module: Runtime Diagnostics
// Description: Structured diagnostic events for integrations and autosave.
// Purpose: Report absorbed failures without surfacing them to users.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Integration and autosave failures never reach the user. They are recorded
//! as JSON-line events through a [`DiagnosticSink`] so deployments can route
//! them to their preferred logging pipeline. Events carry field paths and
//! sizes but never field values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Lifecycle phase of one integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationPhase {
    /// Waiting for all source fields to be filled.
    Idle,
    /// Sources are filled; the debounce timer is running.
    Debouncing,
    /// A lookup is outstanding.
    InFlight,
    /// Lookup results were written to target fields.
    Applied,
    /// The lookup was superseded or torn down.
    Aborted,
    /// The lookup failed.
    Failed,
}

/// Integration diagnostic event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrationEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Position of the integration in declaration order.
    pub integration: usize,
    /// Endpoint name.
    pub endpoint: String,
    /// Phase entered, for transition events.
    pub phase: Option<IntegrationPhase>,
    /// Failure detail, for failure events.
    pub message: Option<String>,
}

impl IntegrationEvent {
    /// Builds a phase transition event.
    #[must_use]
    pub fn transition(integration: usize, endpoint: &str, phase: IntegrationPhase) -> Self {
        Self::build("integration_transition", integration, endpoint, Some(phase), None)
    }

    /// Builds an endpoint rejection event.
    #[must_use]
    pub fn rejected(integration: usize, endpoint: &str) -> Self {
        Self::build("integration_rejected", integration, endpoint, None, None)
    }

    /// Builds a lookup failure event.
    #[must_use]
    pub fn failed(integration: usize, endpoint: &str, message: String) -> Self {
        Self::build("integration_failed", integration, endpoint, None, Some(message))
    }

    /// Stamps and assembles an event.
    fn build(
        event: &'static str,
        integration: usize,
        endpoint: &str,
        phase: Option<IntegrationPhase>,
        message: Option<String>,
    ) -> Self {
        Self {
            event,
            timestamp_ms: now_ms(),
            integration,
            endpoint: endpoint.to_string(),
            phase,
            message,
        }
    }
}

/// Autosave diagnostic event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoSaveEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Storage key.
    pub key: String,
    /// Serialized payload size, for saved events.
    pub bytes: Option<usize>,
    /// Skip reason, for skipped events.
    pub reason: Option<String>,
}

impl AutoSaveEvent {
    /// Builds a saved event.
    #[must_use]
    pub fn saved(key: &str, bytes: usize) -> Self {
        Self {
            event: "autosave_saved",
            timestamp_ms: now_ms(),
            key: key.to_string(),
            bytes: Some(bytes),
            reason: None,
        }
    }

    /// Builds a skipped event.
    #[must_use]
    pub fn skipped(key: &str, reason: String) -> Self {
        Self {
            event: "autosave_skipped",
            timestamp_ms: now_ms(),
            key: key.to_string(),
            bytes: None,
            reason: Some(reason),
        }
    }
}

/// Returns milliseconds since the Unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Diagnostic sink for runtime events.
pub trait DiagnosticSink: Send + Sync {
    /// Records an integration event.
    fn record_integration(&self, event: &IntegrationEvent);

    /// Records an autosave event.
    fn record_autosave(&self, event: &AutoSaveEvent);
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Diagnostic sink that logs JSON lines to stderr.
pub struct StderrDiagnosticSink;

impl DiagnosticSink for StderrDiagnosticSink {
    fn record_integration(&self, event: &IntegrationEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }

    fn record_autosave(&self, event: &AutoSaveEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Diagnostic sink that appends JSON lines to a file.
pub struct FileDiagnosticSink {
    /// File handle guarded for concurrent writes.
    file: Mutex<std::fs::File>,
}

impl FileDiagnosticSink {
    /// Opens a file-backed diagnostic sink.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Writes one serialized event line.
    fn write_line<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl DiagnosticSink for FileDiagnosticSink {
    fn record_integration(&self, event: &IntegrationEvent) {
        self.write_line(event);
    }

    fn record_autosave(&self, event: &AutoSaveEvent) {
        self.write_line(event);
    }
}

/// No-op diagnostic sink.
pub struct NoopDiagnosticSink;

impl DiagnosticSink for NoopDiagnosticSink {
    fn record_integration(&self, _event: &IntegrationEvent) {}

    fn record_autosave(&self, _event: &AutoSaveEvent) {}
}

/// Diagnostic sink that keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryDiagnosticSink {
    /// Recorded integration events.
    integration: Mutex<Vec<IntegrationEvent>>,
    /// Recorded autosave events.
    autosave: Mutex<Vec<AutoSaveEvent>>,
}

impl MemoryDiagnosticSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns recorded integration events.
    #[must_use]
    pub fn integration_events(&self) -> Vec<IntegrationEvent> {
        self.integration.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns recorded autosave events.
    #[must_use]
    pub fn autosave_events(&self) -> Vec<AutoSaveEvent> {
        self.autosave.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns the phases recorded for one integration, in order.
    #[must_use]
    pub fn phases(&self, integration: usize) -> Vec<IntegrationPhase> {
        self.integration_events()
            .into_iter()
            .filter(|event| event.integration == integration)
            .filter_map(|event| event.phase)
            .collect()
    }
}

impl DiagnosticSink for MemoryDiagnosticSink {
    fn record_integration(&self, event: &IntegrationEvent) {
        self.integration.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
    }

    fn record_autosave(&self, event: &AutoSaveEvent) {
        self.autosave.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
    }
}
