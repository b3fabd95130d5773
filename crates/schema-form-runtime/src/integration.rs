// crates/schema-form-runtime/src/integration.rs
// ============================================================================
// Module: API Integration Controller
// Description: Debounced, cancellable lookups that fill target fields.
// Purpose: Drive the per-integration Idle/Debouncing/InFlight state machine.
// Dependencies: schema-form-core, tokio, tokio-util
// ============================================================================

//! ## Overview
//! [`ApiIntegrationController`] runs one task per declared integration. Each
//! task watches its source fields through the form-state container, waits
//! for the debounce delay once every source is filled, then issues one remote
//! lookup and writes matching result keys into the target fields.
//!
//! # Invariants
//! - At most one lookup per integration is outstanding.
//! - A source change cancels the pending timer and any outstanding lookup;
//!   results of a cancelled lookup are never applied.
//! - After shutdown no value is written and no lookup is started.
//! - Endpoints outside the allow-list are never called.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future;
use std::sync::Arc;
use std::time::Duration;

use schema_form_core::ApiIntegration;
use schema_form_core::DEFAULT_DEBOUNCE_MS;
use schema_form_core::FormSchema;
use schema_form_core::FormValue;
use schema_form_core::FormValues;
use schema_form_core::last_segment;
use tokio::task::JoinError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::allowlist::EndpointAllowlist;
use crate::diagnostics::DiagnosticSink;
use crate::diagnostics::IntegrationEvent;
use crate::diagnostics::IntegrationPhase;
use crate::interfaces::FormStateContainer;
use crate::interfaces::LookupPayload;
use crate::interfaces::RemoteCall;
use crate::interfaces::RemoteCallError;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Runtime settings shared by all integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrationSettings {
    /// Debounce applied when an integration declares none.
    pub default_debounce_ms: u64,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            default_debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

/// Collaborators handed to every integration task.
#[derive(Clone)]
pub struct IntegrationRuntime {
    /// Form-state container read for sources and written for targets.
    pub state: Arc<dyn FormStateContainer>,
    /// Remote lookup service.
    pub remote: Arc<dyn RemoteCall>,
    /// Endpoints that may be called.
    pub allowlist: EndpointAllowlist,
    /// Shared settings.
    pub settings: IntegrationSettings,
    /// Diagnostic sink for transitions and absorbed failures.
    pub sink: Arc<dyn DiagnosticSink>,
}

// ============================================================================
// SECTION: Controller
// ============================================================================

/// Owner of the integration tasks for one mounted form.
///
/// Dropping the controller tears every task down.
pub struct ApiIntegrationController {
    /// Teardown signal; lookup tokens are children of it.
    shutdown: CancellationToken,
    /// One task per integration.
    tasks: Vec<JoinHandle<()>>,
}

impl ApiIntegrationController {
    /// Spawns one task per integration on the current tokio runtime.
    ///
    /// Integrations without source fields never fire.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn spawn(integrations: Vec<ApiIntegration>, runtime: &IntegrationRuntime) -> Self {
        let shutdown = CancellationToken::new();
        let tasks = integrations
            .into_iter()
            .enumerate()
            .map(|(index, integration)| {
                let worker = IntegrationWorker::new(
                    index,
                    integration,
                    runtime.clone(),
                    shutdown.clone(),
                );
                tokio::spawn(worker.run())
            })
            .collect();
        Self {
            shutdown,
            tasks,
        }
    }

    /// Spawns tasks for every integration declared in `schema`.
    #[must_use]
    pub fn for_schema(schema: &FormSchema, runtime: &IntegrationRuntime) -> Self {
        Self::spawn(schema.all_integrations(), runtime)
    }

    /// Returns the number of integration tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true when no integration is running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Signals teardown: pending timers stop and outstanding lookups are cancelled.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Tears down and waits for every task to finish.
    pub async fn join(mut self) {
        self.shutdown.cancel();
        for handle in self.tasks.drain(..) {
            let _ = handle.await;
        }
    }
}

impl Drop for ApiIntegrationController {
    fn drop(&mut self) {
        self.shutdown.cancel();
        for handle in &self.tasks {
            handle.abort();
        }
    }
}

// ============================================================================
// SECTION: Worker
// ============================================================================

/// Outcome of a spawned lookup.
type CallOutcome = Result<Result<Option<FormValues>, RemoteCallError>, JoinError>;

/// Outstanding lookup for one integration.
struct InFlight {
    /// Cancellation handed to the remote call.
    cancel: CancellationToken,
    /// Spawned call.
    handle: JoinHandle<Result<Option<FormValues>, RemoteCallError>>,
}

/// State machine for one integration.
struct IntegrationWorker {
    /// Declaration index, used in diagnostics.
    index: usize,
    /// Integration being driven.
    integration: ApiIntegration,
    /// Shared collaborators.
    runtime: IntegrationRuntime,
    /// Controller teardown signal.
    shutdown: CancellationToken,
    /// Current phase.
    phase: IntegrationPhase,
}

impl IntegrationWorker {
    /// Creates an idle worker.
    fn new(
        index: usize,
        integration: ApiIntegration,
        runtime: IntegrationRuntime,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            index,
            integration,
            runtime,
            shutdown,
            phase: IntegrationPhase::Idle,
        }
    }

    /// Runs until teardown or until the container stops publishing changes.
    async fn run(mut self) {
        let sources = self.integration.source_fields.clone();
        for path in sources.iter().chain(&self.integration.target_fields) {
            self.runtime.state.register_field(path);
        }
        if sources.is_empty() {
            return;
        }
        let debounce = Duration::from_millis(
            self.integration.effective_debounce_ms(self.runtime.settings.default_debounce_ms),
        );
        let mut changes = self.runtime.state.subscribe();
        let mut observed = self.runtime.state.watch(&sources);
        let mut deadline = None;
        if build_payload(&sources, &observed).is_some() {
            deadline = Some(Instant::now() + debounce);
            self.enter(IntegrationPhase::Debouncing);
        }
        let mut in_flight: Option<InFlight> = None;

        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => {
                    if let Some(call) = in_flight.take() {
                        call.cancel.cancel();
                        self.enter(IntegrationPhase::Aborted);
                    }
                    break;
                }
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let current = self.runtime.state.watch(&sources);
                    if current == observed {
                        continue;
                    }
                    observed = current;
                    if let Some(call) = in_flight.take() {
                        call.cancel.cancel();
                        self.enter(IntegrationPhase::Aborted);
                    }
                    if build_payload(&sources, &observed).is_some() {
                        deadline = Some(Instant::now() + debounce);
                        self.enter(IntegrationPhase::Debouncing);
                    } else {
                        deadline = None;
                        self.enter(IntegrationPhase::Idle);
                    }
                }
                () = sleep_until_deadline(deadline) => {
                    deadline = None;
                    in_flight = self.fire(&sources, &observed);
                }
                outcome = settle(&mut in_flight) => {
                    in_flight = None;
                    self.complete(outcome);
                }
            }
        }
    }

    /// Starts a lookup once the debounce elapses.
    fn fire(&mut self, sources: &[String], observed: &[Option<FormValue>]) -> Option<InFlight> {
        let Some(payload) = build_payload(sources, observed) else {
            self.enter(IntegrationPhase::Idle);
            return None;
        };
        let endpoint = self.integration.endpoint.clone();
        if !self.runtime.allowlist.is_allowed(&endpoint) {
            self.runtime.sink.record_integration(&IntegrationEvent::rejected(self.index, &endpoint));
            self.enter(IntegrationPhase::Idle);
            return None;
        }
        let cancel = self.shutdown.child_token();
        let call_cancel = cancel.clone();
        let remote = Arc::clone(&self.runtime.remote);
        let handle =
            tokio::spawn(async move { remote.call(&endpoint, &payload, &call_cancel).await });
        self.enter(IntegrationPhase::InFlight);
        Some(InFlight {
            cancel,
            handle,
        })
    }

    /// Applies or absorbs the outcome of a finished lookup.
    fn complete(&mut self, outcome: CallOutcome) {
        if self.shutdown.is_cancelled() {
            self.enter(IntegrationPhase::Aborted);
            return;
        }
        match outcome {
            Ok(Ok(result)) => {
                if let Some(values) = result {
                    self.apply(&values);
                }
                self.enter(IntegrationPhase::Applied);
            }
            Ok(Err(RemoteCallError::Cancelled)) => self.enter(IntegrationPhase::Aborted),
            Ok(Err(RemoteCallError::Failed(message))) => self.fail(message),
            Err(err) => self.fail(err.to_string()),
        }
        self.enter(IntegrationPhase::Idle);
    }

    /// Writes result keys into matching target fields.
    fn apply(&self, values: &FormValues) {
        for target in &self.integration.target_fields {
            if let Some(value) = values.get(last_segment(target)) {
                self.runtime.state.set_value(target, value.clone());
            }
        }
    }

    /// Records an absorbed failure.
    fn fail(&mut self, message: String) {
        let event = IntegrationEvent::failed(self.index, &self.integration.endpoint, message);
        self.runtime.sink.record_integration(&event);
        self.enter(IntegrationPhase::Failed);
    }

    /// Moves to `phase`, recording the transition when the phase changes.
    fn enter(&mut self, phase: IntegrationPhase) {
        if self.phase == phase {
            return;
        }
        self.phase = phase;
        let event = IntegrationEvent::transition(self.index, &self.integration.endpoint, phase);
        self.runtime.sink.record_integration(&event);
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the lookup payload, or `None` while any source is missing or empty.
///
/// Each source contributes its final path segment and its full path, with the
/// full path taking precedence on collision.
#[must_use]
pub fn build_payload(sources: &[String], values: &[Option<FormValue>]) -> Option<LookupPayload> {
    let mut texts = Vec::with_capacity(sources.len());
    for (path, value) in sources.iter().zip(values) {
        let text = value.as_ref()?.payload_text()?;
        if text.is_empty() {
            return None;
        }
        texts.push((path, text));
    }
    let mut payload = LookupPayload::new();
    for (path, text) in &texts {
        payload.insert(last_segment(path).to_string(), text.clone());
    }
    for (path, text) in texts {
        payload.insert(path.clone(), text);
    }
    Some(payload)
}

/// Sleeps until `deadline`, or forever when there is none.
pub(crate) async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}

/// Waits for the outstanding lookup, or forever when there is none.
async fn settle(in_flight: &mut Option<InFlight>) -> CallOutcome {
    match in_flight {
        Some(call) => (&mut call.handle).await,
        None => future::pending().await,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
