// crates/schema-form-runtime/tests/integration_controller.rs
// ============================================================================
// Module: API Integration Controller Tests
// Description: Debounce, supersession, teardown, and failure handling.
// Purpose: Pin the integration state machine under a paused clock.
// Dependencies: schema-form-runtime, schema-form-core, tokio
// ============================================================================

//! ## Overview
//! Drives [`ApiIntegrationController`] against the in-memory form state and a
//! scripted remote service with tokio's paused clock, so every debounce and
//! latency boundary is deterministic.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use schema_form_core::ApiIntegration;
use schema_form_core::FormValue;
use schema_form_core::FormValues;
use schema_form_core::validate_form_schema_object;
use schema_form_runtime::ApiIntegrationController;
use schema_form_runtime::DiagnosticSink;
use schema_form_runtime::EndpointAllowlist;
use schema_form_runtime::FormStateContainer;
use schema_form_runtime::InMemoryFormState;
use schema_form_runtime::IntegrationPhase;
use schema_form_runtime::IntegrationRuntime;
use schema_form_runtime::IntegrationSettings;
use schema_form_runtime::LookupPayload;
use schema_form_runtime::MemoryDiagnosticSink;
use schema_form_runtime::RemoteCall;
use schema_form_runtime::RemoteCallError;
use schema_form_runtime::StaticLookupService;
use serde_json::json;
use tokio::time::Instant;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Remote service that answers from the built-in tables after a delay.
struct ScriptedRemote {
    /// Delay before answering.
    latency: Duration,
    /// Whether the delay stops early on cancellation.
    honour_cancel: bool,
    /// Whether every call fails.
    fail: bool,
    /// Calls received, with their start instants.
    calls: Mutex<Vec<(Instant, String, LookupPayload)>>,
    /// Calls that observed cancellation.
    cancelled: AtomicUsize,
}

impl ScriptedRemote {
    /// Creates a cooperative remote with `latency`.
    fn new(latency: Duration) -> Self {
        Self {
            latency,
            honour_cancel: true,
            fail: false,
            calls: Mutex::new(Vec::new()),
            cancelled: AtomicUsize::new(0),
        }
    }

    /// Returns the payloads received so far.
    fn payloads(&self) -> Vec<LookupPayload> {
        self.calls.lock().unwrap().iter().map(|(_, _, payload)| payload.clone()).collect()
    }

    /// Returns the start instants of calls received so far.
    fn starts(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(start, ..)| *start).collect()
    }
}

#[async_trait]
impl RemoteCall for ScriptedRemote {
    async fn call(
        &self,
        endpoint: &str,
        payload: &LookupPayload,
        cancel: &CancellationToken,
    ) -> Result<Option<FormValues>, RemoteCallError> {
        self.calls.lock().unwrap().push((Instant::now(), endpoint.to_string(), payload.clone()));
        if self.honour_cancel {
            tokio::select! {
                () = cancel.cancelled() => {
                    self.cancelled.fetch_add(1, Ordering::SeqCst);
                    return Err(RemoteCallError::Cancelled);
                }
                () = sleep(self.latency) => {}
            }
        } else {
            sleep(self.latency).await;
        }
        if self.fail {
            return Err(RemoteCallError::Failed("upstream unavailable".to_string()));
        }
        Ok(StaticLookupService::lookup(endpoint, payload))
    }
}

/// Address integration from postal code to city and oblast.
fn address_integration(debounce_ms: Option<u64>) -> ApiIntegration {
    ApiIntegration {
        endpoint: "fetchAddressFromPostalCode".to_string(),
        source_fields: vec!["postalCode".to_string()],
        target_fields: vec!["city".to_string(), "oblast".to_string()],
        debounce_ms,
    }
}

/// Assembled collaborators for one test.
struct Harness {
    /// Form state.
    state: Arc<InMemoryFormState>,
    /// Remote service.
    remote: Arc<ScriptedRemote>,
    /// Diagnostics.
    sink: Arc<MemoryDiagnosticSink>,
}

impl Harness {
    /// Builds a harness around `remote`.
    fn new(remote: ScriptedRemote) -> Self {
        Self {
            state: Arc::new(InMemoryFormState::default()),
            remote: Arc::new(remote),
            sink: Arc::new(MemoryDiagnosticSink::new()),
        }
    }

    /// Returns the runtime handed to the controller.
    fn runtime(&self) -> IntegrationRuntime {
        IntegrationRuntime {
            state: Arc::clone(&self.state) as Arc<dyn FormStateContainer>,
            remote: Arc::clone(&self.remote) as Arc<dyn RemoteCall>,
            allowlist: EndpointAllowlist::builtin(),
            settings: IntegrationSettings::default(),
            sink: Arc::clone(&self.sink) as Arc<dyn DiagnosticSink>,
        }
    }

    /// Spawns a controller for `integrations`.
    fn spawn(&self, integrations: Vec<ApiIntegration>) -> ApiIntegrationController {
        ApiIntegrationController::spawn(integrations, &self.runtime())
    }

    /// Returns the text at `path`.
    fn text(&self, path: &str) -> Option<String> {
        self.state.get_value(path).and_then(|value| value.as_str().map(str::to_string))
    }
}

// ============================================================================
// SECTION: Debounce
// ============================================================================

/// A change inside the debounce window restarts the timer from zero.
#[tokio::test(start_paused = true)]
async fn source_change_restarts_debounce() {
    let harness = Harness::new(ScriptedRemote::new(Duration::ZERO));
    let origin = Instant::now();
    let _controller = harness.spawn(vec![address_integration(None)]);

    harness.state.set_value("postalCode", FormValue::from("1000"));
    sleep(Duration::from_millis(200)).await;
    harness.state.set_value("postalCode", FormValue::from("1040"));
    sleep(Duration::from_millis(400)).await;
    assert!(harness.remote.payloads().is_empty());

    sleep(Duration::from_millis(200)).await;
    let payloads = harness.remote.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].get("postalCode").map(String::as_str), Some("1040"));
    let started = harness.remote.starts()[0] - origin;
    assert!(started >= Duration::from_millis(700) && started < Duration::from_millis(750));
    assert_eq!(harness.text("city").as_deref(), Some("София"));
    assert_eq!(harness.text("oblast").as_deref(), Some("София-град"));
}

/// Values present when the controller starts are looked up without a change.
#[tokio::test(start_paused = true)]
async fn initial_values_trigger_lookup() {
    let harness = Harness::new(ScriptedRemote::new(Duration::ZERO));
    harness.state.set_value("postalCode", FormValue::from("9000"));
    let _controller = harness.spawn(vec![address_integration(Some(100))]);

    sleep(Duration::from_millis(150)).await;
    assert_eq!(harness.remote.payloads().len(), 1);
    assert_eq!(harness.text("city").as_deref(), Some("Варна"));
}

/// Clearing a source while debouncing cancels the pending timer.
#[tokio::test(start_paused = true)]
async fn emptied_source_cancels_pending_timer() {
    let harness = Harness::new(ScriptedRemote::new(Duration::ZERO));
    let _controller = harness.spawn(vec![address_integration(Some(300))]);

    harness.state.set_value("postalCode", FormValue::from("1000"));
    sleep(Duration::from_millis(100)).await;
    harness.state.set_value("postalCode", FormValue::from(""));
    sleep(Duration::from_secs(2)).await;
    assert!(harness.remote.payloads().is_empty());
}

/// Nothing fires until every source is filled.
#[tokio::test(start_paused = true)]
async fn waits_for_every_source() {
    let harness = Harness::new(ScriptedRemote::new(Duration::ZERO));
    let integration = ApiIntegration {
        endpoint: "validateDocument".to_string(),
        source_fields: vec!["documentType".to_string(), "documentNumber".to_string()],
        target_fields: vec!["isValid".to_string(), "message".to_string()],
        debounce_ms: Some(100),
    };
    let _controller = harness.spawn(vec![integration]);

    harness.state.set_value("documentType", FormValue::from("EGN"));
    sleep(Duration::from_secs(1)).await;
    assert!(harness.remote.payloads().is_empty());

    harness.state.set_value("documentNumber", FormValue::from("7523169263"));
    sleep(Duration::from_millis(150)).await;
    assert_eq!(harness.remote.payloads().len(), 1);
    assert_eq!(harness.state.get_value("isValid"), Some(FormValue::Flag(true)));
}

// ============================================================================
// SECTION: Supersession
// ============================================================================

/// A newer change cancels the outstanding lookup and applies only the newer result.
#[tokio::test(start_paused = true)]
async fn newer_change_supersedes_in_flight_call() {
    let harness = Harness::new(ScriptedRemote::new(Duration::from_secs(1)));
    let _controller = harness.spawn(vec![address_integration(Some(100))]);

    harness.state.set_value("postalCode", FormValue::from("1000"));
    sleep(Duration::from_millis(150)).await;
    assert_eq!(harness.remote.payloads().len(), 1);

    harness.state.set_value("postalCode", FormValue::from("4000"));
    sleep(Duration::from_secs(2)).await;
    assert_eq!(harness.remote.payloads().len(), 2);
    assert_eq!(harness.remote.cancelled.load(Ordering::SeqCst), 1);
    assert_eq!(harness.text("city").as_deref(), Some("Пловдив"));
    assert_eq!(
        harness.sink.phases(0),
        vec![
            IntegrationPhase::Debouncing,
            IntegrationPhase::InFlight,
            IntegrationPhase::Aborted,
            IntegrationPhase::Debouncing,
            IntegrationPhase::InFlight,
            IntegrationPhase::Applied,
            IntegrationPhase::Idle,
        ]
    );
}

/// A superseded call that ignores cancellation still never writes its result.
#[tokio::test(start_paused = true)]
async fn late_superseded_result_is_discarded() {
    let mut remote = ScriptedRemote::new(Duration::from_secs(1));
    remote.honour_cancel = false;
    let harness = Harness::new(remote);
    let _controller = harness.spawn(vec![address_integration(Some(100))]);

    harness.state.set_value("postalCode", FormValue::from("1000"));
    sleep(Duration::from_millis(150)).await;
    harness.state.set_value("postalCode", FormValue::from("4000"));

    sleep(Duration::from_millis(1000)).await;
    assert_eq!(harness.text("city"), None);

    sleep(Duration::from_millis(500)).await;
    assert_eq!(harness.text("city").as_deref(), Some("Пловдив"));
}

// ============================================================================
// SECTION: Teardown
// ============================================================================

/// Teardown cancels the outstanding lookup and nothing is written afterwards.
#[tokio::test(start_paused = true)]
async fn teardown_cancels_in_flight_call() {
    let harness = Harness::new(ScriptedRemote::new(Duration::from_secs(1)));
    let controller = harness.spawn(vec![address_integration(Some(100))]);

    harness.state.set_value("postalCode", FormValue::from("1000"));
    sleep(Duration::from_millis(150)).await;
    controller.join().await;

    sleep(Duration::from_secs(2)).await;
    assert_eq!(harness.remote.cancelled.load(Ordering::SeqCst), 1);
    assert_eq!(harness.text("city"), None);
}

/// Teardown during the debounce window prevents the lookup entirely.
#[tokio::test(start_paused = true)]
async fn teardown_cancels_pending_timer() {
    let harness = Harness::new(ScriptedRemote::new(Duration::ZERO));
    let controller = harness.spawn(vec![address_integration(Some(300))]);

    harness.state.set_value("postalCode", FormValue::from("1000"));
    sleep(Duration::from_millis(100)).await;
    drop(controller);

    sleep(Duration::from_secs(1)).await;
    assert!(harness.remote.payloads().is_empty());
}

// ============================================================================
// SECTION: Failures
// ============================================================================

/// Endpoints outside the allow-list are never called.
#[tokio::test(start_paused = true)]
async fn unknown_endpoint_is_rejected() {
    let harness = Harness::new(ScriptedRemote::new(Duration::ZERO));
    let mut integration = address_integration(Some(100));
    integration.endpoint = "deleteEverything".to_string();
    let _controller = harness.spawn(vec![integration]);

    harness.state.set_value("postalCode", FormValue::from("1000"));
    sleep(Duration::from_millis(500)).await;
    assert!(harness.remote.payloads().is_empty());
    let events = harness.sink.integration_events();
    assert!(events.iter().any(|event| event.event == "integration_rejected"));
}

/// Failures leave targets untouched and surface only as diagnostics.
#[tokio::test(start_paused = true)]
async fn failure_is_absorbed() {
    let mut remote = ScriptedRemote::new(Duration::from_millis(50));
    remote.fail = true;
    let harness = Harness::new(remote);
    harness.state.set_value("city", FormValue::from("unchanged"));
    let _controller = harness.spawn(vec![address_integration(Some(100))]);

    harness.state.set_value("postalCode", FormValue::from("1000"));
    sleep(Duration::from_millis(500)).await;
    assert_eq!(harness.text("city").as_deref(), Some("unchanged"));
    let events = harness.sink.integration_events();
    let failure = events.iter().find(|event| event.event == "integration_failed").unwrap();
    assert_eq!(failure.message.as_deref(), Some("upstream unavailable"));
    assert!(harness.sink.phases(0).ends_with(&[IntegrationPhase::Failed, IntegrationPhase::Idle]));
}

/// Targets without a matching result key keep their values.
#[tokio::test(start_paused = true)]
async fn unmatched_targets_are_untouched() {
    let harness = Harness::new(ScriptedRemote::new(Duration::ZERO));
    harness.state.set_value("notes", FormValue::from("keep"));
    let mut integration = address_integration(Some(100));
    integration.target_fields.push("notes".to_string());
    let _controller = harness.spawn(vec![integration]);

    harness.state.set_value("postalCode", FormValue::from("8000"));
    sleep(Duration::from_millis(200)).await;
    assert_eq!(harness.text("city").as_deref(), Some("Бургас"));
    assert_eq!(harness.text("notes").as_deref(), Some("keep"));
}

// ============================================================================
// SECTION: Schema Wiring
// ============================================================================

/// Schema-level and field-level integrations both run, nested paths included.
#[tokio::test(start_paused = true)]
async fn schema_integrations_are_collected() {
    let document = json!({
        "title": "Registration",
        "fields": [
            { "id": "contactInfo", "label": "Contact", "type": "group", "fields": [
                { "id": "postalCode", "label": "Postal code", "type": "text",
                  "apiIntegration": {
                      "endpoint": "fetchAddressFromPostalCode",
                      "sourceFields": ["contactInfo.postalCode"],
                      "targetFields": ["contactInfo.city"],
                      "debounceMs": 100
                  } },
                { "id": "city", "label": "City", "type": "text" }
            ] },
            { "id": "eik", "label": "EIK", "type": "text" },
            { "id": "companyName", "label": "Company", "type": "text" }
        ],
        "apiIntegrations": [{
            "endpoint": "fetchCompanyDetails",
            "sourceFields": ["eik"],
            "targetFields": ["companyName"],
            "debounceMs": 100
        }]
    });
    let schema = validate_form_schema_object(&document).into_schema().unwrap();
    let harness = Harness::new(ScriptedRemote::new(Duration::ZERO));
    let controller = ApiIntegrationController::for_schema(&schema, &harness.runtime());
    assert_eq!(controller.len(), 2);

    harness.state.set_value("contactInfo.postalCode", FormValue::from("7000"));
    harness.state.set_value("eik", FormValue::from("175188113"));
    sleep(Duration::from_millis(200)).await;
    assert_eq!(harness.text("contactInfo.city").as_deref(), Some("Русе"));
    assert_eq!(harness.text("companyName").as_deref(), Some("Технологии България АД"));
    assert!(harness.state.registered_fields().contains(&"contactInfo.city".to_string()));
}
