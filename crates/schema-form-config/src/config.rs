// crates/schema-form-config/src/config.rs
// ============================================================================
// Module: Schema Form Configuration
// Description: Configuration loading and validation for the form engine.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: schema-form-core, schema-form-runtime, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file at an explicit path with strict
//! size and path limits. Every section is optional and defaults to the
//! engine's built-in values; unknown keys and out-of-range values are
//! rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use schema_form_core::InMemoryValueStore;
use schema_form_core::MAX_GROUP_DEPTH;
use schema_form_core::MAX_SAVED_VALUES_BYTES;
use schema_form_core::MAX_SCHEMA_BYTES;
use schema_form_core::SchemaLimits;
use schema_form_core::ValueStore;
use schema_form_runtime::AutoSaveSettings;
use schema_form_runtime::BUILTIN_ENDPOINTS;
use schema_form_runtime::DEFAULT_AUTOSAVE_DEBOUNCE_MS;
use schema_form_runtime::DEFAULT_AUTOSAVE_KEY_PREFIX;
use schema_form_runtime::DiagnosticSink;
use schema_form_runtime::EndpointAllowlist;
use schema_form_runtime::FileDiagnosticSink;
use schema_form_runtime::IntegrationSettings;
use schema_form_runtime::NoopDiagnosticSink;
use schema_form_runtime::StderrDiagnosticSink;
use schema_form_store_sqlite::SqliteStoreConfig;
use schema_form_store_sqlite::SqliteStoreMode;
use schema_form_store_sqlite::SqliteSyncMode;
use schema_form_store_sqlite::SqliteValueStore;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Upper bound for `limits.max_schema_bytes`.
pub const MAX_SCHEMA_BYTES_CEILING: usize = 64 * 1024 * 1024;
/// Upper bound for `limits.max_group_depth`.
pub const MAX_GROUP_DEPTH_CEILING: usize = 32;
/// Upper bound for debounce delays in milliseconds.
pub const MAX_DEBOUNCE_MS: u64 = 60_000;
/// Maximum number of allow-listed endpoints.
pub(crate) const MAX_ALLOWED_ENDPOINTS: usize = 64;
/// Maximum length of an endpoint name.
pub(crate) const MAX_ENDPOINT_NAME_LENGTH: usize = 128;
/// Maximum length of the autosave key prefix.
pub(crate) const MAX_KEY_PREFIX_LENGTH: usize = 128;
/// Default busy timeout for the `SQLite` value store.
const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Config Root
// ============================================================================

/// Schema form configuration root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFormConfig {
    /// Document and payload size limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// API integration settings.
    #[serde(default)]
    pub integrations: IntegrationsConfig,
    /// Autosave settings.
    #[serde(default)]
    pub autosave: AutoSaveConfig,
    /// Diagnostic sink selection.
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    /// Persisted value store selection.
    #[serde(default)]
    pub value_store: ValueStoreConfig,
}

impl SchemaFormConfig {
    /// Loads and validates configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits.validate()?;
        self.integrations.validate()?;
        self.autosave.validate()?;
        self.diagnostics.validate()?;
        self.value_store.validate()
    }

    /// Returns the schema validator limits.
    #[must_use]
    pub const fn schema_limits(&self) -> SchemaLimits {
        SchemaLimits {
            max_schema_bytes: self.limits.max_schema_bytes,
            max_group_depth: self.limits.max_group_depth,
        }
    }

    /// Returns the integration endpoint allow-list.
    #[must_use]
    pub fn endpoint_allowlist(&self) -> EndpointAllowlist {
        EndpointAllowlist::new(self.integrations.allowed_endpoints.iter().cloned())
    }

    /// Returns the integration runtime settings.
    #[must_use]
    pub const fn integration_settings(&self) -> IntegrationSettings {
        IntegrationSettings {
            default_debounce_ms: self.integrations.default_debounce_ms,
        }
    }

    /// Returns the autosave settings.
    #[must_use]
    pub fn autosave_settings(&self) -> AutoSaveSettings {
        AutoSaveSettings {
            enabled: self.autosave.enabled,
            debounce_ms: self.autosave.debounce_ms,
            key_prefix: self.autosave.key_prefix.clone(),
            max_bytes: self.limits.max_saved_values_bytes,
        }
    }

    /// Builds the configured diagnostic sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the diagnostics file cannot be opened.
    pub fn build_diagnostic_sink(&self) -> Result<Arc<dyn DiagnosticSink>, ConfigError> {
        match self.diagnostics.sink {
            DiagnosticSinkType::None => Ok(Arc::new(NoopDiagnosticSink)),
            DiagnosticSinkType::Stderr => Ok(Arc::new(StderrDiagnosticSink)),
            DiagnosticSinkType::File => {
                let path = self.diagnostics.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("file diagnostics sink requires path".to_string())
                })?;
                let sink =
                    FileDiagnosticSink::new(path).map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
        }
    }

    /// Builds the configured value store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the `SQLite` store cannot be opened.
    pub fn build_value_store(&self) -> Result<Arc<dyn ValueStore>, ConfigError> {
        match self.value_store.store_type {
            ValueStoreType::Memory => Ok(Arc::new(InMemoryValueStore::new())),
            ValueStoreType::Sqlite => {
                let path = self.value_store.path.clone().ok_or_else(|| {
                    ConfigError::Invalid("sqlite value_store requires path".to_string())
                })?;
                let store = SqliteValueStore::new(SqliteStoreConfig {
                    path,
                    busy_timeout_ms: self.value_store.busy_timeout_ms,
                    journal_mode: self.value_store.journal_mode,
                    sync_mode: self.value_store.sync_mode,
                    max_payload_bytes: self.limits.max_saved_values_bytes,
                })
                .map_err(|err| ConfigError::Invalid(err.to_string()))?;
                Ok(Arc::new(store))
            }
        }
    }
}

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Document and payload size limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum schema document size in bytes.
    #[serde(default = "default_max_schema_bytes")]
    pub max_schema_bytes: usize,
    /// Maximum nested group depth.
    #[serde(default = "default_max_group_depth")]
    pub max_group_depth: usize,
    /// Maximum serialized size of saved values in bytes.
    #[serde(default = "default_max_saved_values_bytes")]
    pub max_saved_values_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_schema_bytes: default_max_schema_bytes(),
            max_group_depth: default_max_group_depth(),
            max_saved_values_bytes: default_max_saved_values_bytes(),
        }
    }
}

impl LimitsConfig {
    /// Validates limit ranges.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_schema_bytes == 0 || self.max_schema_bytes > MAX_SCHEMA_BYTES_CEILING {
            return Err(ConfigError::Invalid(format!(
                "limits.max_schema_bytes out of range: {} (max {MAX_SCHEMA_BYTES_CEILING})",
                self.max_schema_bytes
            )));
        }
        if self.max_group_depth == 0 || self.max_group_depth > MAX_GROUP_DEPTH_CEILING {
            return Err(ConfigError::Invalid(format!(
                "limits.max_group_depth out of range: {} (max {MAX_GROUP_DEPTH_CEILING})",
                self.max_group_depth
            )));
        }
        if self.max_saved_values_bytes == 0 {
            return Err(ConfigError::Invalid(
                "limits.max_saved_values_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns the default maximum schema size.
const fn default_max_schema_bytes() -> usize {
    MAX_SCHEMA_BYTES
}

/// Returns the default maximum group depth.
const fn default_max_group_depth() -> usize {
    MAX_GROUP_DEPTH
}

/// Returns the default maximum saved values size.
const fn default_max_saved_values_bytes() -> usize {
    MAX_SAVED_VALUES_BYTES
}

// ============================================================================
// SECTION: Integrations
// ============================================================================

/// API integration settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntegrationsConfig {
    /// Debounce applied when an integration declares none.
    #[serde(default = "default_integration_debounce_ms")]
    pub default_debounce_ms: u64,
    /// Endpoint names integrations may call.
    #[serde(default = "default_allowed_endpoints")]
    pub allowed_endpoints: Vec<String>,
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            default_debounce_ms: default_integration_debounce_ms(),
            allowed_endpoints: default_allowed_endpoints(),
        }
    }
}

impl IntegrationsConfig {
    /// Validates debounce range and endpoint names.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_debounce("integrations.default_debounce_ms", self.default_debounce_ms)?;
        if self.allowed_endpoints.is_empty() {
            return Err(ConfigError::Invalid(
                "integrations.allowed_endpoints must be non-empty".to_string(),
            ));
        }
        if self.allowed_endpoints.len() > MAX_ALLOWED_ENDPOINTS {
            return Err(ConfigError::Invalid(format!(
                "integrations.allowed_endpoints exceeds {MAX_ALLOWED_ENDPOINTS} entries"
            )));
        }
        let mut seen = BTreeSet::new();
        for endpoint in &self.allowed_endpoints {
            if endpoint.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "integrations.allowed_endpoints entries must be non-empty".to_string(),
                ));
            }
            if endpoint.len() > MAX_ENDPOINT_NAME_LENGTH {
                return Err(ConfigError::Invalid(
                    "integrations.allowed_endpoints entry exceeds max length".to_string(),
                ));
            }
            if !seen.insert(endpoint.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "integrations.allowed_endpoints contains duplicate entry: {endpoint}"
                )));
            }
        }
        Ok(())
    }
}

/// Returns the default integration debounce.
const fn default_integration_debounce_ms() -> u64 {
    schema_form_core::DEFAULT_DEBOUNCE_MS
}

/// Returns the built-in endpoint names.
fn default_allowed_endpoints() -> Vec<String> {
    BUILTIN_ENDPOINTS.iter().map(|endpoint| (*endpoint).to_string()).collect()
}

// ============================================================================
// SECTION: AutoSave
// ============================================================================

/// Autosave settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutoSaveConfig {
    /// Whether autosave runs.
    #[serde(default = "default_autosave_enabled")]
    pub enabled: bool,
    /// Quiet period before a save.
    #[serde(default = "default_autosave_debounce_ms")]
    pub debounce_ms: u64,
    /// Storage key prefix.
    #[serde(default = "default_autosave_key_prefix")]
    pub key_prefix: String,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: default_autosave_enabled(),
            debounce_ms: default_autosave_debounce_ms(),
            key_prefix: default_autosave_key_prefix(),
        }
    }
}

impl AutoSaveConfig {
    /// Validates debounce range and key prefix.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_debounce("autosave.debounce_ms", self.debounce_ms)?;
        if self.key_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("autosave.key_prefix must be non-empty".to_string()));
        }
        if self.key_prefix.len() > MAX_KEY_PREFIX_LENGTH {
            return Err(ConfigError::Invalid("autosave.key_prefix exceeds max length".to_string()));
        }
        Ok(())
    }
}

/// Returns whether autosave is enabled by default.
const fn default_autosave_enabled() -> bool {
    true
}

/// Returns the default autosave debounce.
const fn default_autosave_debounce_ms() -> u64 {
    DEFAULT_AUTOSAVE_DEBOUNCE_MS
}

/// Returns the default autosave key prefix.
fn default_autosave_key_prefix() -> String {
    DEFAULT_AUTOSAVE_KEY_PREFIX.to_string()
}

// ============================================================================
// SECTION: Diagnostics
// ============================================================================

/// Diagnostic sink selection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Sink type.
    #[serde(default)]
    pub sink: DiagnosticSinkType,
    /// Output path for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl DiagnosticsConfig {
    /// Validates that `path` is set exactly for the file sink.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (DiagnosticSinkType::File, Some(path)) => {
                validate_path_string("diagnostics.path", &path.to_string_lossy())
            }
            (DiagnosticSinkType::File, None) => {
                Err(ConfigError::Invalid("file diagnostics sink requires path".to_string()))
            }
            (DiagnosticSinkType::Stderr | DiagnosticSinkType::None, Some(_)) => Err(
                ConfigError::Invalid("diagnostics.path is only valid for the file sink".to_string()),
            ),
            (DiagnosticSinkType::Stderr | DiagnosticSinkType::None, None) => Ok(()),
        }
    }
}

/// Diagnostic sink type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSinkType {
    /// Discard diagnostics.
    #[default]
    None,
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to a file.
    File,
}

// ============================================================================
// SECTION: Value Store
// ============================================================================

/// Persisted value store selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueStoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: ValueStoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for ValueStoreConfig {
    fn default() -> Self {
        Self {
            store_type: ValueStoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl ValueStoreConfig {
    /// Validates value store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            ValueStoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory value_store must not set path".to_string(),
                    ));
                }
                Ok(())
            }
            ValueStoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite value_store requires path".to_string())
                })?;
                validate_path_string("value_store.path", &path.to_string_lossy())
            }
        }
    }
}

/// Value store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueStoreType {
    /// Use the in-memory store.
    #[default]
    Memory,
    /// Use the `SQLite`-backed durable store.
    Sqlite,
}

/// Returns the default busy timeout for the value store.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates a debounce delay.
fn validate_debounce(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_DEBOUNCE_MS {
        return Err(ConfigError::Invalid(format!(
            "{field} out of range: {value} (expected 1..={MAX_DEBOUNCE_MS})"
        )));
    }
    Ok(())
}

/// Validates the config path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
