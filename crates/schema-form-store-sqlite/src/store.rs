// crates/schema-form-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Value Store
// Description: Durable ValueStore backed by SQLite.
// Purpose: Persist saved form values keyed by storage key.
// Dependencies: schema-form-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteValueStore`] keeps one row per storage key. Writes replace the
//! previous payload; payload size is capped before anything touches the
//! database. The schema version is recorded in `store_meta` and unknown
//! versions fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use schema_form_core::MAX_SAVED_VALUES_BYTES;
use schema_form_core::StoreError;
use schema_form_core::ValueStore;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Current on-disk schema version.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum storage key length in bytes.
pub const MAX_KEY_BYTES: usize = 512;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode.
    #[default]
    Full,
    /// Normal synchronous mode.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` value store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `max_payload_bytes` must be greater than zero.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Maximum stored payload size in bytes.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

impl SqliteStoreConfig {
    /// Returns a configuration with defaults for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            max_payload_bytes: MAX_SAVED_VALUES_BYTES,
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default maximum payload size.
const fn default_max_payload_bytes() -> usize {
    MAX_SAVED_VALUES_BYTES
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages never embed stored payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid configuration or key.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Payload exceeded the configured size limit.
    #[error("sqlite store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::TooLarge {
                ..
            }
            | SqliteStoreError::Invalid(_) => Self::Rejected(error.to_string()),
            SqliteStoreError::Db(_) | SqliteStoreError::VersionMismatch(_) => {
                Self::Store(error.to_string())
            }
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed value store.
///
/// # Invariants
/// - Connection access is serialized through a mutex.
/// - Stored payloads never exceed `max_payload_bytes`.
#[derive(Debug, Clone)]
pub struct SqliteValueStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteValueStore {
    /// Opens an `SQLite`-backed value store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the configuration is invalid or the
    /// database cannot be opened or initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        if config.max_payload_bytes == 0 {
            return Err(SqliteStoreError::Invalid(
                "max_payload_bytes must be greater than zero".to_string(),
            ));
        }
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Verifies the store can execute a simple SQL statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the mutex is poisoned or the query fails.
    pub fn readiness(&self) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard.execute_batch("SELECT 1").map_err(|err| SqliteStoreError::Db(err.to_string()))
    }

    /// Lists stored keys in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn keys(&self) -> Result<Vec<String>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare("SELECT storage_key FROM form_values ORDER BY storage_key")
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map(params![], |row| row.get::<_, String>(0))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(|err| SqliteStoreError::Db(err.to_string()))
    }

    /// Loads the payload stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the key is invalid, the query fails,
    /// or the stored payload exceeds the size limit.
    pub fn load(&self, key: &str) -> Result<Option<String>, SqliteStoreError> {
        validate_key(key)?;
        let guard = self.lock()?;
        let payload: Option<String> = guard
            .query_row(
                "SELECT payload FROM form_values WHERE storage_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        if let Some(payload) = &payload {
            self.ensure_within_limit(payload)?;
        }
        Ok(payload)
    }

    /// Stores `payload` under `key`, replacing any previous payload.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the key is invalid, the payload is
    /// too large, or the write fails.
    pub fn save(&self, key: &str, payload: &str) -> Result<(), SqliteStoreError> {
        validate_key(key)?;
        self.ensure_within_limit(payload)?;
        let size = i64::try_from(payload.len())
            .map_err(|_| SqliteStoreError::Invalid("payload length overflow".to_string()))?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO form_values (storage_key, payload, payload_size_bytes, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(storage_key) DO UPDATE SET
                     payload = excluded.payload,
                     payload_size_bytes = excluded.payload_size_bytes,
                     updated_at = excluded.updated_at",
                params![key, payload, size, unix_millis()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Deletes the payload stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the key is invalid or the delete fails.
    pub fn delete(&self, key: &str) -> Result<(), SqliteStoreError> {
        validate_key(key)?;
        let guard = self.lock()?;
        guard
            .execute("DELETE FROM form_values WHERE storage_key = ?1", params![key])
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Locks the connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))
    }

    /// Rejects payloads above the configured size limit.
    const fn ensure_within_limit(&self, payload: &str) -> Result<(), SqliteStoreError> {
        if payload.len() > self.config.max_payload_bytes {
            return Err(SqliteStoreError::TooLarge {
                max_bytes: self.config.max_payload_bytes,
                actual_bytes: payload.len(),
            });
        }
        Ok(())
    }
}

impl ValueStore for SqliteValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.load(key).map_err(StoreError::from)
    }

    fn set(&self, key: &str, payload: &str) -> Result<(), StoreError> {
        self.save(key, payload).map_err(StoreError::from)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.delete(key).map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates a storage key.
fn validate_key(key: &str) -> Result<(), SqliteStoreError> {
    if key.is_empty() {
        return Err(SqliteStoreError::Invalid("storage key must not be empty".to_string()));
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(SqliteStoreError::Invalid("storage key exceeds length limit".to_string()));
    }
    Ok(())
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    if path.display().to_string().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection and applies pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(connection)
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS form_values (
                    storage_key TEXT NOT NULL PRIMARY KEY,
                    payload TEXT NOT NULL,
                    payload_size_bytes INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                );",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Returns milliseconds since the Unix epoch.
fn unix_millis() -> i64 {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    i64::try_from(millis).unwrap_or(i64::MAX)
}
