// crates/schema-form-core/src/validator.rs
// ============================================================================
// Module: Schema Validator
// Description: Size, parse, contract, uniqueness, and depth checks for schemas.
// Purpose: Turn untrusted schema documents into validated form schemas.
// Dependencies: jsonschema, serde_json, thiserror, crate::{model, schema}
// ============================================================================

//! ## Overview
//! [`SchemaValidator`] validates a raw schema document in a fixed order:
//! size ceiling, JSON parse, structural contract (all violations collected),
//! sibling id uniqueness, then group nesting depth. Document problems are
//! returned as a [`SchemaValidationResult`] value and never as `Err`.
//!
//! Security posture: schema documents are untrusted; the size ceiling is
//! enforced before parsing and nesting is walked with explicit stacks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::sync::OnceLock;

use jsonschema::Draft;
use jsonschema::Validator;
use serde_json::Value;
use thiserror::Error;

use crate::model::FieldConfig;
use crate::model::FormSchema;
use crate::schema::form_schema_contract;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum schema document size in bytes.
pub const MAX_SCHEMA_BYTES: usize = 5 * 1024 * 1024;

/// Maximum number of nested group levels.
pub const MAX_GROUP_DEPTH: usize = 10;

/// Maximum JSON nesting accepted by [`SchemaValidator`].
pub const MAX_JSON_NESTING: usize = 128;

/// Prefix marking a document that could not be parsed.
pub const INVALID_JSON_PREFIX: &str = "Invalid JSON: ";

/// Bytes per mebibyte, used for size messages.
const BYTES_PER_MIB: usize = 1024 * 1024;

/// Limits applied by a [`SchemaValidator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaLimits {
    /// Maximum document size in bytes.
    pub max_schema_bytes: usize,
    /// Maximum number of nested group levels.
    pub max_group_depth: usize,
}

impl Default for SchemaLimits {
    fn default() -> Self {
        Self {
            max_schema_bytes: MAX_SCHEMA_BYTES,
            max_group_depth: MAX_GROUP_DEPTH,
        }
    }
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// Classification of a rejected schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaIssueKind {
    /// The document is not parsable JSON.
    MalformedInput,
    /// The document exceeds the size ceiling.
    OversizedInput,
    /// The document violates the structural contract.
    SchemaViolation,
    /// Group nesting exceeds the depth ceiling.
    DepthExceeded,
}

impl SchemaIssueKind {
    /// Returns a stable label for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedInput => "malformed_input",
            Self::OversizedInput => "oversized_input",
            Self::SchemaViolation => "schema_violation",
            Self::DepthExceeded => "depth_exceeded",
        }
    }
}

impl fmt::Display for SchemaIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating a schema document.
///
/// # Invariants
/// - `schema` is present iff the result is valid.
/// - `issue_kind` is present iff the result is invalid.
/// - `errors` is empty iff the result is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaValidationResult {
    /// Error messages, each `"<path-or-/>: <reason>"` for contract violations.
    errors: Vec<String>,
    /// Validated schema.
    schema: Option<FormSchema>,
    /// Rejection classification.
    issue_kind: Option<SchemaIssueKind>,
}

impl SchemaValidationResult {
    /// Builds a valid result.
    const fn accepted(schema: FormSchema) -> Self {
        Self {
            errors: Vec::new(),
            schema: Some(schema),
            issue_kind: None,
        }
    }

    /// Builds an invalid result.
    const fn rejected(kind: SchemaIssueKind, errors: Vec<String>) -> Self {
        Self {
            errors,
            schema: None,
            issue_kind: Some(kind),
        }
    }

    /// Returns true when the document is a valid form schema.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.schema.is_some()
    }

    /// Returns every error message.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Returns the validated schema.
    #[must_use]
    pub const fn schema(&self) -> Option<&FormSchema> {
        self.schema.as_ref()
    }

    /// Consumes the result and returns the validated schema.
    #[must_use]
    pub fn into_schema(self) -> Option<FormSchema> {
        self.schema
    }

    /// Returns the rejection classification.
    #[must_use]
    pub const fn issue_kind(&self) -> Option<SchemaIssueKind> {
        self.issue_kind
    }

    /// Returns the parser message for malformed documents, without the prefix.
    #[must_use]
    pub fn parse_error(&self) -> Option<&str> {
        if self.issue_kind != Some(SchemaIssueKind::MalformedInput) {
            return None;
        }
        self.errors
            .first()
            .map(|error| error.strip_prefix(INVALID_JSON_PREFIX).unwrap_or(error.as_str()))
    }

    /// Returns errors for documents that parsed but were rejected.
    #[must_use]
    pub fn validation_errors(&self) -> &[String] {
        match self.issue_kind {
            Some(SchemaIssueKind::MalformedInput) | None => &[],
            Some(_) => &self.errors,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while constructing a validator.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// The structural contract failed to compile.
    #[error("form schema contract failed to compile: {0}")]
    Contract(String),
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Compiled form schema validator.
pub struct SchemaValidator {
    /// Compiled structural contract.
    contract: Validator,
    /// Size and depth limits.
    limits: SchemaLimits,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator").field("limits", &self.limits).finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Compiles the form schema contract with the given limits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::Contract`] when the contract cannot be compiled.
    pub fn new(limits: SchemaLimits) -> Result<Self, ValidatorError> {
        let contract = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&form_schema_contract())
            .map_err(|err| ValidatorError::Contract(err.to_string()))?;
        Ok(Self {
            contract,
            limits,
        })
    }

    /// Returns the configured limits.
    #[must_use]
    pub const fn limits(&self) -> SchemaLimits {
        self.limits
    }

    /// Validates a schema document given as JSON text.
    #[must_use]
    pub fn validate(&self, text: &str) -> SchemaValidationResult {
        if text.len() > self.limits.max_schema_bytes {
            return self.oversized();
        }
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(_) if text_nesting_reaches(text, MAX_JSON_NESTING) => return self.too_deep(),
            Err(err) => {
                return SchemaValidationResult::rejected(
                    SchemaIssueKind::MalformedInput,
                    vec![format!("{INVALID_JSON_PREFIX}{err}")],
                );
            }
        };
        self.validate_parsed(value)
    }

    /// Validates an already-parsed schema document.
    #[must_use]
    pub fn validate_object(&self, value: &Value) -> SchemaValidationResult {
        if serialized_len(value) > self.limits.max_schema_bytes {
            return self.oversized();
        }
        if json_nesting_exceeds(value, MAX_JSON_NESTING) {
            return self.too_deep();
        }
        self.validate_parsed(value.clone())
    }

    /// Runs contract, uniqueness, and depth checks on a parsed document.
    fn validate_parsed(&self, value: Value) -> SchemaValidationResult {
        let violations: Vec<String> = self
            .contract
            .iter_errors(&value)
            .map(|err| format_violation(err.instance_path().as_str(), &err.to_string()))
            .collect();
        if !violations.is_empty() {
            return SchemaValidationResult::rejected(SchemaIssueKind::SchemaViolation, violations);
        }

        let schema: FormSchema = match serde_json::from_value(value) {
            Ok(schema) => schema,
            Err(err) => {
                return SchemaValidationResult::rejected(
                    SchemaIssueKind::SchemaViolation,
                    vec![format_violation("", &err.to_string())],
                );
            }
        };

        let duplicates = duplicate_id_errors(&schema.fields);
        if !duplicates.is_empty() {
            return SchemaValidationResult::rejected(SchemaIssueKind::SchemaViolation, duplicates);
        }

        if group_depth_exceeds(&schema.fields, self.limits.max_group_depth) {
            return self.too_deep();
        }

        SchemaValidationResult::accepted(schema)
    }

    /// Builds the nesting-depth rejection.
    ///
    /// Documents too deep for the JSON parser share this rejection, so both
    /// entry points classify the same document identically.
    fn too_deep(&self) -> SchemaValidationResult {
        SchemaValidationResult::rejected(
            SchemaIssueKind::DepthExceeded,
            vec![format!(
                "Groups nested too deeply. Maximum depth is {}",
                self.limits.max_group_depth
            )],
        )
    }

    /// Builds the size-ceiling rejection.
    fn oversized(&self) -> SchemaValidationResult {
        let max = self.limits.max_schema_bytes;
        let limit = if max % BYTES_PER_MIB == 0 {
            format!("{}MB", max / BYTES_PER_MIB)
        } else {
            format!("{max} bytes")
        };
        SchemaValidationResult::rejected(
            SchemaIssueKind::OversizedInput,
            vec![format!("Schema exceeds maximum size of {limit}")],
        )
    }
}

// ============================================================================
// SECTION: Default Validator
// ============================================================================

/// Returns the shared validator compiled with default limits.
fn default_validator() -> Result<&'static SchemaValidator, ValidatorError> {
    static VALIDATOR: OnceLock<SchemaValidator> = OnceLock::new();
    if let Some(validator) = VALIDATOR.get() {
        return Ok(validator);
    }
    let validator = SchemaValidator::new(SchemaLimits::default())?;
    Ok(VALIDATOR.get_or_init(|| validator))
}

/// Validates a schema document with default limits.
#[must_use]
pub fn validate_form_schema(text: &str) -> SchemaValidationResult {
    match default_validator() {
        Ok(validator) => validator.validate(text),
        Err(err) => contract_failure(&err),
    }
}

/// Validates a parsed schema document with default limits.
#[must_use]
pub fn validate_form_schema_object(value: &Value) -> SchemaValidationResult {
    match default_validator() {
        Ok(validator) => validator.validate_object(value),
        Err(err) => contract_failure(&err),
    }
}

/// Folds a contract compilation failure into a rejected result.
fn contract_failure(err: &ValidatorError) -> SchemaValidationResult {
    SchemaValidationResult::rejected(
        SchemaIssueKind::SchemaViolation,
        vec![format_violation("", &err.to_string())],
    )
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Formats a violation as `"<path-or-/>: <message>"`.
fn format_violation(path: &str, message: &str) -> String {
    let path = if path.is_empty() { "/" } else { path };
    format!("{path}: {message}")
}

/// Byte counter used to size a document without buffering it.
struct ByteCounter(usize);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 = self.0.saturating_add(buf.len());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Returns the serialized byte length of a JSON value.
fn serialized_len(value: &Value) -> usize {
    let mut counter = ByteCounter(0);
    match serde_json::to_writer(&mut counter, value) {
        Ok(()) => counter.0,
        Err(_) => usize::MAX,
    }
}

/// Returns true when arrays/objects nest deeper than `max`.
fn json_nesting_exceeds(value: &Value, max: usize) -> bool {
    let mut stack: Vec<(&Value, usize)> = vec![(value, 0)];
    while let Some((current, depth)) = stack.pop() {
        let children: Box<dyn Iterator<Item = &Value>> = match current {
            Value::Array(items) => Box::new(items.iter()),
            Value::Object(map) => Box::new(map.values()),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => continue,
        };
        if depth + 1 > max {
            return true;
        }
        stack.extend(children.map(|child| (child, depth + 1)));
    }
    false
}

/// Returns true when the bracket nesting of raw JSON text reaches `limit`.
///
/// Brackets inside string literals are ignored. The text need not be valid.
fn text_nesting_reaches(text: &str, limit: usize) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for byte in text.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                if depth >= limit {
                    return true;
                }
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    false
}

/// Returns true when group nesting exceeds `max_depth`.
///
/// The top-level field list is depth zero; each group's children are one
/// level deeper than the group itself.
fn group_depth_exceeds(fields: &[FieldConfig], max_depth: usize) -> bool {
    let mut stack: Vec<(&[FieldConfig], usize)> = vec![(fields, 0)];
    while let Some((level, depth)) = stack.pop() {
        if depth > max_depth {
            return true;
        }
        for field in level {
            if let Some(children) = field.children() {
                stack.push((children, depth + 1));
            }
        }
    }
    false
}

/// Collects duplicate sibling id errors with JSON pointer paths, breadth first.
fn duplicate_id_errors(fields: &[FieldConfig]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut queue: VecDeque<(&[FieldConfig], String)> = VecDeque::new();
    queue.push_back((fields, "/fields".to_string()));
    while let Some((level, pointer)) = queue.pop_front() {
        let mut seen = BTreeSet::new();
        for (index, field) in level.iter().enumerate() {
            let field_pointer = format!("{pointer}/{index}");
            if !seen.insert(field.id.as_str()) {
                errors.push(format!("{field_pointer}/id: duplicate field id '{}'", field.id));
            }
            if let Some(children) = field.children() {
                queue.push_back((children, format!("{field_pointer}/fields")));
            }
        }
    }
    errors
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
