// crates/schema-form-core/src/schema.rs
// ============================================================================
// Module: Form Schema Contract
// Description: JSON Schema (draft 2020-12) describing form schema documents.
// Purpose: Provide the structural contract enforced by the schema validator.
// Dependencies: serde_json, crate::model
// ============================================================================

//! ## Overview
//! The contract is a single JSON Schema document with one reusable
//! `$defs/fieldConfig` definition that recurses for group children. Unknown
//! keys are rejected at every level so typos surface as errors instead of
//! being ignored. Variant-specific keys are gated on the `type` tag with
//! `if`/`then` clauses.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::model::FieldType;
use crate::model::InputType;

// ============================================================================
// SECTION: Contract
// ============================================================================

/// JSON Schema dialect used by the contract.
pub const CONTRACT_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Returns the form schema contract as a JSON Schema document.
#[must_use]
pub fn form_schema_contract() -> Value {
    json!({
        "$schema": CONTRACT_DIALECT,
        "title": "Form Schema",
        "type": "object",
        "$defs": {
            "fieldConfig": field_config_schema(),
        },
        "properties": {
            "title": { "type": "string", "minLength": 1 },
            "description": { "type": "string" },
            "fields": {
                "type": "array",
                "items": { "$ref": "#/$defs/fieldConfig" },
            },
            "apiIntegrations": {
                "type": "array",
                "items": api_integration_schema(),
            },
        },
        "required": ["title", "fields"],
        "additionalProperties": false,
    })
}

/// Schema for a single field declaration.
fn field_config_schema() -> Value {
    let field_types: Vec<&str> = FieldType::ALL.iter().map(|kind| kind.as_str()).collect();
    let input_types: Vec<&str> = InputType::ALL.iter().map(|kind| kind.as_str()).collect();
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "string", "minLength": 1, "pattern": "^[^.]+$" },
            "label": { "type": "string" },
            "type": { "type": "string", "enum": field_types },
            "placeholder": { "type": "string" },
            "defaultValue": { "type": ["string", "boolean"] },
            "disabled": { "type": "boolean" },
            "visibility": visibility_schema(),
            "validations": {
                "type": "array",
                "items": validation_rule_schema(),
            },
            "apiIntegration": api_integration_schema(),
            "inputType": { "type": "string", "enum": input_types },
            "rows": non_negative_integer(),
            "options": {
                "type": "array",
                "items": field_option_schema(),
            },
            "description": { "type": "string" },
            "fields": {
                "type": "array",
                "items": { "$ref": "#/$defs/fieldConfig" },
            },
            "dynamicValidation": dynamic_validation_schema(),
        },
        "required": ["id", "label", "type"],
        "additionalProperties": false,
        "allOf": variant_constraints(),
    })
}

/// Per-variant constraints keyed on the `type` tag.
fn variant_constraints() -> Value {
    json!([
        when_type(&["group"], json!({
            "required": ["fields"],
            "properties": {
                "placeholder": false,
                "defaultValue": false,
                "validations": false,
                "apiIntegration": false,
            },
        })),
        when_type(&["dropdown", "radio"], json!({
            "required": ["options"],
            "properties": { "options": { "minItems": 1 } },
        })),
        when_type(&["checkbox"], json!({
            "properties": { "defaultValue": { "type": "boolean" } },
        })),
        when_type(&["text", "textarea", "dropdown", "radio", "validated-text"], json!({
            "properties": { "defaultValue": { "type": "string" } },
        })),
        unless_type(&["dropdown", "radio"], "options"),
        unless_type(&["textarea"], "rows"),
        unless_type(&["text"], "inputType"),
        unless_type(&["validated-text"], "dynamicValidation"),
        unless_type(&["group"], "fields"),
        unless_type(&["group"], "description"),
    ])
}

/// Applies `then` when the field's type is one of `types`.
fn when_type(types: &[&str], then: Value) -> Value {
    json!({
        "if": {
            "properties": { "type": { "enum": types } },
            "required": ["type"],
        },
        "then": then,
    })
}

/// Forbids `key` unless the field's type is one of `types`.
fn unless_type(types: &[&str], key: &str) -> Value {
    json!({
        "if": {
            "properties": { "type": { "not": { "enum": types } } },
            "required": ["type"],
        },
        "then": {
            "properties": { key: false },
        },
    })
}

/// Schema for dropdown and radio choices.
fn field_option_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "label": { "type": "string" },
            "value": { "type": "string" },
        },
        "required": ["label", "value"],
        "additionalProperties": false,
    })
}

/// Schema for visibility rules.
fn visibility_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "conditions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "field": { "type": "string" },
                        "operator": {
                            "type": "string",
                            "enum": ["equals", "notEquals", "contains", "in"],
                        },
                        "value": {
                            "oneOf": [
                                { "type": "string" },
                                { "type": "boolean" },
                                { "type": "array", "items": { "type": "string" } },
                            ],
                        },
                    },
                    "required": ["field", "operator", "value"],
                    "additionalProperties": false,
                },
            },
        },
        "required": ["conditions"],
        "additionalProperties": false,
    })
}

/// Schema for validation rules.
fn validation_rule_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "when": {
                "type": "object",
                "properties": {
                    "field": { "type": "string" },
                    "equals": { "type": ["string", "boolean"] },
                },
                "required": ["field", "equals"],
                "additionalProperties": false,
            },
            "pattern": { "type": "string" },
            "message": { "type": "string" },
            "minLength": non_negative_integer(),
            "maxLength": non_negative_integer(),
            "required": { "type": "boolean" },
        },
        "required": ["message"],
        "additionalProperties": false,
    })
}

/// Schema for validated-text dynamic validation.
fn dynamic_validation_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "dependsOn": { "type": "string" },
            "rules": {
                "type": "object",
                "additionalProperties": {
                    "type": "object",
                    "properties": {
                        "pattern": { "type": "string" },
                        "message": { "type": "string" },
                    },
                    "required": ["pattern", "message"],
                    "additionalProperties": false,
                },
            },
        },
        "required": ["dependsOn", "rules"],
        "additionalProperties": false,
    })
}

/// Schema for schema-level and field-level integrations.
fn api_integration_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "endpoint": { "type": "string" },
            "sourceFields": { "type": "array", "items": { "type": "string" } },
            "targetFields": { "type": "array", "items": { "type": "string" } },
            "debounceMs": non_negative_integer(),
        },
        "required": ["endpoint", "sourceFields", "targetFields"],
        "additionalProperties": false,
    })
}

/// Schema for non-negative integer attributes.
fn non_negative_integer() -> Value {
    json!({ "type": "integer", "minimum": 0 })
}
