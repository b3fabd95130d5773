// crates/schema-form-core/src/validator/tests.rs
// ============================================================================
// Module: Schema Validator Unit Tests
// Description: Unit tests for depth walking, sizing, and error formatting.
// Purpose: Validate private helpers behind the schema validator.
// Dependencies: schema-form-core
// ============================================================================

//! ## Overview
//! Exercises the explicit-stack walkers and message helpers used by the
//! schema validator without going through the full contract.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

use super::duplicate_id_errors;
use super::format_violation;
use super::group_depth_exceeds;
use super::json_nesting_exceeds;
use super::serialized_len;
use super::text_nesting_reaches;
use crate::model::FieldConfig;
use crate::model::FieldKind;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds a text field with the given id.
fn text_field(id: &str) -> FieldConfig {
    FieldConfig {
        id: id.to_string(),
        label: id.to_string(),
        kind: FieldKind::Text {
            input_type: None,
        },
        placeholder: None,
        default_value: None,
        disabled: None,
        visibility: None,
        validations: None,
        api_integration: None,
    }
}

/// Builds a group field with the given children.
fn group_field(id: &str, fields: Vec<FieldConfig>) -> FieldConfig {
    FieldConfig {
        kind: FieldKind::Group {
            description: None,
            fields,
        },
        ..text_field(id)
    }
}

/// Builds `depth` nested groups around a single text field.
fn nested_groups(depth: usize) -> Vec<FieldConfig> {
    let mut fields = vec![text_field("leaf")];
    for level in 0 .. depth {
        fields = vec![group_field(&format!("g{level}"), fields)];
    }
    fields
}

// ============================================================================
// SECTION: Depth Tests
// ============================================================================

#[test]
fn group_depth_at_limit_is_accepted() {
    assert!(!group_depth_exceeds(&nested_groups(10), 10));
}

#[test]
fn group_depth_past_limit_is_rejected() {
    assert!(group_depth_exceeds(&nested_groups(11), 10));
}

#[test]
fn empty_group_still_counts_as_a_level() {
    let mut fields = vec![group_field("innermost", Vec::new())];
    for level in 0 .. 10 {
        fields = vec![group_field(&format!("g{level}"), fields)];
    }
    assert!(group_depth_exceeds(&fields, 10));
}

#[test]
fn json_nesting_counts_arrays_and_objects() {
    let mut value = json!("leaf");
    for _ in 0 .. 4 {
        value = Value::Array(vec![json!({ "inner": value })]);
    }
    assert!(!json_nesting_exceeds(&value, 8));
    assert!(json_nesting_exceeds(&value, 7));
}

#[test]
fn text_nesting_ignores_brackets_in_strings() {
    assert!(text_nesting_reaches("[[[", 3));
    assert!(!text_nesting_reaches("[[]]", 3));
    assert!(!text_nesting_reaches(r#"["[[[[", "\"[[["]"#, 2));
    assert!(text_nesting_reaches(r#"{"a":[{"b":"]]]"}]}"#, 3));
}

// ============================================================================
// SECTION: Helper Tests
// ============================================================================

#[test]
fn duplicate_ids_reported_per_sibling_list() {
    let fields = vec![
        text_field("a"),
        group_field("g", vec![text_field("a"), text_field("b"), text_field("b")]),
        text_field("a"),
    ];
    let errors = duplicate_id_errors(&fields);
    assert_eq!(
        errors,
        vec![
            "/fields/2/id: duplicate field id 'a'".to_string(),
            "/fields/1/fields/2/id: duplicate field id 'b'".to_string(),
        ]
    );
}

#[test]
fn violation_uses_slash_for_root_path() {
    assert_eq!(format_violation("", "oops"), "/: oops");
    assert_eq!(format_violation("/fields/0", "oops"), "/fields/0: oops");
}

#[test]
fn serialized_len_matches_compact_encoding() {
    let value = json!({ "title": "T", "fields": [] });
    let expected = serde_json::to_string(&value).unwrap().len();
    assert_eq!(serialized_len(&value), expected);
}
