// crates/schema-form-core/tests/properties.rs
// ============================================================================
// Module: Schema Form Property Tests
// Description: Property-based checks over generated schemas and values.
// Purpose: Ensure round-trip, depth, default, and filter laws hold broadly.
// Dependencies: schema-form-core, proptest, serde_json
// ============================================================================

//! ## Overview
//! Generates field trees and value sets with proptest and checks the laws
//! the rule engine promises: validated schemas round-trip, the depth ceiling
//! is the only depth criterion, defaults never emit empty groups, and hidden
//! field filtering is idempotent.

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

use proptest::prelude::*;
use schema_form_core::FormValue;
use schema_form_core::FormValues;
use schema_form_core::MAX_GROUP_DEPTH;
use schema_form_core::SchemaIssueKind;
use schema_form_core::build_default_values;
use schema_form_core::filter_hidden_fields;
use schema_form_core::validate_form_schema;
use schema_form_core::validate_form_schema_object;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Generators
// ============================================================================

/// Generated field tree shape; ids are assigned when rendering.
#[derive(Debug, Clone)]
enum Node {
    /// Text field with an optional default.
    Text(Option<String>),
    /// Checkbox with an optional default.
    Checkbox(Option<bool>),
    /// Group with children.
    Group(Vec<Node>),
}

/// Strategy for field trees up to four group levels deep.
fn node_strategy() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        proptest::option::of("[a-z]{0,6}").prop_map(Node::Text),
        proptest::option::of(any::<bool>()).prop_map(Node::Checkbox),
    ];
    leaf.prop_recursive(4, 24, 4, |inner| {
        proptest::collection::vec(inner, 0 .. 4).prop_map(Node::Group)
    })
}

/// Renders sibling nodes as field declarations with unique ids.
fn render(nodes: &[Node]) -> Value {
    let fields: Vec<Value> = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let id = format!("f{index}");
            match node {
                Node::Text(default) => {
                    let mut field = json!({ "id": id, "label": "Text", "type": "text" });
                    if let Some(default) = default {
                        field["defaultValue"] = json!(default);
                    }
                    field
                }
                Node::Checkbox(default) => {
                    let mut field = json!({ "id": id, "label": "Check", "type": "checkbox" });
                    if let Some(default) = default {
                        field["defaultValue"] = json!(default);
                    }
                    field
                }
                Node::Group(children) => {
                    json!({ "id": id, "label": "Group", "type": "group", "fields": render(children) })
                }
            }
        })
        .collect();
    Value::Array(fields)
}

/// Returns true when any group in the value tree is empty.
fn has_empty_group(values: &FormValues) -> bool {
    values.iter().any(|(_, value)| match value {
        FormValue::Group(group) => group.is_empty() || has_empty_group(group),
        FormValue::Text(_) | FormValue::Flag(_) => false,
    })
}

/// Builds `depth` nested groups around a text field.
fn nested_groups(depth: usize) -> Value {
    let mut fields = json!([{ "id": "leaf", "label": "Leaf", "type": "text" }]);
    for _ in 0 .. depth {
        fields = json!([{ "id": "g", "label": "G", "type": "group", "fields": fields }]);
    }
    json!({ "title": "T", "fields": fields })
}

/// Schema whose visibility depends on other fields.
fn gated_schema() -> Value {
    json!({
        "title": "Gated",
        "fields": [
            { "id": "a", "label": "A", "type": "text" },
            { "id": "b", "label": "B", "type": "text",
              "visibility": { "conditions": [{ "field": "a", "operator": "in", "value": ["x", "y"] }] } },
            { "id": "c", "label": "C", "type": "checkbox" },
            { "id": "g", "label": "G", "type": "group",
              "visibility": { "conditions": [{ "field": "c", "operator": "equals", "value": true }] },
              "fields": [
                  { "id": "d", "label": "D", "type": "text" },
                  { "id": "e", "label": "E", "type": "text",
                    "visibility": { "conditions": [{ "field": "a", "operator": "contains", "value": "x" }] } },
              ] },
        ],
    })
}

/// Strategy for submissions against [`gated_schema`].
fn gated_values() -> impl Strategy<Value = FormValues> {
    (
        proptest::option::of(prop_oneof![Just("x"), Just("y"), Just("zx"), Just("q")]),
        proptest::option::of("[a-z]{0,3}"),
        proptest::option::of(any::<bool>()),
        proptest::option::of("[a-z]{0,3}"),
        proptest::option::of("[a-z]{0,3}"),
    )
        .prop_map(|(a, b, c, d, e)| {
            let mut values = FormValues::new();
            if let Some(a) = a {
                values.insert("a", a);
            }
            if let Some(b) = b {
                values.insert("b", b);
            }
            if let Some(c) = c {
                values.insert("c", c);
            }
            let mut group = FormValues::new();
            if let Some(d) = d {
                group.insert("d", d);
            }
            if let Some(e) = e {
                group.insert("e", e);
            }
            values.insert("g", group);
            values
        })
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    /// Validated schemas serialize back to the document they came from.
    #[test]
    fn valid_schemas_round_trip(nodes in proptest::collection::vec(node_strategy(), 0 .. 5)) {
        let document = json!({ "title": "Generated", "fields": render(&nodes) });
        let text = serde_json::to_string(&document).unwrap();
        let result = validate_form_schema(&text);
        prop_assert!(result.is_valid(), "errors: {:?}", result.errors());
        let schema = result.into_schema().unwrap();
        prop_assert_eq!(serde_json::to_value(&schema).unwrap(), document);
    }

    /// Depth alone decides acceptance of otherwise valid nesting, on both entry points.
    #[test]
    fn depth_law(depth in 0usize .. 90) {
        let document = nested_groups(depth);
        let text = serde_json::to_string(&document).unwrap();
        for result in [validate_form_schema_object(&document), validate_form_schema(&text)] {
            prop_assert_eq!(result.is_valid(), depth <= MAX_GROUP_DEPTH);
            if depth > MAX_GROUP_DEPTH {
                prop_assert_eq!(result.issue_kind(), Some(SchemaIssueKind::DepthExceeded));
            }
        }
    }

    /// Defaults never contain empty groups.
    #[test]
    fn defaults_omit_empty_groups(nodes in proptest::collection::vec(node_strategy(), 0 .. 5)) {
        let document = json!({ "title": "Generated", "fields": render(&nodes) });
        let schema = validate_form_schema_object(&document).into_schema().unwrap();
        let defaults = build_default_values(&schema.fields);
        prop_assert!(!has_empty_group(&defaults));
    }

    /// Filtering an already filtered submission changes nothing.
    #[test]
    fn filtering_is_idempotent(values in gated_values()) {
        let schema = validate_form_schema_object(&gated_schema()).into_schema().unwrap();
        let once = filter_hidden_fields(&schema.fields, &values);
        let twice = filter_hidden_fields(&schema.fields, &once);
        prop_assert_eq!(&once, &twice);
        prop_assert!(!has_empty_group(&once));
    }
}
