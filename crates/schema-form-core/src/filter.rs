// crates/schema-form-core/src/filter.rs
// ============================================================================
// Module: Hidden Field Filter
// Description: Removal of values belonging to hidden fields before submit.
// Purpose: Guarantee submitted values only contain visible fields.
// Dependencies: crate::{model, values, visibility}
// ============================================================================

//! ## Overview
//! Walks the schema tree alongside the submitted value tree. Visibility is
//! always evaluated against the full submitted tree, so conditions may refer
//! to fields anywhere in the form. A hidden group drops every descendant
//! value; a visible group whose filtered result is empty is omitted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::model::FieldConfig;
use crate::model::FieldKind;
use crate::values::FormValue;
use crate::values::FormValues;
use crate::visibility::is_visible;

// ============================================================================
// SECTION: Filtering
// ============================================================================

/// Returns `values` with every hidden field's value removed.
#[must_use]
pub fn filter_hidden_fields(fields: &[FieldConfig], values: &FormValues) -> FormValues {
    filter_level(fields, values, values)
}

/// Filters one level of the field tree.
///
/// `level` is the value map at this level of nesting; `root` is the full
/// submitted tree used for visibility lookups.
fn filter_level(fields: &[FieldConfig], level: &FormValues, root: &FormValues) -> FormValues {
    let mut result = FormValues::new();
    for field in fields {
        if !is_visible(field.visibility.as_ref(), root) {
            continue;
        }
        let current = level.get(&field.id);
        match &field.kind {
            FieldKind::Group {
                fields: children, ..
            } => {
                let Some(FormValue::Group(nested)) = current else {
                    continue;
                };
                let filtered = filter_level(children, nested, root);
                if !filtered.is_empty() {
                    result.insert(field.id.clone(), FormValue::Group(filtered));
                }
            }
            _ => {
                if let Some(value) = current {
                    result.insert(field.id.clone(), value.clone());
                }
            }
        }
    }
    result
}
