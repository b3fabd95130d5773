// crates/schema-form-core/src/defaults.rs
// ============================================================================
// Module: Default Value Resolver
// Description: Initial form values derived from schema defaults.
// Purpose: Seed the form-state container at session start.
// Dependencies: crate::{model, values}
// ============================================================================

//! ## Overview
//! Walks the field tree and collects every declared `defaultValue`. Groups
//! contribute a nested map only when at least one descendant has a default,
//! so empty groups never appear as `{}`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::model::FieldConfig;
use crate::model::FieldKind;
use crate::values::FormValue;
use crate::values::FormValues;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Builds the initial value map from field defaults.
#[must_use]
pub fn build_default_values(fields: &[FieldConfig]) -> FormValues {
    let mut values = FormValues::new();
    for field in fields {
        match &field.kind {
            FieldKind::Group {
                fields: children, ..
            } => {
                let nested = build_default_values(children);
                if !nested.is_empty() {
                    values.insert(field.id.clone(), FormValue::Group(nested));
                }
            }
            _ => {
                if let Some(default) = &field.default_value {
                    values.insert(field.id.clone(), FormValue::from(default));
                }
            }
        }
    }
    values
}

/// Merges saved session values over schema defaults.
///
/// The merge is shallow: a saved top-level key replaces the default for that
/// key entirely, including whole groups.
#[must_use]
pub fn merge_default_values(defaults: &FormValues, saved: Option<&FormValues>) -> FormValues {
    match saved {
        Some(saved) => defaults.merged_with(saved),
        None => defaults.clone(),
    }
}
