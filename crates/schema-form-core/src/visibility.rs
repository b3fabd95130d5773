// crates/schema-form-core/src/visibility.rs
// ============================================================================
// Module: Visibility Evaluator
// Description: Evaluation of field visibility rules against current values.
// Purpose: Decide whether a field is shown for a given value snapshot.
// Dependencies: crate::{model, values}
// ============================================================================

//! ## Overview
//! A visibility rule is a conjunction of conditions over other fields'
//! current values. Comparisons are strictly typed: a string never equals a
//! boolean and a group value never equals anything. Unknown operators are
//! treated as satisfied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::model::ComparisonOperator;
use crate::model::ConditionValue;
use crate::model::VisibilityCondition;
use crate::model::VisibilityRule;
use crate::values::FormValue;
use crate::values::ValueSource;

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Returns true when the field governed by `rule` is visible.
///
/// An absent rule or an empty condition list is always visible.
#[must_use]
pub fn is_visible<S>(rule: Option<&VisibilityRule>, values: &S) -> bool
where
    S: ValueSource + ?Sized,
{
    let Some(rule) = rule else {
        return true;
    };
    rule.conditions
        .iter()
        .all(|condition| evaluate_condition(condition, values.lookup(&condition.field).as_ref()))
}

/// Evaluates one condition against the observed value of its field.
#[must_use]
pub fn evaluate_condition(condition: &VisibilityCondition, observed: Option<&FormValue>) -> bool {
    match condition.operator {
        ComparisonOperator::Equals => values_equal(&condition.value, observed),
        ComparisonOperator::NotEquals => !values_equal(&condition.value, observed),
        ComparisonOperator::Contains => match (&condition.value, observed) {
            (ConditionValue::Text(needle), Some(FormValue::Text(haystack))) => {
                haystack.contains(needle.as_str())
            }
            _ => false,
        },
        ComparisonOperator::In => match (&condition.value, observed) {
            (ConditionValue::List(candidates), Some(FormValue::Text(text))) => {
                candidates.iter().any(|candidate| candidate == text)
            }
            _ => false,
        },
        ComparisonOperator::Unrecognized => true,
    }
}

/// Strict typed equality between an operand and an observed value.
fn values_equal(expected: &ConditionValue, observed: Option<&FormValue>) -> bool {
    match (expected, observed) {
        (ConditionValue::Text(expected), Some(FormValue::Text(actual))) => expected == actual,
        (ConditionValue::Flag(expected), Some(FormValue::Flag(actual))) => expected == actual,
        _ => false,
    }
}
