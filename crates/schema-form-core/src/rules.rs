// crates/schema-form-core/src/rules.rs
// ============================================================================
// Module: Validation Rule Compiler
// Description: Compilation of static, conditional, and dynamic field rules.
// Purpose: Produce the active constraint set for a field's value snapshot.
// Dependencies: regex, crate::{model, values}
// ============================================================================

//! ## Overview
//! Validation rules are folded in declaration order into a [`ConstraintSet`]
//! with one slot per constraint kind (required, minimum length, maximum
//! length, pattern). A later rule of the same kind replaces an earlier one.
//! Conditional rules apply only while their `when` field equals the declared
//! value; a validated-text field's dynamic config selects at most one
//! pattern by the current value of its controlling field.
//!
//! Patterns that fail to compile are dropped without surfacing an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use regex::Regex;

use crate::model::DynamicValidationConfig;
use crate::model::FieldConfig;
use crate::model::ValidationRule;
use crate::values::FormValue;
use crate::values::ValueSource;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message used for required constraints that declare no message.
pub const DEFAULT_REQUIRED_MESSAGE: &str = "This field is required";

// ============================================================================
// SECTION: Constraint Types
// ============================================================================

/// Length bound with its failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthConstraint {
    /// Bound in Unicode scalar values.
    pub value: u64,
    /// Failure message.
    pub message: String,
}

/// Compiled pattern with its failure message.
#[derive(Debug, Clone)]
pub struct PatternConstraint {
    /// Compiled regular expression.
    pub regex: Regex,
    /// Failure message.
    pub message: String,
}

impl PartialEq for PatternConstraint {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str() && self.message == other.message
    }
}

impl Eq for PatternConstraint {}

/// Active constraints for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    /// Required constraint message.
    pub required: Option<String>,
    /// Minimum length constraint.
    pub min_length: Option<LengthConstraint>,
    /// Maximum length constraint.
    pub max_length: Option<LengthConstraint>,
    /// Pattern constraint.
    pub pattern: Option<PatternConstraint>,
}

impl ConstraintSet {
    /// Returns true when no constraint is active.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.required.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
    }

    /// Folds one rule into the set.
    fn apply(&mut self, rule: &ValidationRule) {
        if rule.required == Some(true) {
            let message = if rule.message.is_empty() {
                DEFAULT_REQUIRED_MESSAGE.to_string()
            } else {
                rule.message.clone()
            };
            self.required = Some(message);
        }
        if let Some(value) = rule.min_length.filter(|value| *value > 0) {
            self.min_length = Some(LengthConstraint {
                value,
                message: rule.message.clone(),
            });
        }
        if let Some(value) = rule.max_length.filter(|value| *value > 0) {
            self.max_length = Some(LengthConstraint {
                value,
                message: rule.message.clone(),
            });
        }
        if let Some(pattern) = rule.pattern.as_deref() {
            self.set_pattern(pattern, &rule.message);
        }
    }

    /// Replaces the pattern constraint when `pattern` compiles.
    fn set_pattern(&mut self, pattern: &str, message: &str) {
        if pattern.is_empty() {
            return;
        }
        if let Ok(regex) = Regex::new(pattern) {
            self.pattern = Some(PatternConstraint {
                regex,
                message: message.to_string(),
            });
        }
    }

    /// Checks a candidate value and returns the first violated message.
    ///
    /// Constraints are checked in the order required, minimum length, maximum
    /// length, pattern. An absent value or empty text only fails `required`;
    /// a boolean satisfies `required` only when true. Length and pattern
    /// checks apply to text values only.
    #[must_use]
    pub fn check(&self, value: Option<&FormValue>) -> Option<&str> {
        if let Some(message) = &self.required {
            let filled = match value {
                Some(FormValue::Text(text)) => !text.is_empty(),
                Some(FormValue::Flag(flag)) => *flag,
                Some(FormValue::Group(group)) => !group.is_empty(),
                None => false,
            };
            if !filled {
                return Some(message.as_str());
            }
        }
        let Some(FormValue::Text(text)) = value else {
            return None;
        };
        if text.is_empty() {
            return None;
        }
        let length = u64::try_from(text.chars().count()).unwrap_or(u64::MAX);
        if let Some(min) = &self.min_length
            && length < min.value
        {
            return Some(min.message.as_str());
        }
        if let Some(max) = &self.max_length
            && length > max.value
        {
            return Some(max.message.as_str());
        }
        if let Some(pattern) = &self.pattern
            && !pattern.regex.is_match(text)
        {
            return Some(pattern.message.as_str());
        }
        None
    }
}

/// Static compilation output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledRules {
    /// Compiled constraints.
    pub rules: ConstraintSet,
    /// Whether any rule marks the field as required.
    pub is_required: bool,
}

// ============================================================================
// SECTION: Compilation
// ============================================================================

/// Compiles a field's rules without evaluating `when` conditions.
#[must_use]
pub fn build_validation_rules(rules: Option<&[ValidationRule]>) -> CompiledRules {
    let mut compiled = CompiledRules::default();
    for rule in rules.unwrap_or_default() {
        compiled.rules.apply(rule);
        if rule.required == Some(true) {
            compiled.is_required = true;
        }
    }
    compiled
}

/// Compiles a field's rules against current values.
///
/// Rules with a `when` clause apply only while the named field strictly
/// equals `when.equals`. The dynamic config, when present and its controlling
/// field holds a non-empty text key found in its rule map, replaces the
/// pattern constraint.
#[must_use]
pub fn compile_dynamic_validation<S>(
    rules: &[ValidationRule],
    dynamic: Option<&DynamicValidationConfig>,
    values: &S,
) -> ConstraintSet
where
    S: ValueSource + ?Sized,
{
    let mut constraints = ConstraintSet::default();
    for rule in rules {
        if let Some(condition) = &rule.when {
            let observed = values.lookup(&condition.field);
            if !observed.is_some_and(|value| condition.equals.matches(&value)) {
                continue;
            }
        }
        constraints.apply(rule);
    }
    if let Some(dynamic) = dynamic
        && let Some(FormValue::Text(key)) = values.lookup(&dynamic.depends_on)
        && !key.is_empty()
        && let Some(rule) = dynamic.rules.get(&key)
    {
        constraints.set_pattern(&rule.pattern, &rule.message);
    }
    constraints
}

/// Returns the distinct fields a rule set depends on, in first-seen order.
#[must_use]
pub fn referenced_fields(
    rules: &[ValidationRule],
    dynamic: Option<&DynamicValidationConfig>,
) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    let conditional = rules.iter().filter_map(|rule| rule.when.as_ref()).map(|when| &when.field);
    let controlling = dynamic.map(|dynamic| &dynamic.depends_on);
    for field in conditional.chain(controlling) {
        if !field.is_empty() && !fields.contains(field) {
            fields.push(field.clone());
        }
    }
    fields
}

// ============================================================================
// SECTION: Field Constraints
// ============================================================================

/// Value-reactive constraint holder for one field.
///
/// # Invariants
/// - `constraints` reflects the referenced values captured in `observed`.
#[derive(Debug, Clone)]
pub struct FieldConstraints {
    /// Static and conditional rules.
    rules: Vec<ValidationRule>,
    /// Dynamic pattern config.
    dynamic: Option<DynamicValidationConfig>,
    /// Fields whose values affect the constraint set.
    referenced: Vec<String>,
    /// Referenced values used for the current constraint set.
    observed: BTreeMap<String, Option<FormValue>>,
    /// Current constraint set.
    constraints: ConstraintSet,
}

impl FieldConstraints {
    /// Creates a holder and compiles it against `values`.
    #[must_use]
    pub fn new<S>(
        rules: Vec<ValidationRule>,
        dynamic: Option<DynamicValidationConfig>,
        values: &S,
    ) -> Self
    where
        S: ValueSource + ?Sized,
    {
        let referenced = referenced_fields(&rules, dynamic.as_ref());
        let observed = snapshot(&referenced, values);
        let constraints = compile_dynamic_validation(&rules, dynamic.as_ref(), values);
        Self {
            rules,
            dynamic,
            referenced,
            observed,
            constraints,
        }
    }

    /// Creates a holder from a field declaration.
    #[must_use]
    pub fn from_field<S>(field: &FieldConfig, values: &S) -> Self
    where
        S: ValueSource + ?Sized,
    {
        Self::new(
            field.validations.clone().unwrap_or_default(),
            field.dynamic_validation().cloned(),
            values,
        )
    }

    /// Recompiles when any referenced value changed; returns true if it did.
    pub fn refresh<S>(&mut self, values: &S) -> bool
    where
        S: ValueSource + ?Sized,
    {
        let observed = snapshot(&self.referenced, values);
        if observed == self.observed {
            return false;
        }
        self.constraints =
            compile_dynamic_validation(&self.rules, self.dynamic.as_ref(), values);
        self.observed = observed;
        true
    }

    /// Returns the current constraint set.
    #[must_use]
    pub const fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// Returns the fields whose values affect the constraint set.
    #[must_use]
    pub fn referenced(&self) -> &[String] {
        &self.referenced
    }
}

/// Captures the current value of each referenced field.
fn snapshot<S>(fields: &[String], values: &S) -> BTreeMap<String, Option<FormValue>>
where
    S: ValueSource + ?Sized,
{
    fields.iter().map(|field| (field.clone(), values.lookup(field))).collect()
}
