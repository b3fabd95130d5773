// crates/schema-form-core/src/model.rs
// ============================================================================
// Module: Form Schema Model
// Description: Typed form schema, field variants, rules, and integrations.
// Purpose: Provide the immutable data model produced by schema validation.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`FormSchema`] is a titled, ordered tree of [`FieldConfig`] entries.
//! Group fields nest further fields; every other variant is a leaf that owns
//! one value. Schemas are produced once by the schema validator and are not
//! mutated for the lifetime of a form session.
//!
//! The serde representation matches the JSON document format: camelCase keys
//! with the field variant selected by a `type` tag.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::values::FormValue;
use crate::values::PATH_SEPARATOR;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Debounce delay applied when an integration does not declare one.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Root form schema document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    /// Form title; never empty.
    pub title: String,
    /// Optional form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Top-level fields in display order.
    pub fields: Vec<FieldConfig>,
    /// Schema-level integrations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_integrations: Vec<ApiIntegration>,
}

impl FormSchema {
    /// Returns every integration declared by the schema.
    ///
    /// Schema-level integrations come first, followed by field-level
    /// integrations in depth-first display order.
    #[must_use]
    pub fn all_integrations(&self) -> Vec<ApiIntegration> {
        let mut integrations = self.api_integrations.clone();
        let mut stack: Vec<&FieldConfig> = self.fields.iter().rev().collect();
        while let Some(field) = stack.pop() {
            if let Some(integration) = &field.api_integration {
                integrations.push(integration.clone());
            }
            if let FieldKind::Group {
                fields, ..
            } = &field.kind
            {
                stack.extend(fields.iter().rev());
            }
        }
        integrations
    }
}

// ============================================================================
// SECTION: Fields
// ============================================================================

/// A single field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    /// Field id; one segment of the field path.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Variant-specific attributes, selected by the `type` tag.
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Placeholder text for leaf inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Initial value used when no saved value exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<ScalarValue>,
    /// Whether the input is read-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    /// Visibility gate for this field and its descendants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<VisibilityRule>,
    /// Static and conditional validation rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<Vec<ValidationRule>>,
    /// Field-level integration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_integration: Option<ApiIntegration>,
}

impl FieldConfig {
    /// Returns the field's type tag.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }

    /// Returns child fields for groups.
    #[must_use]
    pub fn children(&self) -> Option<&[FieldConfig]> {
        match &self.kind {
            FieldKind::Group {
                fields, ..
            } => Some(fields),
            _ => None,
        }
    }

    /// Returns the dynamic validation config for validated-text fields.
    #[must_use]
    pub const fn dynamic_validation(&self) -> Option<&DynamicValidationConfig> {
        match &self.kind {
            FieldKind::ValidatedText {
                dynamic_validation,
            } => dynamic_validation.as_ref(),
            _ => None,
        }
    }
}

/// Variant-specific field attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldKind {
    /// Single-line text input.
    Text {
        /// HTML-style input type hint.
        #[serde(rename = "inputType", default, skip_serializing_if = "Option::is_none")]
        input_type: Option<InputType>,
    },
    /// Multi-line text input.
    Textarea {
        /// Visible row count.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rows: Option<u64>,
    },
    /// Single choice from a drop-down list.
    Dropdown {
        /// Available choices; never empty.
        options: Vec<FieldOption>,
    },
    /// Boolean checkbox.
    Checkbox,
    /// Single choice from a radio list.
    Radio {
        /// Available choices; never empty.
        options: Vec<FieldOption>,
    },
    /// Text input with a pattern selected by another field's value.
    ValidatedText {
        /// Pattern rules keyed by the controlling field's value.
        #[serde(rename = "dynamicValidation", default, skip_serializing_if = "Option::is_none")]
        dynamic_validation: Option<DynamicValidationConfig>,
    },
    /// Container for nested fields.
    Group {
        /// Group description shown above the children.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        /// Child fields in display order.
        fields: Vec<FieldConfig>,
    },
}

impl FieldKind {
    /// Returns the type tag for this variant.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        match self {
            Self::Text {
                ..
            } => FieldType::Text,
            Self::Textarea {
                ..
            } => FieldType::Textarea,
            Self::Dropdown {
                ..
            } => FieldType::Dropdown,
            Self::Checkbox => FieldType::Checkbox,
            Self::Radio {
                ..
            } => FieldType::Radio,
            Self::ValidatedText {
                ..
            } => FieldType::ValidatedText,
            Self::Group {
                ..
            } => FieldType::Group,
        }
    }
}

/// Field type tags accepted by the schema contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    /// `text`
    Text,
    /// `textarea`
    Textarea,
    /// `dropdown`
    Dropdown,
    /// `checkbox`
    Checkbox,
    /// `radio`
    Radio,
    /// `validated-text`
    ValidatedText,
    /// `group`
    Group,
}

impl FieldType {
    /// Every field type in contract order.
    pub const ALL: [Self; 7] = [
        Self::Text,
        Self::Textarea,
        Self::Dropdown,
        Self::Checkbox,
        Self::Radio,
        Self::ValidatedText,
        Self::Group,
    ];

    /// Returns the wire tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Dropdown => "dropdown",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::ValidatedText => "validated-text",
            Self::Group => "group",
        }
    }
}

/// Input type hints for text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Plain text.
    Text,
    /// Masked password input.
    Password,
    /// Email address.
    Email,
    /// Telephone number.
    Tel,
    /// URL.
    Url,
    /// Numeric text.
    Number,
}

impl InputType {
    /// Every input type in contract order.
    pub const ALL: [Self; 6] =
        [Self::Text, Self::Password, Self::Email, Self::Tel, Self::Url, Self::Number];

    /// Returns the wire tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Password => "password",
            Self::Email => "email",
            Self::Tel => "tel",
            Self::Url => "url",
            Self::Number => "number",
        }
    }
}

/// Choice for dropdown and radio fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    /// Display label.
    pub label: String,
    /// Stored value.
    pub value: String,
}

// ============================================================================
// SECTION: Scalar Values
// ============================================================================

/// String or boolean literal used by defaults and rule conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    /// String literal.
    Text(String),
    /// Boolean literal.
    Flag(bool),
}

impl ScalarValue {
    /// Returns true when `value` is the same type and equal.
    #[must_use]
    pub fn matches(&self, value: &FormValue) -> bool {
        match (self, value) {
            (Self::Text(expected), FormValue::Text(actual)) => expected == actual,
            (Self::Flag(expected), FormValue::Flag(actual)) => expected == actual,
            _ => false,
        }
    }
}

impl From<&ScalarValue> for FormValue {
    fn from(value: &ScalarValue) -> Self {
        match value {
            ScalarValue::Text(text) => Self::Text(text.clone()),
            ScalarValue::Flag(flag) => Self::Flag(*flag),
        }
    }
}

// ============================================================================
// SECTION: Visibility
// ============================================================================

/// Conjunction of conditions gating a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityRule {
    /// Conditions that must all hold.
    pub conditions: Vec<VisibilityCondition>,
}

/// Single comparison against another field's current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityCondition {
    /// Dotted path of the observed field.
    pub field: String,
    /// Comparison operator.
    pub operator: ComparisonOperator,
    /// Comparison operand.
    pub value: ConditionValue,
}

/// Comparison operators for visibility conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonOperator {
    /// Strict equality.
    Equals,
    /// Strict inequality.
    NotEquals,
    /// Substring containment for strings.
    Contains,
    /// Membership in a string list.
    In,
    /// Operator not known to this version; evaluates as satisfied.
    #[serde(other)]
    Unrecognized,
}

/// Operand of a visibility condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    /// String operand.
    Text(String),
    /// Boolean operand.
    Flag(bool),
    /// List operand for `in`.
    List(Vec<String>),
}

// ============================================================================
// SECTION: Validation Rules
// ============================================================================

/// Validation rule declared on a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    /// Condition gating the rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<RuleCondition>,
    /// Regular expression the value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Message shown when the rule fails.
    pub message: String,
    /// Minimum length in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    /// Maximum length in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// Whether a value is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// Condition gating a validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCondition {
    /// Dotted path of the observed field.
    pub field: String,
    /// Value the observed field must equal.
    pub equals: ScalarValue,
}

/// Pattern rules for validated-text fields, keyed by another field's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicValidationConfig {
    /// Dotted path of the controlling field.
    pub depends_on: String,
    /// Pattern rule per controlling value.
    pub rules: BTreeMap<String, PatternRule>,
}

/// Pattern and message pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Regular expression the value must match.
    pub pattern: String,
    /// Message shown when the pattern fails.
    pub message: String,
}

// ============================================================================
// SECTION: Integrations
// ============================================================================

/// Source-fields to remote-lookup to target-fields wiring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIntegration {
    /// Endpoint name; checked against the allow-list before any call.
    pub endpoint: String,
    /// Dotted paths whose values form the call payload.
    pub source_fields: Vec<String>,
    /// Dotted paths written from the call result.
    pub target_fields: Vec<String>,
    /// Debounce delay in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
}

impl ApiIntegration {
    /// Returns the debounce delay, falling back to `default_ms` when unset or zero.
    #[must_use]
    pub fn effective_debounce_ms(&self, default_ms: u64) -> u64 {
        match self.debounce_ms {
            Some(ms) if ms > 0 => ms,
            _ => default_ms,
        }
    }
}

/// Joins a parent path and a field id.
#[must_use]
pub fn join_path(parent: &str, id: &str) -> String {
    if parent.is_empty() {
        id.to_string()
    } else {
        let mut path = String::with_capacity(parent.len() + 1 + id.len());
        path.push_str(parent);
        path.push(PATH_SEPARATOR);
        path.push_str(id);
        path
    }
}
