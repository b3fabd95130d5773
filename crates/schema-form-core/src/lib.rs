// crates/schema-form-core/src/lib.rs
// ============================================================================
// Module: Schema Form Core Library
// Description: Public API surface for the schema-driven form rule engine.
// Purpose: Expose the schema model, validator, and value rule evaluators.
// Dependencies: crate::{model, schema, validator, values, defaults, visibility,
//               filter, rules, persistence}
// ============================================================================

//! ## Overview
//! Schema Form core decides what a form schema document means and what a
//! set of form values is allowed to contain. It validates schema documents
//! against a strict contract, derives initial values, evaluates visibility
//! conditions, strips hidden-field values before submission, and compiles
//! validation rules into per-field constraint sets.
//!
//! Every API in this crate is synchronous and side-effect free except the
//! [`ValueStore`] helpers, which only touch the store they are given.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod defaults;
pub mod filter;
pub mod model;
pub mod persistence;
pub mod rules;
pub mod schema;
pub mod validator;
pub mod values;
pub mod visibility;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use defaults::build_default_values;
pub use defaults::merge_default_values;
pub use filter::filter_hidden_fields;
pub use model::ApiIntegration;
pub use model::ComparisonOperator;
pub use model::ConditionValue;
pub use model::DEFAULT_DEBOUNCE_MS;
pub use model::DynamicValidationConfig;
pub use model::FieldConfig;
pub use model::FieldKind;
pub use model::FieldOption;
pub use model::FieldType;
pub use model::FormSchema;
pub use model::InputType;
pub use model::PatternRule;
pub use model::RuleCondition;
pub use model::ScalarValue;
pub use model::ValidationRule;
pub use model::VisibilityCondition;
pub use model::VisibilityRule;
pub use model::join_path;
pub use persistence::InMemoryValueStore;
pub use persistence::MAX_SAVED_VALUES_BYTES;
pub use persistence::PersistError;
pub use persistence::StoreError;
pub use persistence::ValueStore;
pub use persistence::clear_values;
pub use persistence::load_values;
pub use persistence::persist_values;
pub use rules::CompiledRules;
pub use rules::ConstraintSet;
pub use rules::DEFAULT_REQUIRED_MESSAGE;
pub use rules::FieldConstraints;
pub use rules::LengthConstraint;
pub use rules::PatternConstraint;
pub use rules::build_validation_rules;
pub use rules::compile_dynamic_validation;
pub use rules::referenced_fields;
pub use schema::form_schema_contract;
pub use validator::MAX_GROUP_DEPTH;
pub use validator::MAX_SCHEMA_BYTES;
pub use validator::SchemaIssueKind;
pub use validator::SchemaLimits;
pub use validator::SchemaValidationResult;
pub use validator::SchemaValidator;
pub use validator::ValidatorError;
pub use validator::validate_form_schema;
pub use validator::validate_form_schema_object;
pub use values::FormValue;
pub use values::FormValues;
pub use values::ValueSource;
pub use values::last_segment;
pub use values::validate_form_values;
pub use visibility::evaluate_condition;
pub use visibility::is_visible;
