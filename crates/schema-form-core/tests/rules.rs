// crates/schema-form-core/tests/rules.rs
// ============================================================================
// Module: Validation Rule Compiler Tests
// Description: Validate static, conditional, and dynamic rule compilation.
// Purpose: Ensure constraint folding, gating, and checking behave predictably.
// Dependencies: schema-form-core
// ============================================================================

//! ## Overview
//! Covers last-write-wins folding, silent dropping of malformed patterns,
//! `when` gating, dynamic pattern selection, value-reactive refresh, and the
//! ordered constraint check.

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

use std::collections::BTreeMap;

use schema_form_core::DEFAULT_REQUIRED_MESSAGE;
use schema_form_core::DynamicValidationConfig;
use schema_form_core::FieldConstraints;
use schema_form_core::FormValue;
use schema_form_core::FormValues;
use schema_form_core::PatternRule;
use schema_form_core::RuleCondition;
use schema_form_core::ScalarValue;
use schema_form_core::ValidationRule;
use schema_form_core::build_validation_rules;
use schema_form_core::compile_dynamic_validation;
use schema_form_core::referenced_fields;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a rule with only a message.
fn rule(message: &str) -> ValidationRule {
    ValidationRule {
        message: message.to_string(),
        ..ValidationRule::default()
    }
}

/// Builds a dynamic config keyed on `docType`.
fn document_rules() -> DynamicValidationConfig {
    let mut rules = BTreeMap::new();
    rules.insert(
        "EGN".to_string(),
        PatternRule {
            pattern: r"^\d{10}$".to_string(),
            message: "EGN must be 10 digits".to_string(),
        },
    );
    rules.insert(
        "PASSPORT".to_string(),
        PatternRule {
            pattern: r"^\d{9}$".to_string(),
            message: "Passport must be 9 digits".to_string(),
        },
    );
    DynamicValidationConfig {
        depends_on: "docType".to_string(),
        rules,
    }
}

/// Builds a text value.
fn text(value: &str) -> FormValue {
    FormValue::from(value)
}

// ============================================================================
// SECTION: Static Compilation
// ============================================================================

/// Required rules set the message and the required flag.
#[test]
fn required_sets_flag_and_message() {
    let rules = vec![ValidationRule {
        required: Some(true),
        ..rule("Name is required")
    }];
    let compiled = build_validation_rules(Some(rules.as_slice()));
    assert!(compiled.is_required);
    assert_eq!(compiled.rules.required.as_deref(), Some("Name is required"));
}

/// Required rules without a message fall back to the default message.
#[test]
fn required_without_message_uses_default() {
    let rules = vec![ValidationRule {
        required: Some(true),
        ..rule("")
    }];
    let compiled = build_validation_rules(Some(rules.as_slice()));
    assert_eq!(compiled.rules.required.as_deref(), Some(DEFAULT_REQUIRED_MESSAGE));
}

/// Later rules of the same kind replace earlier ones.
#[test]
fn same_kind_is_last_write_wins() {
    let rules = vec![
        ValidationRule {
            max_length: Some(5),
            ..rule("at most five")
        },
        ValidationRule {
            max_length: Some(50),
            ..rule("at most fifty")
        },
    ];
    let compiled = build_validation_rules(Some(rules.as_slice()));
    let max = compiled.rules.max_length.unwrap();
    assert_eq!(max.value, 50);
    assert_eq!(max.message, "at most fifty");
    assert!(!compiled.is_required);
}

/// Malformed patterns are dropped and earlier valid patterns survive.
#[test]
fn malformed_pattern_is_ignored() {
    let rules = vec![
        ValidationRule {
            pattern: Some("^[a-z]+$".to_string()),
            ..rule("letters")
        },
        ValidationRule {
            pattern: Some("([unclosed".to_string()),
            ..rule("broken")
        },
    ];
    let compiled = build_validation_rules(Some(rules.as_slice()));
    let pattern = compiled.rules.pattern.unwrap();
    assert_eq!(pattern.regex.as_str(), "^[a-z]+$");
    assert_eq!(pattern.message, "letters");
}

/// Zero lengths, empty patterns, and `required: false` add nothing.
#[test]
fn falsy_attributes_add_nothing() {
    let rules = vec![ValidationRule {
        min_length: Some(0),
        pattern: Some(String::new()),
        required: Some(false),
        ..rule("m")
    }];
    let compiled = build_validation_rules(Some(rules.as_slice()));
    assert!(compiled.rules.is_empty());
    assert!(build_validation_rules(None).rules.is_empty());
}

// ============================================================================
// SECTION: Conditional And Dynamic Compilation
// ============================================================================

/// `when` rules apply only while the referenced value matches strictly.
#[test]
fn when_rules_are_gated() {
    let rules = vec![ValidationRule {
        when: Some(RuleCondition {
            field: "hasCompany".to_string(),
            equals: ScalarValue::Flag(true),
        }),
        required: Some(true),
        ..rule("EIK is required for companies")
    }];
    let on: FormValues = [("hasCompany", true)].into_iter().collect();
    let off: FormValues = [("hasCompany", false)].into_iter().collect();
    let text_true: FormValues = [("hasCompany", "true")].into_iter().collect();
    assert!(compile_dynamic_validation(&rules, None, &on).required.is_some());
    assert!(compile_dynamic_validation(&rules, None, &off).is_empty());
    assert!(compile_dynamic_validation(&rules, None, &text_true).is_empty());
    assert!(compile_dynamic_validation(&rules, None, &FormValues::new()).is_empty());
}

/// The dynamic config selects one pattern by the controlling value.
#[test]
fn dynamic_pattern_follows_controlling_value() {
    let dynamic = document_rules();
    let static_rules = vec![ValidationRule {
        pattern: Some("^.*$".to_string()),
        ..rule("anything")
    }];
    let egn: FormValues = [("docType", "EGN")].into_iter().collect();
    let compiled = compile_dynamic_validation(&static_rules, Some(&dynamic), &egn);
    assert_eq!(compiled.pattern.unwrap().message, "EGN must be 10 digits");

    let unknown: FormValues = [("docType", "OTHER")].into_iter().collect();
    let compiled = compile_dynamic_validation(&static_rules, Some(&dynamic), &unknown);
    assert_eq!(compiled.pattern.unwrap().message, "anything");

    let flag: FormValues = [("docType", true)].into_iter().collect();
    let compiled = compile_dynamic_validation(&[], Some(&dynamic), &flag);
    assert!(compiled.pattern.is_none());
}

/// Referenced fields are distinct and in first-seen order.
#[test]
fn referenced_fields_are_distinct() {
    let gate = |field: &str| ValidationRule {
        when: Some(RuleCondition {
            field: field.to_string(),
            equals: ScalarValue::Text("x".to_string()),
        }),
        ..rule("m")
    };
    let rules = vec![gate("b"), gate("a"), gate("b"), rule("plain")];
    let dynamic = document_rules();
    assert_eq!(
        referenced_fields(&rules, Some(&dynamic)),
        vec!["b".to_string(), "a".to_string(), "docType".to_string()]
    );
}

/// Constraints recompute only when a referenced value changes.
#[test]
fn field_constraints_refresh_on_referenced_change() {
    let mut values: FormValues = [("docType", "EGN"), ("other", "1")].into_iter().collect();
    let mut constraints = FieldConstraints::new(Vec::new(), Some(document_rules()), &values);
    assert_eq!(constraints.referenced(), ["docType".to_string()]);
    assert_eq!(constraints.constraints().pattern.as_ref().unwrap().regex.as_str(), r"^\d{10}$");

    values.insert("other", "2");
    assert!(!constraints.refresh(&values));

    values.insert("docType", "PASSPORT");
    assert!(constraints.refresh(&values));
    assert_eq!(constraints.constraints().pattern.as_ref().unwrap().regex.as_str(), r"^\d{9}$");
}

// ============================================================================
// SECTION: Constraint Checks
// ============================================================================

/// Checks run in order and report the first failing message.
#[test]
fn check_reports_first_violation() {
    let rules = vec![
        ValidationRule {
            required: Some(true),
            ..rule("required")
        },
        ValidationRule {
            min_length: Some(3),
            ..rule("too short")
        },
        ValidationRule {
            max_length: Some(5),
            ..rule("too long")
        },
        ValidationRule {
            pattern: Some("^[a-z]+$".to_string()),
            ..rule("letters only")
        },
    ];
    let set = build_validation_rules(Some(rules.as_slice())).rules;
    assert_eq!(set.check(None), Some("required"));
    assert_eq!(set.check(Some(&text(""))), Some("required"));
    assert_eq!(set.check(Some(&text("ab"))), Some("too short"));
    assert_eq!(set.check(Some(&text("abcdef"))), Some("too long"));
    assert_eq!(set.check(Some(&text("ab1"))), Some("letters only"));
    assert_eq!(set.check(Some(&text("abc"))), None);
}

/// Length counts characters, and optional empty values skip other checks.
#[test]
fn check_counts_chars_and_skips_empty_optional() {
    let rules = vec![ValidationRule {
        max_length: Some(5),
        ..rule("too long")
    }];
    let set = build_validation_rules(Some(rules.as_slice())).rules;
    assert_eq!(set.check(Some(&text("София"))), None);
    assert_eq!(set.check(Some(&text(""))), None);
    assert_eq!(set.check(None), None);
}

/// Booleans satisfy required only when true.
#[test]
fn check_required_checkbox() {
    let rules = vec![ValidationRule {
        required: Some(true),
        ..rule("must agree")
    }];
    let set = build_validation_rules(Some(rules.as_slice())).rules;
    assert_eq!(set.check(Some(&FormValue::Flag(false))), Some("must agree"));
    assert_eq!(set.check(Some(&FormValue::Flag(true))), None);
}
