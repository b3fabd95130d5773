// crates/schema-form-core/src/values.rs
// ============================================================================
// Module: Form Values
// Description: Value tree produced by user input and persisted between sessions.
// Purpose: Provide a typed string/boolean/group tree with dotted-path access.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Form values mirror the group structure of a form schema: every key is a
//! field id and every value is a string, a boolean, or a nested value map for
//! a group. Arrays and numbers never appear. Values are addressed by dotted
//! field paths such as `contactInfo.postalCode`.
//!
//! Security posture: value trees arrive from untrusted storage and user input;
//! [`validate_form_values`] bounds nesting with an explicit stack.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum nesting accepted by [`validate_form_values`].
pub const MAX_VALUE_NESTING: usize = 32;

/// Separator between field ids in a field path.
pub const PATH_SEPARATOR: char = '.';

// ============================================================================
// SECTION: Value Types
// ============================================================================

/// A single form value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    /// Text entered into a text-like, dropdown, or radio field.
    Text(String),
    /// Checkbox state.
    Flag(bool),
    /// Values of a group's children.
    Group(FormValues),
}

impl FormValue {
    /// Returns the text payload when this is a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Flag(_) | Self::Group(_) => None,
        }
    }

    /// Returns the flag payload when this is a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            Self::Text(_) | Self::Group(_) => None,
        }
    }

    /// Returns the nested map when this is a group value.
    #[must_use]
    pub const fn as_group(&self) -> Option<&FormValues> {
        match self {
            Self::Group(group) => Some(group),
            Self::Text(_) | Self::Flag(_) => None,
        }
    }

    /// Returns true for values that count as "not filled in".
    ///
    /// Empty text is blank. Booleans are never blank. Groups are blank when
    /// they have no entries.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Flag(_) => false,
            Self::Group(group) => group.is_empty(),
        }
    }

    /// Renders the value as a remote-call payload string.
    ///
    /// Booleans render as `true`/`false`; groups have no payload form.
    #[must_use]
    pub fn payload_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Flag(flag) => Some(flag.to_string()),
            Self::Group(_) => None,
        }
    }

    /// Converts the value into its JSON representation.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Flag(flag) => Value::Bool(*flag),
            Self::Group(group) => group.to_json(),
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FormValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<FormValues> for FormValue {
    fn from(value: FormValues) -> Self {
        Self::Group(value)
    }
}

/// Ordered map from field id to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<String, FormValue>);

impl FormValues {
    /// Creates an empty value map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the value stored directly under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FormValue> {
        self.0.get(id)
    }

    /// Inserts a value directly under `id`, returning the previous value.
    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<FormValue>) -> Option<FormValue> {
        self.0.insert(id.into(), value.into())
    }

    /// Removes the value stored directly under `id`.
    pub fn remove(&mut self, id: &str) -> Option<FormValue> {
        self.0.remove(id)
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, FormValue> {
        self.0.iter()
    }

    /// Returns true when the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Resolves a dotted field path through nested groups.
    ///
    /// Returns `None` when any segment is missing or an intermediate value is
    /// not a group.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&FormValue> {
        let mut segments = path.split(PATH_SEPARATOR);
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = current.as_group()?.0.get(segment)?;
        }
        Some(current)
    }

    /// Writes a value at a dotted field path, creating intermediate groups.
    ///
    /// A non-group value sitting where an intermediate group is needed is
    /// replaced by an empty group.
    pub fn set_path(&mut self, path: &str, value: FormValue) {
        let (parents, leaf) = match path.rsplit_once(PATH_SEPARATOR) {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, path),
        };
        let mut current = self;
        if let Some(parents) = parents {
            for segment in parents.split(PATH_SEPARATOR) {
                let slot = current
                    .0
                    .entry(segment.to_string())
                    .or_insert_with(|| FormValue::Group(Self::new()));
                if !matches!(slot, FormValue::Group(_)) {
                    *slot = FormValue::Group(Self::new());
                }
                current = match slot {
                    FormValue::Group(group) => group,
                    FormValue::Text(_) | FormValue::Flag(_) => return,
                };
            }
        }
        current.0.insert(leaf.to_string(), value);
    }

    /// Returns a shallow merge of `self` with `overrides`; override keys win.
    #[must_use]
    pub fn merged_with(&self, overrides: &Self) -> Self {
        let mut merged = self.clone();
        for (key, value) in overrides.iter() {
            merged.0.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Converts the map into a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> =
            self.0.iter().map(|(key, value)| (key.clone(), value.to_json())).collect();
        Value::Object(map)
    }
}

impl<K, V> FromIterator<(K, V)> for FormValues
where
    K: Into<String>,
    V: Into<FormValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
    }
}

impl<'a> IntoIterator for &'a FormValues {
    type IntoIter = btree_map::Iter<'a, String, FormValue>;
    type Item = (&'a String, &'a FormValue);

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ============================================================================
// SECTION: Value Sources
// ============================================================================

/// Resolves the current value of a field by dotted path.
///
/// Implemented by [`FormValues`] and by closures so visibility and rule
/// evaluation can read either a value snapshot or a live container.
pub trait ValueSource {
    /// Returns the current value at `path`, if any.
    fn lookup(&self, path: &str) -> Option<FormValue>;
}

impl ValueSource for FormValues {
    fn lookup(&self, path: &str) -> Option<FormValue> {
        self.get_path(path).cloned()
    }
}

impl<F> ValueSource for F
where
    F: Fn(&str) -> Option<FormValue>,
{
    fn lookup(&self, path: &str) -> Option<FormValue> {
        self(path)
    }
}

// ============================================================================
// SECTION: Shape Validation
// ============================================================================

/// Returns true when `value` has the shape of a form value tree.
///
/// The top level must be an object; every value must be a string, a boolean,
/// or a nested object of the same shape. Nesting beyond
/// [`MAX_VALUE_NESTING`] is rejected.
#[must_use]
pub fn validate_form_values(value: &Value) -> bool {
    let Value::Object(root) = value else {
        return false;
    };
    let mut stack: Vec<(&Map<String, Value>, usize)> = vec![(root, 1)];
    while let Some((object, depth)) = stack.pop() {
        if depth > MAX_VALUE_NESTING {
            return false;
        }
        for entry in object.values() {
            match entry {
                Value::String(_) | Value::Bool(_) => {}
                Value::Object(nested) => stack.push((nested, depth + 1)),
                Value::Null | Value::Number(_) | Value::Array(_) => return false,
            }
        }
    }
    true
}

/// Returns the final segment of a dotted field path.
#[must_use]
pub fn last_segment(path: &str) -> &str {
    path.rsplit(PATH_SEPARATOR).next().unwrap_or(path)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
