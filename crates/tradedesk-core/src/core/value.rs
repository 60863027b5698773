// crates/tradedesk-core/src/core/value.rs
// ============================================================================
// Module: Argument Values
// Description: Raw and typed argument values plus validated invocations.
// Purpose: Carry user input from the command surface to operation adapters.
// Dependencies: serde_json, time
// ============================================================================

//! ## Overview
//! [`RawArguments`] is what the command surface hands to the validator:
//! argument names mapped to the untyped strings the user typed. The
//! validator produces a [`ValidatedInvocation`] whose [`ArgValue`]s are
//! already coerced. Secret values are wrapped in [`SecretValue`] so they never
//! appear in `Debug` output or logs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde_json::Value;
use time::Date;

use crate::core::identifiers::OperationId;
use crate::core::segment::Period;
use crate::core::segment::format_date;

// ============================================================================
// SECTION: Raw Arguments
// ============================================================================

/// Untyped argument values keyed by argument name.
///
/// # Invariants
/// - A present switch is stored with an empty value list.
/// - An absent argument has no entry at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawArguments {
    /// Raw values by argument name.
    values: BTreeMap<String, Vec<String>>,
}

impl RawArguments {
    /// Creates an empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets all values for an argument, replacing earlier ones.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.values.insert(name.into(), values);
    }

    /// Appends a single value for an argument.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    /// Marks a switch as present.
    pub fn flag(&mut self, name: impl Into<String>) {
        self.values.entry(name.into()).or_default();
    }

    /// Builder form of [`RawArguments::push`].
    #[must_use]
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.push(name, value);
        self
    }

    /// Builder form of [`RawArguments::flag`].
    #[must_use]
    pub fn with_flag(mut self, name: &str) -> Self {
        self.flag(name);
        self
    }

    /// Returns the raw values for an argument.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.values.get(name).map(Vec::as_slice)
    }

    /// Returns true when the argument was supplied.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterates over supplied argument names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns true when no argument was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// SECTION: Typed Values
// ============================================================================

/// Secret string that never renders in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    /// Wraps a secret string.
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns the secret for transmission.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(<redacted>)")
    }
}

/// Typed argument value produced by validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Free text.
    Text(String),
    /// Signed integer.
    Integer(i64),
    /// Finite floating-point number.
    Float(f64),
    /// Switch presence.
    Bool(bool),
    /// Calendar date.
    Date(Date),
    /// Segmentation period.
    Period(Period),
    /// Local file path.
    Path(PathBuf),
    /// Password-bearing text.
    Secret(SecretValue),
    /// Ordered list of values from a repeated argument.
    List(Vec<ArgValue>),
}

impl ArgValue {
    /// Flattens the value into wire strings (lists expand, switches become `true`).
    #[must_use]
    pub fn to_wire_strings(&self) -> Vec<String> {
        match self {
            Self::Text(text) => vec![text.clone()],
            Self::Integer(value) => vec![value.to_string()],
            Self::Float(value) => vec![value.to_string()],
            Self::Bool(value) => vec![value.to_string()],
            Self::Date(date) => vec![format_date(*date)],
            Self::Period(period) => vec![period.to_string()],
            Self::Path(path) => vec![path.display().to_string()],
            Self::Secret(secret) => vec![secret.expose().to_string()],
            Self::List(values) => values.iter().flat_map(Self::to_wire_strings).collect(),
        }
    }

    /// Converts the value to JSON; secrets are redacted.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Integer(value) => Value::from(*value),
            Self::Float(value) => Value::from(*value),
            Self::Bool(value) => Value::Bool(*value),
            Self::Date(date) => Value::String(format_date(*date)),
            Self::Period(period) => Value::String(period.to_string()),
            Self::Path(path) => Value::String(path.display().to_string()),
            Self::Secret(_) => Value::String("<redacted>".to_string()),
            Self::List(values) => Value::Array(values.iter().map(Self::to_json).collect()),
        }
    }
}

// ============================================================================
// SECTION: Validated Invocation
// ============================================================================

/// Invocation whose arguments passed every descriptor constraint.
///
/// # Invariants
/// - Unset optional arguments are absent, never null-valued.
/// - No two present arguments belong to the same exclusive group.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInvocation {
    /// Target operation.
    pub operation: OperationId,
    /// Typed arguments by name.
    pub arguments: BTreeMap<String, ArgValue>,
}

impl ValidatedInvocation {
    /// Creates an invocation with no arguments.
    #[must_use]
    pub const fn new(operation: OperationId) -> Self {
        Self {
            operation,
            arguments: BTreeMap::new(),
        }
    }

    /// Builder that sets one argument.
    #[must_use]
    pub fn with(mut self, name: &str, value: ArgValue) -> Self {
        self.arguments.insert(name.to_string(), value);
        self
    }

    /// Returns the typed value of an argument.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.arguments.get(name)
    }

    /// Returns true when the argument is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.arguments.contains_key(name)
    }

    /// Returns a text argument.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.arguments.get(name) {
            Some(ArgValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Returns a date argument.
    #[must_use]
    pub fn date(&self, name: &str) -> Option<Date> {
        match self.arguments.get(name) {
            Some(ArgValue::Date(date)) => Some(*date),
            _ => None,
        }
    }

    /// Returns a path argument.
    #[must_use]
    pub fn path(&self, name: &str) -> Option<&PathBuf> {
        match self.arguments.get(name) {
            Some(ArgValue::Path(path)) => Some(path),
            _ => None,
        }
    }

    /// Returns a period argument.
    #[must_use]
    pub fn period(&self, name: &str) -> Option<Period> {
        match self.arguments.get(name) {
            Some(ArgValue::Period(period)) => Some(*period),
            _ => None,
        }
    }

    /// Returns true when a switch is present and set.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.arguments.get(name), Some(ArgValue::Bool(true)))
    }

    /// Returns the wire strings of an argument (empty when absent).
    #[must_use]
    pub fn strings(&self, name: &str) -> Vec<String> {
        self.arguments.get(name).map(ArgValue::to_wire_strings).unwrap_or_default()
    }

    /// Inserts or replaces an argument.
    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.arguments.insert(name.into(), value);
    }

    /// Removes an argument, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<ArgValue> {
        self.arguments.remove(name)
    }

    /// Returns the names of the present arguments.
    #[must_use]
    pub fn argument_names(&self) -> Vec<String> {
        self.arguments.keys().cloned().collect()
    }
}
