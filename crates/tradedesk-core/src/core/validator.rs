// crates/tradedesk-core/src/core/validator.rs
// ============================================================================
// Module: Argument Validator
// Description: Generic validation of raw arguments against a descriptor.
// Purpose: Reject bad input locally, before any remote interaction.
// Dependencies: thiserror, crate::core::{descriptor, value, segment}
// ============================================================================

//! ## Overview
//! [`validate`] is pure: it inspects a [`CommandDescriptor`] and
//! [`RawArguments`] and returns a [`ValidatedInvocation`] or the first
//! [`ValidationError`]. Checks run in a fixed order so the reported error is
//! deterministic:
//! 1. unknown argument names
//! 2. exclusive groups
//! 3. missing required arguments
//! 4. per argument, in declaration order: arity, choice set, coercion
//!
//! Choice membership is checked on the raw string before coercion, so a
//! partially typed invalid value never exists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::descriptor::ArgumentSpec;
use crate::core::descriptor::Arity;
use crate::core::descriptor::CommandDescriptor;
use crate::core::descriptor::ValueType;
use crate::core::error::ErrorKind;
use crate::core::error::Failure;
use crate::core::segment::Period;
use crate::core::segment::parse_date;
use crate::core::value::ArgValue;
use crate::core::value::RawArguments;
use crate::core::value::SecretValue;
use crate::core::value::ValidatedInvocation;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Argument validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The argument is not declared by the command.
    #[error("{command}: unknown argument '{argument}'")]
    UnknownArgument {
        /// Command name.
        command: String,
        /// Offending argument name.
        argument: String,
    },
    /// A required argument was not supplied.
    #[error("{command}: missing required argument {argument}")]
    MissingArgument {
        /// Command name.
        command: String,
        /// Display name of the missing argument.
        argument: String,
    },
    /// A value failed arity, choice, or type checks.
    #[error("invalid value '{value}' for {argument}: expected {expected}")]
    InvalidArgumentValue {
        /// Display name of the argument.
        argument: String,
        /// Offending raw value (redacted for secrets).
        value: String,
        /// Expected type, arity, or choice set.
        expected: String,
    },
    /// Two or more members of one exclusive group were supplied.
    #[error("arguments {} are mutually exclusive (group '{group}')", arguments.join(", "))]
    ConflictingArguments {
        /// Group name.
        group: String,
        /// Display names of the conflicting members, in declaration order.
        arguments: Vec<String>,
    },
}

impl ValidationError {
    /// Returns the error kind for exit-code mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownArgument {
                ..
            } => ErrorKind::UnknownArgument,
            Self::MissingArgument {
                ..
            } => ErrorKind::MissingArgument,
            Self::InvalidArgumentValue {
                ..
            } => ErrorKind::InvalidArgumentValue,
            Self::ConflictingArguments {
                ..
            } => ErrorKind::ConflictingArguments,
        }
    }
}

impl From<ValidationError> for Failure {
    fn from(error: ValidationError) -> Self {
        Self::new(error.kind(), error.to_string())
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates raw arguments against a command descriptor.
///
/// # Errors
///
/// Returns the first [`ValidationError`] in check order.
pub fn validate(
    descriptor: &CommandDescriptor,
    raw: &RawArguments,
) -> Result<ValidatedInvocation, ValidationError> {
    for name in raw.names() {
        if descriptor.find_argument(name).is_none() {
            return Err(ValidationError::UnknownArgument {
                command: descriptor.name.clone(),
                argument: name.to_string(),
            });
        }
    }

    for group in &descriptor.exclusive_groups {
        let present: Vec<String> = descriptor
            .arguments
            .iter()
            .filter(|spec| group.members.contains(&spec.name) && raw.contains(&spec.name))
            .map(ArgumentSpec::display_name)
            .collect();
        if present.len() > 1 {
            return Err(ValidationError::ConflictingArguments {
                group: group.name.clone(),
                arguments: present,
            });
        }
    }

    for spec in &descriptor.arguments {
        if spec.is_required() && !raw.contains(&spec.name) {
            return Err(ValidationError::MissingArgument {
                command: descriptor.name.clone(),
                argument: spec.display_name(),
            });
        }
    }

    let mut arguments = BTreeMap::new();
    for spec in &descriptor.arguments {
        let value = match raw.get(&spec.name) {
            Some(values) => coerce_argument(spec, values)?,
            None => match &spec.default {
                Some(default) => coerce_argument(spec, std::slice::from_ref(default))?,
                None => None,
            },
        };
        if let Some(value) = value {
            arguments.insert(spec.name.clone(), value);
        }
    }

    Ok(ValidatedInvocation {
        operation: descriptor.operation.clone(),
        arguments,
    })
}

/// Applies arity, choice, and type checks to one supplied argument.
fn coerce_argument(
    spec: &ArgumentSpec,
    values: &[String],
) -> Result<Option<ArgValue>, ValidationError> {
    if spec.value_type == ValueType::Switch {
        if let Some(value) = values.first() {
            return Err(invalid(spec, value, ValueType::Switch.describe()));
        }
        return Ok(Some(ArgValue::Bool(true)));
    }

    match spec.arity {
        Arity::One | Arity::ZeroOrOne => {
            if values.len() > 1 {
                return Err(invalid(spec, &values.join(" "), "a single value"));
            }
            let Some(value) = values.first() else {
                if spec.arity == Arity::ZeroOrOne {
                    return Ok(None);
                }
                return Err(invalid(spec, "", "a value"));
            };
            coerce_value(spec, value).map(Some)
        }
        Arity::Many | Arity::AtLeastOne => {
            if spec.arity == Arity::AtLeastOne && values.is_empty() {
                return Err(invalid(spec, "", "at least one value"));
            }
            let items =
                values.iter().map(|value| coerce_value(spec, value)).collect::<Result<_, _>>()?;
            Ok(Some(ArgValue::List(items)))
        }
    }
}

/// Checks the choice set, then coerces one raw value.
fn coerce_value(spec: &ArgumentSpec, value: &str) -> Result<ArgValue, ValidationError> {
    if let Some(choices) = &spec.choices
        && !choices.iter().any(|choice| choice == value)
    {
        return Err(invalid(spec, value, &format!("one of: {}", choices.join(", "))));
    }
    if spec.secret {
        return Ok(ArgValue::Secret(SecretValue::new(value.to_string())));
    }
    let expected = spec.value_type.describe();
    match spec.value_type {
        ValueType::Text => Ok(ArgValue::Text(value.to_string())),
        ValueType::Integer => value
            .trim()
            .parse::<i64>()
            .map(ArgValue::Integer)
            .map_err(|_| invalid(spec, value, expected)),
        ValueType::Float => match value.trim().parse::<f64>() {
            Ok(number) if number.is_finite() => Ok(ArgValue::Float(number)),
            _ => Err(invalid(spec, value, expected)),
        },
        ValueType::Date => {
            parse_date(value).map(ArgValue::Date).map_err(|_| invalid(spec, value, expected))
        }
        ValueType::Period => value
            .parse::<Period>()
            .map(ArgValue::Period)
            .map_err(|err| invalid(spec, value, &err.to_string())),
        ValueType::Path => {
            if value.trim().is_empty() {
                return Err(invalid(spec, value, expected));
            }
            Ok(ArgValue::Path(PathBuf::from(value)))
        }
        ValueType::Switch => Err(invalid(spec, value, expected)),
    }
}

/// Builds an [`ValidationError::InvalidArgumentValue`].
fn invalid(spec: &ArgumentSpec, value: &str, expected: &str) -> ValidationError {
    ValidationError::InvalidArgumentValue {
        argument: spec.display_name(),
        value: if spec.secret { "<redacted>".to_string() } else { value.to_string() },
        expected: expected.to_string(),
    }
}
