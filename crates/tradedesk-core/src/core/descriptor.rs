// crates/tradedesk-core/src/core/descriptor.rs
// ============================================================================
// Module: Command Descriptors
// Description: Declarative argument specs and leaf command descriptors.
// Purpose: Describe every command as data so one validator serves them all.
// Dependencies: thiserror, crate::core::identifiers
// ============================================================================

//! ## Overview
//! A [`CommandDescriptor`] is an immutable, declarative leaf: a name, help
//! text, ordered [`ArgumentSpec`]s, mutually exclusive groups, and the
//! [`OperationId`] it dispatches to. Choice sets and exclusivity are data
//! here rather than per-command code, so the generic validator enforces them
//! uniformly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::OperationId;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Internal inconsistencies found by [`CommandDescriptor::check`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// An argument was declared without a name.
    #[error("argument names must be non-empty")]
    EmptyArgumentName,
    /// Two arguments share a name.
    #[error("duplicate argument '{0}'")]
    DuplicateArgument(String),
    /// A switch was declared positional or multi-valued.
    #[error("switch '{0}' must be an optional flag")]
    MisplacedSwitch(String),
    /// A secret's prompt trigger names no declared argument.
    #[error("prompt trigger '{trigger}' of '{argument}' is undeclared")]
    UndeclaredTrigger {
        /// Argument carrying the trigger.
        argument: String,
        /// Missing trigger name.
        trigger: String,
    },
    /// An optional or repeated positional precedes another positional.
    #[error("positional '{0}' must be last when it is optional or repeated")]
    PositionalNotLast(String),
    /// An exclusive group has fewer than two members.
    #[error("exclusive group '{0}' needs two members")]
    UndersizedGroup(String),
    /// An exclusive group names no declared argument.
    #[error("exclusive group '{group}' names undeclared argument '{member}'")]
    UndeclaredGroupMember {
        /// Group name.
        group: String,
        /// Missing member name.
        member: String,
    },
}

// ============================================================================
// SECTION: Argument Specs
// ============================================================================

/// Whether an argument is positional or a named flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentKind {
    /// Supplied by position.
    Positional,
    /// Supplied as `--flag-name`.
    Optional,
}

/// Number of values an argument accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exactly one value (required when positional).
    One,
    /// Zero or one value.
    ZeroOrOne,
    /// Any number of values.
    Many,
    /// One or more values.
    AtLeastOne,
}

impl Arity {
    /// Returns true when the arity yields a list value.
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(self, Self::Many | Self::AtLeastOne)
    }
}

/// Type coercion applied to raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Free text.
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// Finite floating-point number.
    Float,
    /// `YYYY-MM-DD` calendar date.
    Date,
    /// Segmentation period (`A`, `2A`, `Q`, `6M`, ...).
    Period,
    /// Local file path.
    Path,
    /// Presence flag without a value.
    Switch,
}

impl ValueType {
    /// Returns a human-readable description used in error messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "an integer",
            Self::Float => "a number",
            Self::Date => "a YYYY-MM-DD date",
            Self::Period => "a period such as A, 2A, Q, 6M, W, or D",
            Self::Path => "a file path",
            Self::Switch => "no value",
        }
    }
}

/// Declarative specification of one argument.
///
/// # Invariants
/// - `name` is snake_case and unique within its command.
/// - Switches are always optional with arity [`Arity::ZeroOrOne`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSpec {
    /// Argument name; also the field name on the wire.
    pub name: String,
    /// Positional or optional.
    pub kind: ArgumentKind,
    /// Accepted value count.
    pub arity: Arity,
    /// Value coercion.
    pub value_type: ValueType,
    /// Allowed raw values, checked before coercion.
    pub choices: Option<Vec<String>>,
    /// Optional single-character alias.
    pub short: Option<char>,
    /// Help text.
    pub help: String,
    /// Placeholder shown in usage output.
    pub value_name: Option<String>,
    /// Raw default applied when the argument is omitted.
    pub default: Option<String>,
    /// True for password-bearing values.
    pub secret: bool,
    /// Argument whose presence triggers a masked prompt for this secret.
    pub prompt_when: Option<String>,
}

impl ArgumentSpec {
    /// Shared constructor.
    fn base(name: &str, kind: ArgumentKind, arity: Arity, help: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            arity,
            value_type: if kind == ArgumentKind::Optional && arity == Arity::ZeroOrOne {
                ValueType::Switch
            } else {
                ValueType::Text
            },
            choices: None,
            short: None,
            help: help.to_string(),
            value_name: None,
            default: None,
            secret: false,
            prompt_when: None,
        }
    }

    /// Required single-valued positional argument.
    #[must_use]
    pub fn positional(name: &str, help: &str) -> Self {
        Self::base(name, ArgumentKind::Positional, Arity::One, help)
    }

    /// Single-valued optional flag (`--name VALUE`).
    #[must_use]
    pub fn option(name: &str, help: &str) -> Self {
        Self::base(name, ArgumentKind::Optional, Arity::One, help)
    }

    /// Presence-only flag (`--name`).
    #[must_use]
    pub fn switch(name: &str, help: &str) -> Self {
        Self::base(name, ArgumentKind::Optional, Arity::ZeroOrOne, help)
    }

    /// Accepts any number of values.
    #[must_use]
    pub const fn many(mut self) -> Self {
        self.arity = Arity::Many;
        self
    }

    /// Accepts one or more values.
    #[must_use]
    pub const fn at_least_one(mut self) -> Self {
        self.arity = Arity::AtLeastOne;
        self
    }

    /// Makes a positional argument optional.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.arity = Arity::ZeroOrOne;
        self
    }

    /// Sets the value coercion.
    #[must_use]
    pub const fn typed(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Restricts raw values to a choice set.
    #[must_use]
    pub fn choices(mut self, choices: &[&str]) -> Self {
        self.choices = Some(choices.iter().map(|choice| (*choice).to_string()).collect());
        self
    }

    /// Adds a short alias.
    #[must_use]
    pub const fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Sets the usage placeholder.
    #[must_use]
    pub fn value_name(mut self, value_name: &str) -> Self {
        self.value_name = Some(value_name.to_string());
        self
    }

    /// Sets a raw default value.
    #[must_use]
    pub fn default_value(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    /// Marks the argument as a secret, prompted for when `trigger` is present.
    #[must_use]
    pub fn secret_prompted_by(mut self, trigger: &str) -> Self {
        self.secret = true;
        self.prompt_when = Some(trigger.to_string());
        self
    }

    /// Returns the long flag spelling (`start_date` becomes `start-date`).
    #[must_use]
    pub fn flag_name(&self) -> String {
        self.name.replace('_', "-")
    }

    /// Returns the name as shown to users in messages.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.kind {
            ArgumentKind::Positional => self
                .value_name
                .clone()
                .unwrap_or_else(|| self.name.to_ascii_uppercase()),
            ArgumentKind::Optional => format!("--{}", self.flag_name()),
        }
    }

    /// Returns true when the argument must be supplied.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.kind == ArgumentKind::Positional
            && matches!(self.arity, Arity::One | Arity::AtLeastOne)
            && self.default.is_none()
    }
}

// ============================================================================
// SECTION: Exclusive Groups
// ============================================================================

/// Set of arguments of which at most one may be supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusiveGroup {
    /// Group name used in conflict messages.
    pub name: String,
    /// Member argument names.
    pub members: Vec<String>,
}

// ============================================================================
// SECTION: Command Descriptors
// ============================================================================

/// Immutable declarative description of one leaf command.
///
/// # Invariants
/// - Every leaf has exactly one target operation.
/// - Exclusive-group members name declared arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Command name, unique among siblings.
    pub name: String,
    /// Help text.
    pub help: String,
    /// Ordered argument specs.
    pub arguments: Vec<ArgumentSpec>,
    /// Mutually exclusive argument groups.
    pub exclusive_groups: Vec<ExclusiveGroup>,
    /// Target operation, resolved lazily through the operation table.
    pub operation: OperationId,
}

impl CommandDescriptor {
    /// Creates a descriptor with no arguments.
    #[must_use]
    pub fn new(name: &str, help: &str, operation: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            arguments: Vec::new(),
            exclusive_groups: Vec::new(),
            operation: OperationId::new(operation),
        }
    }

    /// Appends an argument spec.
    #[must_use]
    pub fn argument(mut self, spec: ArgumentSpec) -> Self {
        self.arguments.push(spec);
        self
    }

    /// Declares a mutually exclusive group.
    #[must_use]
    pub fn exclusive(mut self, name: &str, members: &[&str]) -> Self {
        self.exclusive_groups.push(ExclusiveGroup {
            name: name.to_string(),
            members: members.iter().map(|member| (*member).to_string()).collect(),
        });
        self
    }

    /// Looks up an argument spec by name.
    #[must_use]
    pub fn find_argument(&self, name: &str) -> Option<&ArgumentSpec> {
        self.arguments.iter().find(|spec| spec.name == name)
    }

    /// Returns the positional arguments in declaration order.
    pub fn positionals(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.arguments.iter().filter(|spec| spec.kind == ArgumentKind::Positional)
    }

    /// Checks internal consistency of the descriptor.
    ///
    /// # Errors
    ///
    /// Returns the first [`DescriptorError`] found.
    pub fn check(&self) -> Result<(), DescriptorError> {
        for (index, spec) in self.arguments.iter().enumerate() {
            if spec.name.is_empty() {
                return Err(DescriptorError::EmptyArgumentName);
            }
            if self.arguments[.. index].iter().any(|other| other.name == spec.name) {
                return Err(DescriptorError::DuplicateArgument(spec.name.clone()));
            }
            if spec.value_type == ValueType::Switch
                && (spec.kind == ArgumentKind::Positional || spec.arity != Arity::ZeroOrOne)
            {
                return Err(DescriptorError::MisplacedSwitch(spec.name.clone()));
            }
            if let Some(trigger) = &spec.prompt_when
                && self.find_argument(trigger).is_none()
            {
                return Err(DescriptorError::UndeclaredTrigger {
                    argument: spec.name.clone(),
                    trigger: trigger.clone(),
                });
            }
        }
        let positionals: Vec<&ArgumentSpec> = self.positionals().collect();
        for (index, spec) in positionals.iter().enumerate() {
            let is_last = index + 1 == positionals.len();
            if !is_last && spec.arity != Arity::One {
                return Err(DescriptorError::PositionalNotLast(spec.name.clone()));
            }
        }
        for group in &self.exclusive_groups {
            if group.members.len() < 2 {
                return Err(DescriptorError::UndersizedGroup(group.name.clone()));
            }
            if let Some(member) =
                group.members.iter().find(|member| self.find_argument(member).is_none())
            {
                return Err(DescriptorError::UndeclaredGroupMember {
                    group: group.name.clone(),
                    member: member.clone(),
                });
            }
        }
        Ok(())
    }
}
