// crates/tradedesk-cli/src/surface.rs
// ============================================================================
// Module: Command-Line Surface
// Description: Builds the clap command tree from the command registry.
// Purpose: Parse argv into a command path and raw arguments.
// Dependencies: clap, tradedesk-core
// ============================================================================

//! ## Overview
//! The clap tree mirrors the registry one-to-one: groups become subcommands
//! that require a child, leaves become subcommands whose flags map 1:1 to
//! argument specs. clap only splits argv; required arguments, choice sets,
//! coercion, and exclusive groups are left to the core validator so every
//! command reports them the same way.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Args;
use clap::Command;
use clap::FromArgMatches;
use clap::error::ErrorKind as ClapErrorKind;
use clap::parser::ValueSource;
use tradedesk_core::ArgumentKind;
use tradedesk_core::ArgumentSpec;
use tradedesk_core::Arity;
use tradedesk_core::CommandDescriptor;
use tradedesk_core::CommandNode;
use tradedesk_core::CommandRegistry;
use tradedesk_core::ErrorKind;
use tradedesk_core::Failure;
use tradedesk_core::RawArguments;
use tradedesk_core::ValueType;

// ============================================================================
// SECTION: Global Flags
// ============================================================================

/// Flags accepted before or after any subcommand.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Path to tradedesk.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Print output as canonical JSON.
    #[arg(long, global = true)]
    pub json: bool,
    /// Lifecycle wait deadline in seconds.
    #[arg(
        long,
        global = true,
        value_name = "SECONDS",
        value_parser = clap::value_parser!(u64).range(1 ..= 86_400)
    )]
    pub wait_timeout: Option<u64>,
    /// Delay between lifecycle status polls in milliseconds.
    #[arg(
        long,
        global = true,
        value_name = "MS",
        value_parser = clap::value_parser!(u64).range(50 ..= 60_000)
    )]
    pub poll_interval: Option<u64>,
}

/// Argument ids reserved by [`GlobalArgs`].
pub const GLOBAL_ARGUMENT_IDS: [&str; 4] = ["config", "json", "wait_timeout", "poll_interval"];

// ============================================================================
// SECTION: Parse Results
// ============================================================================

/// Result of parsing argv.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Help text requested; print it and exit successfully.
    Display(String),
    /// A leaf command to validate and dispatch.
    Invocation(ParsedInvocation),
}

/// Leaf command selected on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInvocation {
    /// Global flags.
    pub globals: GlobalArgs,
    /// Command path from the first subcommand to the leaf.
    pub path: Vec<String>,
    /// Arguments exactly as supplied.
    pub raw: RawArguments,
}

impl ParsedInvocation {
    /// Returns the command path joined by spaces.
    #[must_use]
    pub fn command_line(&self) -> String {
        self.path.join(" ")
    }
}

// ============================================================================
// SECTION: Command Construction
// ============================================================================

/// Builds the clap command tree for a registry.
#[must_use]
pub fn build_command(registry: &CommandRegistry) -> Command {
    let root = registry.root();
    let command = Command::new(root.name.clone())
        .about(root.help.clone())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommands(root.children.iter().map(node_command));
    GlobalArgs::augment_args(command)
}

/// Builds the subcommand for one registry node.
fn node_command(node: &CommandNode) -> Command {
    match &node.descriptor {
        Some(descriptor) => leaf_command(descriptor),
        None => Command::new(node.name.clone())
            .about(node.help.clone())
            .subcommand_required(true)
            .arg_required_else_help(true)
            .subcommands(node.children.iter().map(node_command)),
    }
}

/// Builds the subcommand for one leaf descriptor.
fn leaf_command(descriptor: &CommandDescriptor) -> Command {
    Command::new(descriptor.name.clone())
        .about(descriptor.help.clone())
        .args(descriptor.arguments.iter().map(argument))
}

/// Maps one argument spec onto a clap argument.
fn argument(spec: &ArgumentSpec) -> Arg {
    let mut help = spec.help.clone();
    if let Some(choices) = &spec.choices {
        help.push_str(&format!(" [choices: {}]", choices.join(", ")));
    }
    if let Some(default) = &spec.default {
        help.push_str(&format!(" [default: {default}]"));
    }
    let mut arg = Arg::new(spec.name.clone()).help(help);
    if let Some(value_name) = &spec.value_name {
        arg = arg.value_name(value_name.clone());
    }
    if spec.kind == ArgumentKind::Optional {
        arg = arg.long(spec.flag_name());
        if let Some(short) = spec.short {
            arg = arg.short(short);
        }
    } else if spec.value_name.is_none() {
        arg = arg.value_name(spec.display_name());
    }
    if spec.value_type == ValueType::Switch {
        return arg.action(ArgAction::SetTrue);
    }
    match spec.arity {
        // Repeated single-valued options reach the validator as an arity error.
        Arity::One | Arity::ZeroOrOne if spec.kind == ArgumentKind::Optional => {
            arg.num_args(1).action(ArgAction::Append)
        }
        Arity::One | Arity::ZeroOrOne => arg.num_args(1).action(ArgAction::Set),
        Arity::Many => arg.num_args(0 ..).action(ArgAction::Append),
        Arity::AtLeastOne => arg.num_args(1 ..).action(ArgAction::Append),
    }
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses argv (program name first) against the registry.
///
/// # Errors
///
/// Returns a [`Failure`] carrying clap's rendered usage error, categorized as
/// a user-input error kind.
pub fn parse<I, T>(registry: &CommandRegistry, args: I) -> Result<ParseOutcome, Failure>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match build_command(registry).try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(err) => {
            let rendered = err.render().to_string();
            return match err.kind() {
                ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                    Ok(ParseOutcome::Display(rendered))
                }
                kind => Err(Failure::new(usage_error_kind(kind), rendered)),
            };
        }
    };
    let globals = GlobalArgs::from_arg_matches(&matches)
        .map_err(|err| Failure::new(ErrorKind::InvalidArgumentValue, err.render().to_string()))?;

    let mut path = Vec::new();
    let mut current = &matches;
    while let Some((name, sub)) = current.subcommand() {
        path.push(name.to_string());
        current = sub;
    }
    let segments: Vec<&str> = path.iter().map(String::as_str).collect();
    let Some(descriptor) = registry.leaf(&segments) else {
        return Err(Failure::new(
            ErrorKind::UnknownArgument,
            format!("unknown command '{}'", path.join(" ")),
        ));
    };
    Ok(ParseOutcome::Invocation(ParsedInvocation {
        globals,
        raw: raw_arguments(descriptor, current),
        path,
    }))
}

/// Maps a clap usage error onto a user-input error kind.
#[must_use]
pub const fn usage_error_kind(kind: ClapErrorKind) -> ErrorKind {
    match kind {
        ClapErrorKind::UnknownArgument | ClapErrorKind::InvalidSubcommand => {
            ErrorKind::UnknownArgument
        }
        ClapErrorKind::MissingSubcommand
        | ClapErrorKind::MissingRequiredArgument
        | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ErrorKind::MissingArgument,
        ClapErrorKind::ArgumentConflict => ErrorKind::ConflictingArguments,
        _ => ErrorKind::InvalidArgumentValue,
    }
}

/// Collects the arguments supplied on the command line for a leaf.
fn raw_arguments(descriptor: &CommandDescriptor, matches: &ArgMatches) -> RawArguments {
    let mut raw = RawArguments::new();
    for spec in &descriptor.arguments {
        if matches.value_source(&spec.name) != Some(ValueSource::CommandLine) {
            continue;
        }
        if spec.value_type == ValueType::Switch {
            if matches.get_flag(&spec.name) {
                raw.flag(spec.name.clone());
            }
            continue;
        }
        let values = matches
            .get_many::<String>(&spec.name)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        raw.insert(spec.name.clone(), values);
    }
    raw
}
