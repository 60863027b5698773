// crates/tradedesk-cli/src/tests/surface.rs
// ============================================================================
// Module: Command-Line Surface Tests
// Description: argv parsing against the full command catalog.
// Purpose: Ensure clap only splits argv and usage errors keep stable kinds.
// Dependencies: tradedesk-cli surface, catalog
// ============================================================================

//! ## Overview
//! Parses representative command lines through the registry-built clap tree
//! and checks the resulting command path, raw arguments, and error kinds.

use std::path::PathBuf;

use tradedesk_core::ErrorKind;
use tradedesk_core::RawArguments;
use tradedesk_core::validate;

use crate::catalog::PROGRAM_NAME;
use crate::catalog::command_registry;
use crate::surface::GLOBAL_ARGUMENT_IDS;
use crate::surface::GlobalArgs;
use crate::surface::ParseOutcome;
use crate::surface::ParsedInvocation;
use crate::surface::build_command;
use crate::surface::parse;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn parse_args(args: &[&str]) -> Result<ParseOutcome, tradedesk_core::Failure> {
    let registry = command_registry().unwrap();
    let argv = std::iter::once(PROGRAM_NAME).chain(args.iter().copied());
    parse(&registry, argv)
}

fn invocation(args: &[&str]) -> ParsedInvocation {
    match parse_args(args).unwrap() {
        ParseOutcome::Invocation(parsed) => parsed,
        ParseOutcome::Display(text) => panic!("unexpected display output: {text}"),
    }
}

fn error_kind(args: &[&str]) -> ErrorKind {
    parse_args(args).unwrap_err().kind
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn leaf_path_and_raw_arguments_are_collected() {
    let parsed = invocation(&["calendar", "isopen", "NYSE", "LSE", "--in", "1h"]);
    assert_eq!(parsed.path, vec!["calendar".to_string(), "isopen".to_string()]);
    assert_eq!(parsed.command_line(), "calendar isopen");
    let expected =
        RawArguments::new().with("exchanges", "NYSE").with("exchanges", "LSE").with("in", "1h");
    assert_eq!(parsed.raw, expected);
}

#[test]
fn long_flags_use_dashes_and_shorts_work() {
    let parsed = invocation(&[
        "fundamental",
        "eps",
        "--start-date",
        "2020-01-01",
        "-e",
        "2020-12-31",
        "--exclude-groups",
        "penny",
    ]);
    assert_eq!(parsed.raw.get("start_date"), Some(&["2020-01-01".to_string()][..]));
    assert_eq!(parsed.raw.get("end_date"), Some(&["2020-12-31".to_string()][..]));
    assert_eq!(parsed.raw.get("exclude_groups"), Some(&["penny".to_string()][..]));
}

#[test]
fn switches_are_present_only_when_given() {
    let parsed = invocation(&["ibg", "start", "--wait", "-g", "ibg1"]);
    assert!(parsed.raw.contains("wait"));
    assert_eq!(parsed.raw.get("wait"), Some(&[][..]));

    let parsed = invocation(&["ibg", "start"]);
    assert!(parsed.raw.is_empty());
}

#[test]
fn defaults_are_not_injected_by_the_parser() {
    let parsed = invocation(&["dates", "segment", "2013-06-01", "2015-12-15"]);
    assert!(!parsed.raw.contains("period"));
    let registry = command_registry().unwrap();
    let descriptor = registry.leaf(&["dates", "segment"]).unwrap();
    let validated = validate(descriptor, &parsed.raw).unwrap();
    assert!(validated.period("period").is_some());
}

#[test]
fn global_flags_parse_anywhere() {
    let parsed = invocation(&[
        "--json",
        "ibg",
        "stop",
        "--wait-timeout",
        "30",
        "--poll-interval",
        "250",
        "--config",
        "/tmp/td.toml",
    ]);
    assert_eq!(
        parsed.globals,
        GlobalArgs {
            config: Some(PathBuf::from("/tmp/td.toml")),
            json: true,
            wait_timeout: Some(30),
            poll_interval: Some(250),
        }
    );
    assert!(parsed.raw.is_empty());
}

#[test]
fn root_leaf_has_single_segment_path() {
    let parsed = invocation(&["version"]);
    assert_eq!(parsed.path, vec!["version".to_string()]);
}

#[test]
fn help_is_a_display_outcome() {
    let outcome = parse_args(&["ibg", "--help"]).unwrap();
    let ParseOutcome::Display(text) = outcome else {
        panic!("expected help text");
    };
    assert!(text.contains("credentials"));
    assert!(text.contains("start"));
}

#[test]
fn help_lists_choices_and_defaults() {
    let outcome = parse_args(&["dates", "segment", "--help"]).unwrap();
    let ParseOutcome::Display(text) = outcome else {
        panic!("expected help text");
    };
    assert!(text.contains("[default: A]"));
    let outcome = parse_args(&["ibg", "status", "--help"]).unwrap();
    let ParseOutcome::Display(text) = outcome else {
        panic!("expected help text");
    };
    assert!(text.contains("[choices: running, stopped, error]"));
}

// ============================================================================
// SECTION: Usage Errors
// ============================================================================

#[test]
fn unknown_flag_is_unknown_argument() {
    assert_eq!(error_kind(&["ibg", "start", "--bogus"]), ErrorKind::UnknownArgument);
}

#[test]
fn unknown_subcommand_is_unknown_argument() {
    assert_eq!(error_kind(&["ibg", "restart"]), ErrorKind::UnknownArgument);
}

#[test]
fn missing_subcommand_is_missing_argument() {
    assert_eq!(error_kind(&["calendar"]), ErrorKind::MissingArgument);
    assert_eq!(error_kind(&[]), ErrorKind::MissingArgument);
}

#[test]
fn switch_with_value_is_rejected() {
    let kind = error_kind(&["ibg", "credentials", "ibg1", "--paper=yes"]);
    assert_ne!(kind, ErrorKind::UnknownArgument);
    assert_ne!(kind.exit_code(), 0);
}

#[test]
fn repeated_single_valued_option_is_an_arity_error() {
    let parsed = invocation(&[
        "calendar",
        "closings",
        "--start-date",
        "2020-01-01",
        "--start-date",
        "2021-01-01",
    ]);
    assert_eq!(
        parsed.raw.get("start_date"),
        Some(&["2020-01-01".to_string(), "2021-01-01".to_string()][..])
    );
    let registry = command_registry().unwrap();
    let descriptor = registry.leaf(&["calendar", "closings"]).unwrap();
    let failure = tradedesk_core::Failure::from(validate(descriptor, &parsed.raw).unwrap_err());
    assert_eq!(failure.kind, ErrorKind::InvalidArgumentValue);
    assert_eq!(failure.kind.exit_code(), 4);
}

#[test]
fn out_of_range_global_is_invalid_value() {
    assert_eq!(error_kind(&["--poll-interval", "5", "version"]), ErrorKind::InvalidArgumentValue);
}

#[test]
fn required_and_choices_are_left_to_the_validator() {
    let parsed = invocation(&["calendar", "isopen"]);
    assert!(parsed.raw.is_empty());
    let parsed = invocation(&["ibg", "status", "--status", "paused"]);
    assert_eq!(parsed.raw.get("status"), Some(&["paused".to_string()][..]));
}

// ============================================================================
// SECTION: Catalog Consistency
// ============================================================================

#[test]
fn clap_tree_is_internally_consistent() {
    build_command(&command_registry().unwrap()).debug_assert();
}

#[test]
fn no_leaf_argument_shadows_a_global_flag() {
    let registry = command_registry().unwrap();
    for (path, descriptor) in registry.leaves() {
        for spec in &descriptor.arguments {
            assert!(
                !GLOBAL_ARGUMENT_IDS.contains(&spec.name.as_str()),
                "{path} declares reserved argument {}",
                spec.name
            );
        }
    }
}
