// crates/tradedesk-cli/src/tests/i18n.rs
// ============================================================================
// Module: CLI i18n Tests
// Description: Unit tests for the message catalog and placeholder handling.
// Purpose: Ensure every referenced key exists and substitutions apply.
// Dependencies: tradedesk-cli i18n module
// ============================================================================

//! ## Overview
//! Scans the CLI sources for `t!` keys and checks each one is cataloged, then
//! exercises placeholder substitution.

use std::collections::BTreeSet;

use crate::i18n::CATALOG_ITEMS;
use crate::i18n::MessageArg;
use crate::i18n::catalog;
use crate::i18n::translate;

/// Sources that format catalog messages.
const SOURCES: &[&str] = &[
    include_str!("../main.rs"),
    include_str!("../operations.rs"),
    include_str!("../prompt.rs"),
];

fn referenced_keys() -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    for source in SOURCES {
        for (index, _) in source.match_indices("t!(\"") {
            let rest = &source[index + 4 ..];
            if let Some(end) = rest.find('"') {
                keys.insert(rest[.. end].to_string());
            }
        }
    }
    keys
}

#[test]
fn catalog_keys_are_unique() {
    let unique: BTreeSet<&str> = CATALOG_ITEMS.iter().map(|(key, _)| *key).collect();
    assert_eq!(unique.len(), CATALOG_ITEMS.len());
}

#[test]
fn every_referenced_key_is_cataloged() {
    let keys = referenced_keys();
    assert!(keys.contains("main.error"));
    for key in keys {
        assert!(catalog().contains_key(key.as_str()), "missing catalog key {key}");
    }
}

#[test]
fn translate_substitutes_placeholders() {
    let output = translate(
        "gateway.not_configured",
        vec![MessageArg::new("file", "tradedesk.toml"), MessageArg::new("env", "TRADEDESK_GATEWAY_URL")],
    );
    assert_eq!(
        output,
        "no gateway URL configured; set gateway.url in tradedesk.toml or the TRADEDESK_GATEWAY_URL \
         environment variable"
    );
}

#[test]
fn macro_formats_display_values() {
    let output = crate::t!("main.version", version = "1.2.3");
    assert_eq!(output, "tradedesk 1.2.3");
}

#[test]
fn unknown_key_falls_back_to_key() {
    assert_eq!(translate("no.such.key", Vec::new()), "no.such.key");
}

#[test]
fn missing_placeholder_is_left_in_place() {
    let output = translate("output.write_failed", vec![MessageArg::new("stream", "stdout")]);
    assert_eq!(output, "Failed to write to stdout: {error}");
}
