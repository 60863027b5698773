// crates/tradedesk-cli/src/lib.rs
// ============================================================================
// Module: Tradedesk CLI Library
// Description: Command catalog, gateway client, and terminal helpers.
// Purpose: Share the CLI building blocks between the binary and its tests.
// Dependencies: clap, crossterm, reqwest, serde_json, tradedesk-core
// ============================================================================

//! ## Overview
//! The binary entry point (`src/main.rs`) wires these modules together:
//! [`catalog`] declares every command, [`surface`] parses argv against it,
//! [`operations`] binds operation ids to adapters, and [`gateway_client`]
//! carries requests to the remote gateway. User-facing strings live in
//! [`i18n`].

// ============================================================================
// SECTION: Modules
// ============================================================================

/// JSON-lines audit events.
pub mod audit;
/// Command registry and verified operation table.
pub mod catalog;
/// HTTP gateway client.
pub mod gateway_client;
/// Internationalization helpers and message catalog.
pub mod i18n;
/// Operation adapters.
pub mod operations;
/// Payload rendering.
pub mod output;
/// Masked secret prompt.
pub mod prompt;
/// clap command tree built from the registry.
pub mod surface;
