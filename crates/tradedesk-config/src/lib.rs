// crates/tradedesk-config/src/lib.rs
// ============================================================================
// Module: Tradedesk Config Library
// Description: Canonical configuration model for the tradedesk CLI.
// Purpose: Load, override, and validate tradedesk.toml.
// Dependencies: serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! `tradedesk-config` owns the `tradedesk.toml` model: gateway location and
//! credentials, lifecycle wait defaults, output format, and audit logging.
//! Loading is fail-closed: unknown fields, oversized files, and out-of-range
//! values are rejected before the CLI dispatches anything.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
