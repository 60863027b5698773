// crates/tradedesk-core/src/core/mod.rs
// ============================================================================
// Module: Tradedesk Core Types
// Description: Declarative command model, values, validation, and segments.
// Purpose: Group the pure data types shared by every dispatch stage.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Pure, side-effect free building blocks: identifiers, error kinds with
//! stable exit codes, argument values, command descriptors, the command
//! registry, the generic argument validator, and the date-range segmenter.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod descriptor;
pub mod error;
pub mod identifiers;
pub mod registry;
pub mod segment;
pub mod validator;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use descriptor::*;
pub use error::*;
pub use identifiers::*;
pub use registry::*;
pub use segment::*;
pub use validator::*;
pub use value::*;
