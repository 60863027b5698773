// crates/tradedesk-cli/src/output.rs
// ============================================================================
// Module: Output Rendering
// Description: Renders gateway payloads as text/YAML or canonical JSON.
// Purpose: Keep stdout formatting independent of dispatch.
// Dependencies: serde_jcs, serde_json, serde_yaml, tradedesk-config
// ============================================================================

//! ## Overview
//! Text mode prints nothing for empty payloads, one line per item for lists
//! of scalars, strings verbatim, and YAML for everything else. JSON mode
//! emits RFC 8785 canonical JSON.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;
use tradedesk_config::OutputFormat;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Output rendering failures.
#[derive(Debug, Error)]
pub enum OutputError {
    /// YAML serialization failed.
    #[error("yaml rendering failed: {0}")]
    Yaml(String),
    /// JSON serialization failed.
    #[error("json rendering failed: {0}")]
    Json(String),
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders a payload without a trailing newline. An empty string means
/// nothing should be printed.
///
/// # Errors
///
/// Returns [`OutputError`] when serialization fails.
pub fn render(payload: &Value, format: OutputFormat) -> Result<String, OutputError> {
    match format {
        OutputFormat::Json => {
            serde_jcs::to_string(payload).map_err(|err| OutputError::Json(err.to_string()))
        }
        OutputFormat::Yaml => render_text(payload),
    }
}

/// Text-mode rendering.
fn render_text(payload: &Value) -> Result<String, OutputError> {
    match payload {
        Value::Null => Ok(String::new()),
        Value::String(text) => Ok(text.clone()),
        Value::Array(items) if items.is_empty() => Ok(String::new()),
        Value::Object(map) if map.is_empty() => Ok(String::new()),
        Value::Array(items) if items.iter().all(is_scalar) => {
            Ok(items.iter().map(scalar_text).collect::<Vec<_>>().join("\n"))
        }
        Value::Bool(_) | Value::Number(_) => Ok(scalar_text(payload)),
        Value::Array(_) | Value::Object(_) => serde_yaml::to_string(payload)
            .map(|yaml| yaml.trim_end().to_string())
            .map_err(|err| OutputError::Yaml(err.to_string())),
    }
}

/// Returns true for strings, numbers, and booleans.
const fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// Renders a scalar without JSON quoting.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
