// crates/tradedesk-core/src/runtime/request.rs
// ============================================================================
// Module: Declarative Request Adapters
// Description: Adapters that map validated arguments onto gateway requests.
// Purpose: Keep per-command boilerplate as data rather than code.
// Dependencies: async-trait, percent-encoding, serde_json, tokio, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`RequestOperation`] builds one [`GatewayRequest`] from a validated
//! invocation. Path placeholders (`/{service}/crontab`) are filled from the
//! argument of the same name. The remaining arguments map field by field to
//! query parameters or form fields, keeping their declared names; lists repeat
//! the key and switches become `true`. The only renaming is an explicit
//! [`RequestOperation::switch_field`] mapping.
//!
//! [`ConditionalOperation`] picks between a read and a write request,
//! [`AssertionOperation`] turns a boolean payload into an exit status, and
//! [`SegmentedOperation`] splits a date window with the segmenter and issues
//! one request per segment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;
use percent_encoding::utf8_percent_encode;
use serde_json::Value;

use crate::core::error::ErrorKind;
use crate::core::error::Failure;
use crate::core::segment::SegmentError;
use crate::core::segment::segment;
use crate::core::value::ArgValue;
use crate::core::value::ValidatedInvocation;
use crate::interfaces::GatewayRequest;
use crate::interfaces::Method;
use crate::interfaces::RequestBody;
use crate::runtime::operation::OperationAdapter;
use crate::runtime::operation::OperationContext;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum size of an uploaded file body.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Bytes escaped in a path segment: everything but RFC 3986 unreserved.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet =
    &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

// ============================================================================
// SECTION: Request Operation
// ============================================================================

/// Where non-path arguments travel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyMapping {
    /// Every remaining argument becomes a query parameter.
    Query,
    /// Every remaining argument becomes a form field.
    Form,
    /// The named path argument is read and sent as the raw text body; the
    /// rest become query parameters.
    FileText(String),
}

/// Explicit mapping of a switch onto a fixed field value.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SwitchField {
    /// Switch argument name.
    argument: String,
    /// Wire field name.
    field: String,
    /// Wire value sent when the switch is present.
    value: String,
}

/// Declarative single-request adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOperation {
    /// Request method.
    method: Method,
    /// Path template with `{argument}` placeholders.
    path: String,
    /// Placement of non-path arguments.
    body: BodyMapping,
    /// Per-request timeout override.
    timeout: Option<Duration>,
    /// Explicit switch renames.
    switch_fields: Vec<SwitchField>,
}

impl RequestOperation {
    /// Creates a request adapter with query-parameter mapping.
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            body: BodyMapping::Query,
            timeout: None,
            switch_fields: Vec::new(),
        }
    }

    /// Shorthand for a `GET` adapter.
    #[must_use]
    pub fn get(path: &str) -> Self {
        Self::new(Method::Get, path)
    }

    /// Shorthand for a `POST` adapter.
    #[must_use]
    pub fn post(path: &str) -> Self {
        Self::new(Method::Post, path)
    }

    /// Shorthand for a `PUT` adapter.
    #[must_use]
    pub fn put(path: &str) -> Self {
        Self::new(Method::Put, path)
    }

    /// Shorthand for a `DELETE` adapter.
    #[must_use]
    pub fn delete(path: &str) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Sends remaining arguments as form fields.
    #[must_use]
    pub fn form(mut self) -> Self {
        self.body = BodyMapping::Form;
        self
    }

    /// Sends the file named by `argument` as the raw text body.
    #[must_use]
    pub fn file_body(mut self, argument: &str) -> Self {
        self.body = BodyMapping::FileText(argument.to_string());
        self
    }

    /// Overrides the transport timeout for this request.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sends `field=value` when the switch `argument` is present.
    #[must_use]
    pub fn switch_field(mut self, argument: &str, field: &str, value: &str) -> Self {
        self.switch_fields.push(SwitchField {
            argument: argument.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Builds the gateway request for an invocation.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MissingArgument`] when a path placeholder has no
    /// value, or [`ErrorKind::LocalIo`] when an upload file cannot be read.
    pub async fn build(&self, invocation: &ValidatedInvocation) -> Result<GatewayRequest, Failure> {
        let mut consumed = BTreeSet::new();
        let path = fill_path(&self.path, invocation, &mut consumed)?;

        let mut text_body = None;
        if let BodyMapping::FileText(argument) = &self.body {
            consumed.insert(argument.clone());
            if let Some(file) = invocation.path(argument) {
                text_body = Some(read_upload(file).await?);
            }
        }

        let mut fields = Vec::new();
        for (name, value) in &invocation.arguments {
            if consumed.contains(name) {
                continue;
            }
            if let Some(mapping) = self.switch_fields.iter().find(|mapping| &mapping.argument == name) {
                if matches!(value, ArgValue::Bool(true)) {
                    fields.push((mapping.field.clone(), mapping.value.clone()));
                }
                continue;
            }
            for wire in value.to_wire_strings() {
                fields.push((name.clone(), wire));
            }
        }

        let mut request = GatewayRequest::new(self.method, path);
        request.timeout = self.timeout;
        match (&self.body, text_body) {
            (BodyMapping::Form, _) => request.body = RequestBody::Form(fields),
            (_, Some(text)) => {
                request.body = RequestBody::Text(text);
                request.query = fields;
            }
            (_, None) => request.query = fields,
        }
        Ok(request)
    }
}

#[async_trait]
impl OperationAdapter for RequestOperation {
    async fn execute(
        &self,
        invocation: &ValidatedInvocation,
        context: &OperationContext<'_>,
    ) -> Result<Value, Failure> {
        let request = self.build(invocation).await?;
        context.gateway.call(request).await.map_err(Failure::from)
    }
}

// ============================================================================
// SECTION: Conditional Operation
// ============================================================================

/// Chooses a write request when any trigger argument is present ("set"),
/// otherwise a read request ("show").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalOperation {
    /// Arguments whose presence selects the write request.
    triggers: Vec<String>,
    /// Request used when a trigger is present.
    write: RequestOperation,
    /// Request used otherwise.
    read: RequestOperation,
}

impl ConditionalOperation {
    /// Creates a show-or-set adapter.
    #[must_use]
    pub fn new(triggers: &[&str], write: RequestOperation, read: RequestOperation) -> Self {
        Self {
            triggers: triggers.iter().map(|trigger| (*trigger).to_string()).collect(),
            write,
            read,
        }
    }

    /// Returns the request adapter selected for an invocation.
    #[must_use]
    pub fn select(&self, invocation: &ValidatedInvocation) -> &RequestOperation {
        if self.triggers.iter().any(|trigger| invocation.contains(trigger)) {
            &self.write
        } else {
            &self.read
        }
    }
}

#[async_trait]
impl OperationAdapter for ConditionalOperation {
    async fn execute(
        &self,
        invocation: &ValidatedInvocation,
        context: &OperationContext<'_>,
    ) -> Result<Value, Failure> {
        self.select(invocation).execute(invocation, context).await
    }
}

// ============================================================================
// SECTION: Assertion Operation
// ============================================================================

/// Request whose boolean payload becomes the command's exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionOperation {
    /// Underlying request.
    request: RequestOperation,
    /// Description used in the failure message, such as `open`.
    description: String,
}

impl AssertionOperation {
    /// Creates an assertion adapter.
    #[must_use]
    pub fn new(request: RequestOperation, description: &str) -> Self {
        Self {
            request,
            description: description.to_string(),
        }
    }

    /// Evaluates an assertion payload: a boolean, or an object or array
    /// whose values are all booleans.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::GatewayError`] for payloads of any other shape.
    pub fn evaluate(payload: &Value) -> Result<bool, Failure> {
        let protocol = || {
            Failure::new(ErrorKind::GatewayError, "assertion response must be boolean".to_string())
        };
        match payload {
            Value::Bool(value) => Ok(*value),
            Value::Object(map) if !map.is_empty() => map
                .values()
                .try_fold(true, |acc, value| value.as_bool().map(|flag| acc && flag))
                .ok_or_else(protocol),
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .try_fold(true, |acc, value| value.as_bool().map(|flag| acc && flag))
                .ok_or_else(protocol),
            _ => Err(protocol()),
        }
    }
}

#[async_trait]
impl OperationAdapter for AssertionOperation {
    async fn execute(
        &self,
        invocation: &ValidatedInvocation,
        context: &OperationContext<'_>,
    ) -> Result<Value, Failure> {
        let payload = self.request.execute(invocation, context).await?;
        if Self::evaluate(&payload)? {
            Ok(payload)
        } else {
            Err(Failure::new(
                ErrorKind::AssertionFailed,
                format!("assertion failed: not {}", self.description),
            ))
        }
    }
}

// ============================================================================
// SECTION: Segmented Operation
// ============================================================================

/// Request that optionally splits its date window into segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentedOperation {
    /// Per-segment request.
    request: RequestOperation,
    /// Period argument name.
    segment_argument: String,
    /// Window start argument name.
    start_argument: String,
    /// Window end argument name.
    end_argument: String,
}

impl SegmentedOperation {
    /// Creates a segmented adapter keyed on `segment`, `start_date`, and `end_date`.
    #[must_use]
    pub fn new(request: RequestOperation) -> Self {
        Self {
            request,
            segment_argument: "segment".to_string(),
            start_argument: "start_date".to_string(),
            end_argument: "end_date".to_string(),
        }
    }

    /// Expands an invocation into one invocation per segment. Without a
    /// period argument the invocation is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MissingArgument`] when the window is incomplete and
    /// [`ErrorKind::InvalidDateRange`] when it is inverted.
    pub fn plan(&self, invocation: &ValidatedInvocation) -> Result<Vec<ValidatedInvocation>, Failure> {
        let Some(period) = invocation.period(&self.segment_argument) else {
            return Ok(vec![invocation.clone()]);
        };
        let (Some(start), Some(end)) =
            (invocation.date(&self.start_argument), invocation.date(&self.end_argument))
        else {
            return Err(Failure::new(
                ErrorKind::MissingArgument,
                format!(
                    "--{} requires --{} and --{}",
                    self.segment_argument.replace('_', "-"),
                    self.start_argument.replace('_', "-"),
                    self.end_argument.replace('_', "-")
                ),
            ));
        };
        let segments = segment(start, end, period)?;
        Ok(segments
            .into_iter()
            .map(|window| {
                let mut chunk = invocation.clone();
                chunk.remove(&self.segment_argument);
                chunk.insert(self.start_argument.clone(), ArgValue::Date(window.start));
                chunk.insert(self.end_argument.clone(), ArgValue::Date(window.end));
                chunk
            })
            .collect())
    }

    /// Returns the period argument name.
    #[must_use]
    pub fn segment_argument(&self) -> &str {
        &self.segment_argument
    }
}

#[async_trait]
impl OperationAdapter for SegmentedOperation {
    async fn execute(
        &self,
        invocation: &ValidatedInvocation,
        context: &OperationContext<'_>,
    ) -> Result<Value, Failure> {
        if invocation.period(&self.segment_argument).is_none() {
            return self.request.execute(invocation, context).await;
        }
        let mut merged = Vec::new();
        for chunk in self.plan(invocation)? {
            match self.request.execute(&chunk, context).await? {
                Value::Array(items) => merged.extend(items),
                Value::Null => {}
                other => merged.push(other),
            }
        }
        Ok(Value::Array(merged))
    }
}

impl From<SegmentError> for Failure {
    fn from(error: SegmentError) -> Self {
        let kind = match error {
            SegmentError::InvalidDateRange {
                ..
            } => ErrorKind::InvalidDateRange,
            SegmentError::InvalidPeriod(_) | SegmentError::InvalidDate(_) => {
                ErrorKind::InvalidArgumentValue
            }
        };
        Self::new(kind, error.to_string())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Substitutes `{argument}` placeholders in a path template.
fn fill_path(
    template: &str,
    invocation: &ValidatedInvocation,
    consumed: &mut BTreeSet<String>,
) -> Result<String, Failure> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        output.push_str(&rest[.. open]);
        let after = &rest[open + 1 ..];
        let Some(close) = after.find('}') else {
            output.push_str(&rest[open ..]);
            return Ok(output);
        };
        let name = &after[.. close];
        let values = invocation.strings(name);
        let Some(value) = values.first() else {
            return Err(Failure::new(
                ErrorKind::MissingArgument,
                format!("missing value for path parameter '{name}'"),
            ));
        };
        output.push_str(&encode_path_segment(value));
        consumed.insert(name.to_string());
        rest = &after[close + 1 ..];
    }
    output.push_str(rest);
    Ok(output)
}

/// Percent-encodes a value for use as one path segment.
fn encode_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT_ENCODE_SET).to_string()
}

/// Reads an upload file with a size limit.
async fn read_upload(path: &Path) -> Result<String, Failure> {
    let io_failure = |err: std::io::Error| {
        Failure::new(ErrorKind::LocalIo, format!("failed to read {}: {err}", path.display()))
    };
    let metadata = tokio::fs::metadata(path).await.map_err(io_failure)?;
    if metadata.len() > MAX_UPLOAD_BYTES {
        return Err(Failure::new(
            ErrorKind::LocalIo,
            format!("{} exceeds the {MAX_UPLOAD_BYTES} byte upload limit", path.display()),
        ));
    }
    tokio::fs::read_to_string(path).await.map_err(io_failure)
}
