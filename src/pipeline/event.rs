//! Event decoding: turn one storage-change notification into a [`ChangeEvent`].
//!
//! Only two fields of the notification matter, `data.resourceName` and
//! `data.additionalDetails.eTag`. Everything the rest of the pipeline needs
//! is derived from the resource name by path convention:
//!
//! ```text
//! resourceName   invoices/doc1/inv.pdf
//! object_name                  inv.pdf     after the last '/'
//! output_prefix  invoices/doc1             before the last '/'
//! document_id             doc1             segment 1, only when depth > 1
//! ```

use crate::error::PipelineError;
use serde_json::Value;

/// The decoded inbound event. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    resource_path: String,
    etag: String,
}

impl ChangeEvent {
    pub fn new(resource_path: impl Into<String>, etag: impl Into<String>) -> Self {
        Self {
            resource_path: resource_path.into(),
            etag: etag.into(),
        }
    }

    /// Decode an already-parsed event record.
    pub fn from_json(event: &Value) -> Result<Self, PipelineError> {
        let resource_path = string_at(event, "/data/resourceName")?;
        if resource_path.is_empty() || resource_path.ends_with('/') {
            return Err(PipelineError::MalformedEvent(format!(
                "/data/resourceName '{resource_path}' names no object"
            )));
        }
        let etag = string_at(event, "/data/additionalDetails/eTag")?;
        Ok(Self::new(resource_path, etag))
    }

    /// Bucket-relative key of the object that changed.
    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    pub fn etag(&self) -> &str {
        &self.etag
    }

    /// Last path segment, or the whole path when it has no `/`.
    pub fn object_name(&self) -> &str {
        match self.resource_path.rsplit_once('/') {
            Some((_, name)) => name,
            None => &self.resource_path,
        }
    }

    /// The path with its object name removed; `None` at depth 0.
    pub fn output_prefix(&self) -> Option<&str> {
        self.resource_path.rsplit_once('/').map(|(prefix, _)| prefix)
    }

    /// Second path segment when the path has at least two `/`.
    ///
    /// A document id marks the upload as tracked by another system, which is
    /// why the input-content fetch is skipped when one is present (see
    /// [`crate::pipeline::locate::InputContentPolicy`]).
    pub fn document_id(&self) -> Option<&str> {
        if self.resource_path.matches('/').count() > 1 {
            self.resource_path.split('/').nth(1)
        } else {
            None
        }
    }
}

fn string_at(event: &Value, pointer: &str) -> Result<String, PipelineError> {
    match event.pointer(pointer) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(PipelineError::MalformedEvent(format!(
            "{pointer} must be a string, got {}",
            kind(other)
        ))),
        None => Err(PipelineError::MalformedEvent(format!("{pointer} is missing"))),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
