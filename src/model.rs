//! Data types shared by the pipeline stages and the service clients.
//!
//! The job request types serialise directly into the extraction service's
//! `CreateProcessorJobDetails` wire shape, so [`crate::clients::HttpDocumentService`]
//! posts them as-is.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Storage ──────────────────────────────────────────────────────────────

/// Identifies one object in the storage service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageObjectRef {
    #[serde(rename = "namespaceName")]
    pub namespace: String,
    #[serde(rename = "bucketName")]
    pub bucket: String,
    #[serde(rename = "objectName")]
    pub key: String,
}

impl StorageObjectRef {
    pub fn new(namespace: impl Into<String>, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for StorageObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.bucket, self.key)
    }
}

/// A fetched object: body plus the headers the pipeline cares about.
#[derive(Debug, Clone, Default)]
pub struct StoredObject {
    pub content: Bytes,
    pub content_type: Option<String>,
    pub last_modified: Option<String>,
}

// ── Extraction job request ───────────────────────────────────────────────

/// Where the extraction service writes its results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLocation {
    #[serde(rename = "namespaceName")]
    pub namespace: String,
    #[serde(rename = "bucketName")]
    pub bucket: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prefix: Option<String>,
}

/// The objects a job reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "sourceType")]
pub enum InputLocation {
    #[serde(rename = "OBJECT_STORAGE_LOCATIONS", rename_all = "camelCase")]
    ObjectStorageLocations { object_locations: Vec<StorageObjectRef> },
}

impl InputLocation {
    pub fn objects(&self) -> &[StorageObjectRef] {
        match self {
            InputLocation::ObjectStorageLocations { object_locations } => object_locations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessorType {
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Invoice,
}

/// An extraction feature requested from the service.
///
/// Key/value extraction on invoice-type documents also yields the line-item
/// groups, so it is the only feature the relay asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "featureType")]
pub enum DocumentFeature {
    #[serde(rename = "KEY_VALUE_EXTRACTION")]
    KeyValueExtraction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorConfig {
    pub processor_type: ProcessorType,
    pub features: Vec<DocumentFeature>,
    pub document_type: DocumentType,
    /// Always false: the result must be one discoverable JSON object.
    pub is_zip_output_enabled: bool,
}

/// Parameters for one extraction job. Built fresh per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionJobRequest {
    pub display_name: String,
    pub input_location: InputLocation,
    pub output_location: OutputLocation,
    pub compartment_id: String,
    pub processor_config: ProcessorConfig,
}

// ── Extraction job state ─────────────────────────────────────────────────

/// Lifecycle of an extraction job as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Accepted,
    InProgress,
    Succeeded,
    Failed,
    Canceling,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl LifecycleState {
    /// No further transition happens from a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LifecycleState::Succeeded | LifecycleState::Failed | LifecycleState::Canceled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Accepted => "ACCEPTED",
            LifecycleState::InProgress => "IN_PROGRESS",
            LifecycleState::Succeeded => "SUCCEEDED",
            LifecycleState::Failed => "FAILED",
            LifecycleState::Canceling => "CANCELING",
            LifecycleState::Canceled => "CANCELED",
            LifecycleState::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job as returned by the extraction service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorJob {
    pub id: String,
    pub lifecycle_state: LifecycleState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_details: Option<String>,
}

/// A job that reached `SUCCEEDED`, stamped with our own wall-clock times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub job_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub state: LifecycleState,
}

// ── Outbound payload ─────────────────────────────────────────────────────

/// The JSON body POSTed to the destination. Absent values serialise as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundPayload {
    pub id: Option<String>,
    pub name: String,
    /// Base64 of the original object, when it was fetched.
    pub data: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub etag: String,
    pub received: Option<String>,
    pub job_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub json: serde_json::Value,
}
