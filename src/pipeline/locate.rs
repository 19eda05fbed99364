//! Result location and fetching.
//!
//! The extraction service writes its result under a fixed naming convention:
//!
//! ```text
//! {prefix}/{jobId}/{namespace}_{inputBucket}/results/{inputObjectKey}.json
//! ```
//!
//! [`output_key`] rebuilds that path. If the service ever changes its layout
//! the fetch fails with [`PipelineError::ResultNotFound`]; there is no
//! discovery fallback.

use super::event::ChangeEvent;
use crate::clients::ObjectStore;
use crate::error::{PipelineError, StorageError};
use crate::model::StorageObjectRef;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tracing::{debug, info};

/// Whether the original object's bytes are re-sent downstream.
///
/// This is a fixed policy keyed on the path convention: an upload nested at
/// least two levels deep carries a document id, and a document id means the
/// receiver already tracks the original bytes. Only uploads without a
/// document id have their content fetched and base64-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputContentPolicy {
    /// Fetch the object and send content, content type and last-modified.
    Transmit,
    /// Leave `data`, `type` and `received` empty.
    TrackedElsewhere,
}

impl InputContentPolicy {
    pub fn for_event(event: &ChangeEvent) -> Self {
        if event.document_id().is_some() {
            InputContentPolicy::TrackedElsewhere
        } else {
            InputContentPolicy::Transmit
        }
    }
}

/// The original object as it travels in the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputContent {
    /// Base64 (standard alphabet, padded).
    pub data: Option<String>,
    pub content_type: Option<String>,
    pub received: Option<String>,
}

/// Compute the key of the job's result object.
///
/// Without a prefix (the input sat at the bucket root) the path starts at the
/// job id.
pub fn output_key(
    prefix: Option<&str>,
    job_id: &str,
    namespace: &str,
    input_bucket: &str,
    input_key: &str,
) -> String {
    let tail = format!("{job_id}/{namespace}_{input_bucket}/results/{input_key}.json");
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}/{tail}"),
        _ => tail,
    }
}

/// Fetch the input object according to `policy`.
pub async fn fetch_input_content(
    store: &dyn ObjectStore,
    object: &StorageObjectRef,
    policy: InputContentPolicy,
) -> Result<InputContent, PipelineError> {
    if policy == InputContentPolicy::TrackedElsewhere {
        debug!("Skipping input fetch for {}: document id present", object);
        return Ok(InputContent::default());
    }

    let stored = store
        .get_object(object)
        .await
        .map_err(|source| PipelineError::StorageAccess {
            key: object.key.clone(),
            source,
        })?;

    info!("Fetched input {} ({} bytes)", object, stored.content.len());

    Ok(InputContent {
        data: Some(STANDARD.encode(&stored.content)),
        content_type: stored.content_type,
        received: stored.last_modified,
    })
}

/// Fetch and parse the job's result document.
pub async fn fetch_result(
    store: &dyn ObjectStore,
    object: &StorageObjectRef,
) -> Result<Value, PipelineError> {
    let stored = store.get_object(object).await.map_err(|e| match e {
        StorageError::NotFound => PipelineError::ResultNotFound {
            bucket: object.bucket.clone(),
            key: object.key.clone(),
        },
        source => PipelineError::StorageAccess {
            key: object.key.clone(),
            source,
        },
    })?;

    info!("Fetched result {} ({} bytes)", object, stored.content.len());

    serde_json::from_slice(&stored.content).map_err(|source| PipelineError::InvalidResult {
        key: object.key.clone(),
        source,
    })
}
