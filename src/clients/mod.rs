//! Service seams: the three remote collaborators the pipeline talks to.
//!
//! Each collaborator is an `async_trait` so the pipeline can be driven by the
//! reqwest-backed implementations in production and by in-memory fakes in
//! tests:
//!
//! | Trait | Production impl | Used by stage |
//! |-------|-----------------|---------------|
//! | [`ObjectStore`] | [`HttpObjectStore`] | locate & fetch |
//! | [`DocumentService`] | [`HttpDocumentService`] | job submission |
//! | [`PayloadSink`] | [`HttpPayloadSink`] | dispatch |

pub mod document_ai;
pub mod object_store;
pub mod sink;

pub use document_ai::HttpDocumentService;
pub use object_store::HttpObjectStore;
pub use sink::HttpPayloadSink;

use crate::error::{DeliveryError, JobError, PipelineError, StorageError};
use crate::model::{ExtractionJobRequest, OutboundPayload, ProcessorJob, StorageObjectRef, StoredObject};
use async_trait::async_trait;
use std::time::Duration;

/// Read access to object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, object: &StorageObjectRef) -> Result<StoredObject, StorageError>;
}

/// The document-understanding service.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Create a job and wait until it reaches a terminal lifecycle state.
    ///
    /// Returns the job as last observed, whatever terminal state that is;
    /// deciding that anything but `SUCCEEDED` is a failure is up to the caller.
    /// Poll cadence and the wait limit are the implementation's business.
    async fn create_job_and_wait(
        &self,
        request: &ExtractionJobRequest,
    ) -> Result<ProcessorJob, JobError>;
}

/// The downstream receiver of the assembled payload.
#[async_trait]
pub trait PayloadSink: Send + Sync {
    /// Deliver once. Only a transport failure is an error.
    async fn deliver(&self, payload: &OutboundPayload) -> Result<(), DeliveryError>;
}

/// Build the shared reqwest client used by the HTTP implementations.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, PipelineError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("docrelay/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| PipelineError::Configuration {
            key: "http client",
            reason: e.to_string(),
        })
}

fn with_auth(request: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
    match token {
        Some(t) => request.bearer_auth(t),
        None => request,
    }
}

/// Append path segments to a base URL, percent-encoding each one.
///
/// Object keys contain `/`, which must stay inside a single segment.
fn join_segments(base: &reqwest::Url, segments: &[&str]) -> Option<reqwest::Url> {
    let mut url = base.clone();
    {
        let mut path = url.path_segments_mut().ok()?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Some(url)
}
