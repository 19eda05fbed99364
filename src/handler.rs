//! Invocation entry points.
//!
//! A [`Pipeline`] is the process-wide state: the validated config plus one
//! handle per collaborator. It is built once at startup, wrapped in an `Arc`
//! and shared read-only by every invocation. Invocations are independent:
//! two events for the same key produce two jobs and two deliveries.
//!
//! [`Pipeline::process_event`] runs the stages in order and stops at the
//! first error. [`Pipeline::handle`] is the one place errors are caught: it
//! logs the failure and turns it into the invocation's 500 response.

use crate::clients::{
    http_client, DocumentService, HttpDocumentService, HttpObjectStore, HttpPayloadSink,
    ObjectStore, PayloadSink,
};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::model::{OutboundPayload, StorageObjectRef};
use crate::pipeline::event::ChangeEvent;
use crate::pipeline::{dispatch, job, locate, normalize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Body of a successful invocation response.
pub const SUCCESS_BODY: &str = "success";

/// What one successful invocation did.
#[derive(Debug, Clone)]
pub struct InvocationReport {
    pub job_id: String,
    pub result_key: String,
    pub payload: OutboundPayload,
}

/// The externally visible result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResponse {
    pub status: u16,
    pub body: String,
}

impl InvocationResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    fn success() -> Self {
        Self {
            status: 200,
            body: SUCCESS_BODY.to_string(),
        }
    }

    fn failure(err: &PipelineError) -> Self {
        Self {
            status: 500,
            body: format!("Processing failed due to {err}"),
        }
    }
}

/// Process-wide pipeline state.
pub struct Pipeline {
    config: PipelineConfig,
    store: Arc<dyn ObjectStore>,
    documents: Arc<dyn DocumentService>,
    sink: Arc<dyn PayloadSink>,
}

impl Pipeline {
    /// Assemble a pipeline from explicit collaborators.
    pub fn new(
        config: PipelineConfig,
        store: Arc<dyn ObjectStore>,
        documents: Arc<dyn DocumentService>,
        sink: Arc<dyn PayloadSink>,
    ) -> Self {
        Self {
            config,
            store,
            documents,
            sink,
        }
    }

    /// Build the production pipeline: reqwest-backed clients sharing one
    /// connection pool.
    pub fn from_config(config: PipelineConfig) -> Result<Self, PipelineError> {
        let client = http_client(config.http_timeout)?;
        let store = HttpObjectStore::new(
            client.clone(),
            config.object_storage_endpoint.clone(),
            config.auth_token.clone(),
        );
        let documents = HttpDocumentService::new(
            client.clone(),
            config.document_ai_endpoint.clone(),
            config.auth_token.clone(),
            config.poll_interval,
            config.max_wait,
        );
        let sink = HttpPayloadSink::new(client, config.destination_url.clone());
        Ok(Self::new(
            config,
            Arc::new(store),
            Arc::new(documents),
            Arc::new(sink),
        ))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Handle one raw invocation body. Never fails: every error becomes a
    /// 500 response carrying the error's description.
    pub async fn handle(&self, body: &[u8]) -> InvocationResponse {
        let outcome = match serde_json::from_slice::<Value>(body) {
            Ok(event) => self.process_event(&event).await,
            Err(e) => Err(PipelineError::MalformedEvent(format!("body is not JSON: {e}"))),
        };

        match outcome {
            Ok(report) => {
                debug!("Invocation complete: job {}", report.job_id);
                InvocationResponse::success()
            }
            Err(e) => {
                error!("{}", e);
                InvocationResponse::failure(&e)
            }
        }
    }

    /// Run every stage for one event.
    ///
    /// # Errors
    /// The first stage error, unchanged. Nothing is retried and a submitted
    /// job is never cancelled.
    pub async fn process_event(&self, event: &Value) -> Result<InvocationReport, PipelineError> {
        let total_start = Instant::now();

        // ── Step 1: Decode event ─────────────────────────────────────────
        let event = ChangeEvent::from_json(event)?;
        info!("Processing {} (etag {})", event.resource_path(), event.etag());

        // ── Step 2: Submit job and wait ──────────────────────────────────
        let request = job::build_request(&event, &self.config);
        let outcome = job::submit_and_wait(self.documents.as_ref(), &request).await?;

        // ── Step 3: Fetch input content (policy-dependent) ───────────────
        let input_object = job::input_object(&event, &self.config);
        let input = locate::fetch_input_content(
            self.store.as_ref(),
            &input_object,
            locate::InputContentPolicy::for_event(&event),
        )
        .await?;

        // ── Step 4: Locate and fetch the result ──────────────────────────
        let result_object = StorageObjectRef::new(
            self.config.namespace.clone(),
            self.config.output_bucket.clone(),
            locate::output_key(
                event.output_prefix(),
                &outcome.job_id,
                &self.config.namespace,
                &self.config.input_bucket,
                event.resource_path(),
            ),
        );
        let raw = locate::fetch_result(self.store.as_ref(), &result_object).await?;

        // ── Step 5: Normalize ────────────────────────────────────────────
        let normalized = normalize::normalize(&raw);

        // ── Step 6: Assemble and deliver ─────────────────────────────────
        let payload = dispatch::build_payload(&event, input, &outcome, normalized);
        dispatch::deliver(self.sink.as_ref(), &payload).await?;

        info!(
            "Invocation for {} finished in {}ms",
            event.resource_path(),
            total_start.elapsed().as_millis()
        );

        Ok(InvocationReport {
            job_id: outcome.job_id,
            result_key: result_object.key,
            payload,
        })
    }
}
