//! Error types for the docrelay library.
//!
//! Errors are layered the same way the collaborators are:
//!
//! * [`StorageError`], [`JobError`] and [`DeliveryError`] are returned by the
//!   three service seams ([`crate::clients::ObjectStore`],
//!   [`crate::clients::DocumentService`], [`crate::clients::PayloadSink`]).
//!   They describe what went wrong on the wire and nothing more.
//!
//! * [`PipelineError`] is what one invocation fails with. Each variant names
//!   the pipeline stage that failed and wraps the collaborator error as its
//!   source. There is no recovery inside the pipeline: the first error ends
//!   the invocation and is reported exactly once by
//!   [`crate::handler::Pipeline::handle`].

use thiserror::Error;

/// All errors that end an invocation (or, for `Configuration`, prevent the
/// process from serving invocations at all).
#[derive(Debug, Error)]
pub enum PipelineError {
    // ── Startup ───────────────────────────────────────────────────────────
    /// A required setting is missing or unusable.
    #[error("Missing configuration key {key}")]
    MissingConfiguration { key: &'static str },

    /// A setting is present but invalid.
    #[error("Invalid configuration for {key}: {reason}")]
    Configuration { key: &'static str, reason: String },

    // ── Event decoding ────────────────────────────────────────────────────
    /// The inbound event lacks a required field or is not JSON at all.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    // ── Extraction job ────────────────────────────────────────────────────
    /// The job could not be created, or waiting for it failed.
    #[error("Extraction job submission failed: {0}")]
    JobSubmission(#[source] JobError),

    // ── Storage ───────────────────────────────────────────────────────────
    /// A get-object call failed.
    #[error("Storage access failed for '{key}': {source}")]
    StorageAccess {
        key: String,
        #[source]
        source: StorageError,
    },

    /// The job reported success but its result object is not where the
    /// output naming convention says it should be.
    #[error("Extraction result not found at '{key}' in bucket '{bucket}'")]
    ResultNotFound { bucket: String, key: String },

    /// The result object exists but is not a JSON document.
    #[error("Extraction result at '{key}' is not valid JSON: {source}")]
    InvalidResult {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    // ── Delivery ──────────────────────────────────────────────────────────
    /// The outbound POST could not be performed.
    #[error("Delivery to destination failed: {0}")]
    Delivery(#[source] DeliveryError),
}

/// Errors from an [`crate::clients::ObjectStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// The object does not exist.
    #[error("object not found")]
    NotFound,

    /// The storage service answered with a non-success status.
    #[error("storage service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never completed.
    #[error("storage request failed: {0}")]
    Transport(String),
}

/// Errors from a [`crate::clients::DocumentService`].
#[derive(Debug, Error)]
pub enum JobError {
    /// The service refused to create the job (bad compartment, quota, …).
    #[error("job creation rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The job reached a terminal state other than `SUCCEEDED`.
    #[error("job {job_id} ended in state {state}{}", .details.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Failed {
        job_id: String,
        state: String,
        details: Option<String>,
    },

    /// The client gave up waiting for a terminal state.
    #[error("job {job_id} did not reach a terminal state within {secs}s")]
    TimedOut { job_id: String, secs: u64 },

    /// A status poll returned something other than a job.
    #[error("job status request failed with HTTP {status}: {body}")]
    Poll { status: u16, body: String },

    /// The request never completed, or the response could not be decoded.
    #[error("extraction service request failed: {0}")]
    Transport(String),
}

/// Errors from a [`crate::clients::PayloadSink`].
///
/// Only transport failures are errors; a reachable receiver answering with a
/// non-2xx status is not.
#[derive(Debug, Error)]
#[error("POST {url} failed: {reason}")]
pub struct DeliveryError {
    pub url: String,
    pub reason: String,
}
