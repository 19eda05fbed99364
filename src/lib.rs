//! # docrelay
//!
//! Relay newly uploaded documents through a document-understanding service
//! and forward the trimmed extraction result to an HTTP endpoint.
//!
//! ## Pipeline Overview
//!
//! ```text
//! storage-change event
//!  │
//!  ├─ 1. Decode     resourceName + eTag → object name, prefix, document id
//!  ├─ 2. Submit     create an invoice key/value extraction job, await SUCCEEDED
//!  ├─ 3. Fetch      original object (only without document id) + job result
//!  ├─ 4. Normalize  prune geometry, confidences and model metadata
//!  └─ 5. Dispatch   one JSON POST: id, name, data, type, etag, times, json
//! ```
//!
//! Every invocation is independent and sequential. The first error ends it;
//! [`Pipeline::handle`] reports that error once as a 500 response.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docrelay::{Pipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // NAMESPACE_NAME, COMPARTMENT_OCID, BUCKET_NAME_IN, BUCKET_NAME_OUT, DESTINATION_URL
//!     let config = PipelineConfig::from_env()?;
//!     let pipeline = Pipeline::from_config(config)?;
//!     let event = br#"{"data":{"resourceName":"inv.pdf","additionalDetails":{"eTag":"E1"}}}"#;
//!     let response = pipeline.handle(event).await;
//!     println!("{} {}", response.status, response.body);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum router exposing the pipeline as an HTTP function |
//! | `cli`    | on      | The `docrelay` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod clients;
pub mod config;
pub mod error;
pub mod handler;
pub mod model;
pub mod pipeline;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use clients::{DocumentService, ObjectStore, PayloadSink};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::{DeliveryError, JobError, PipelineError, StorageError};
pub use handler::{InvocationReport, InvocationResponse, Pipeline};
pub use model::{
    ExtractionJobRequest, JobOutcome, LifecycleState, OutboundPayload, ProcessorJob,
    StorageObjectRef, StoredObject,
};
pub use pipeline::event::ChangeEvent;
pub use pipeline::normalize::normalize;
