//! Job submission: build the extraction request and await its outcome.

use super::event::ChangeEvent;
use crate::clients::DocumentService;
use crate::config::PipelineConfig;
use crate::error::{JobError, PipelineError};
use crate::model::{
    DocumentFeature, DocumentType, ExtractionJobRequest, InputLocation, JobOutcome, LifecycleState,
    OutputLocation, ProcessorConfig, ProcessorType, StorageObjectRef,
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

/// Build the job request for one event.
///
/// The display name is a fresh UUID v4 so concurrent invocations for the same
/// object never collide.
pub fn build_request(event: &ChangeEvent, config: &PipelineConfig) -> ExtractionJobRequest {
    ExtractionJobRequest {
        display_name: Uuid::new_v4().to_string(),
        input_location: InputLocation::ObjectStorageLocations {
            object_locations: vec![input_object(event, config)],
        },
        output_location: OutputLocation {
            namespace: config.namespace.clone(),
            bucket: config.output_bucket.clone(),
            prefix: event.output_prefix().map(str::to_string),
        },
        compartment_id: config.compartment_id.clone(),
        processor_config: ProcessorConfig {
            processor_type: ProcessorType::General,
            features: vec![DocumentFeature::KeyValueExtraction],
            document_type: DocumentType::Invoice,
            is_zip_output_enabled: false,
        },
    }
}

/// The object that changed, in the input bucket.
pub fn input_object(event: &ChangeEvent, config: &PipelineConfig) -> StorageObjectRef {
    StorageObjectRef::new(
        config.namespace.clone(),
        config.input_bucket.clone(),
        event.resource_path(),
    )
}

/// Submit `request` and wait for it to finish.
///
/// `started_at` / `finished_at` are taken from our own clock around the
/// awaited call, not from the service. Any terminal state other than
/// `SUCCEEDED` is an error, as is any error from the service client.
pub async fn submit_and_wait(
    service: &dyn DocumentService,
    request: &ExtractionJobRequest,
) -> Result<JobOutcome, PipelineError> {
    info!("Submitting extraction job {}", request.display_name);

    let started_at = Utc::now();
    let job = service
        .create_job_and_wait(request)
        .await
        .map_err(PipelineError::JobSubmission)?;
    let finished_at = Utc::now();

    if job.lifecycle_state != LifecycleState::Succeeded {
        warn!("Job {} ended in {}", job.id, job.lifecycle_state);
        return Err(PipelineError::JobSubmission(JobError::Failed {
            job_id: job.id,
            state: job.lifecycle_state.to_string(),
            details: job.lifecycle_details,
        }));
    }

    info!(
        "Job {} succeeded in {}ms",
        job.id,
        (finished_at - started_at).num_milliseconds()
    );

    Ok(JobOutcome {
        job_id: job.id,
        started_at,
        finished_at,
        state: job.lifecycle_state,
    })
}
