//! Payload assembly and the single delivery attempt.

use super::event::ChangeEvent;
use super::locate::InputContent;
use crate::clients::PayloadSink;
use crate::error::PipelineError;
use crate::model::{JobOutcome, OutboundPayload};
use serde_json::Value;
use tracing::info;

/// Combine the event, the input content, the job outcome and the normalized
/// result into the outbound payload.
pub fn build_payload(
    event: &ChangeEvent,
    input: InputContent,
    job: &JobOutcome,
    normalized: Value,
) -> OutboundPayload {
    OutboundPayload {
        id: event.document_id().map(str::to_string),
        name: event.object_name().to_string(),
        data: input.data,
        content_type: input.content_type,
        etag: event.etag().to_string(),
        received: input.received,
        job_id: job.job_id.clone(),
        start: job.started_at,
        end: job.finished_at,
        json: normalized,
    }
}

/// Deliver once. The receiver's answer is not inspected.
pub async fn deliver(sink: &dyn PayloadSink, payload: &OutboundPayload) -> Result<(), PipelineError> {
    sink.deliver(payload).await.map_err(PipelineError::Delivery)?;
    info!("Delivered payload for {} (job {})", payload.name, payload.job_id);
    Ok(())
}
