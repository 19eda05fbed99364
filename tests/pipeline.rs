//! End-to-end pipeline tests against in-memory collaborators.

mod common;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{event, FakeDocuments, Harness, RecordingSink, BUCKET_IN, BUCKET_OUT, NS};
use docrelay::{JobError, LifecycleState, PipelineError, StorageError, StorageObjectRef};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

fn raw_result() -> serde_json::Value {
    json!({
        "pages": [{
            "dimensions": {"width": 8.5, "height": 11.0},
            "documentFields": [{
                "fieldType": "KEY_VALUE",
                "fieldName": "X",
                "fieldValue": {"text": "t", "confidence": 0.9, "value": "42"}
            }]
        }]
    })
}

#[tokio::test]
async fn nested_upload_end_to_end() {
    let h = Harness::succeeding("J9");
    h.store.put(BUCKET_IN, "invoices/doc1/inv.pdf", "%PDF-1.7", "application/pdf");
    h.store.put_json(
        BUCKET_OUT,
        "invoices/doc1/J9/NS_IN/results/invoices/doc1/inv.pdf.json",
        &raw_result(),
    );

    let report = assert_ok!(
        h.pipeline
            .process_event(&event("invoices/doc1/inv.pdf", "E1"))
            .await
    );
    assert_eq!(report.job_id, "J9");

    let delivered = h.sink.delivered();
    assert_eq!(delivered.len(), 1);
    let body = serde_json::to_value(&delivered[0]).unwrap();
    assert_eq!(body["id"], "doc1");
    assert_eq!(body["name"], "inv.pdf");
    assert_eq!(body["etag"], "E1");
    assert_eq!(body["job_id"], "J9");
    assert!(body["data"].is_null());
    assert!(body["type"].is_null());
    assert!(body["received"].is_null());
    assert_eq!(
        body["json"],
        json!({"pages": [{"documentFields": [
            {"fieldType": "KEY_VALUE", "fieldValue": {"value": "42"}}
        ]}]})
    );
    assert!(delivered[0].start <= delivered[0].end);

    // The input object exists but is never read when a document id is present.
    assert_eq!(
        h.store.gets(),
        vec![StorageObjectRef::new(
            NS,
            BUCKET_OUT,
            "invoices/doc1/J9/NS_IN/results/invoices/doc1/inv.pdf.json"
        )]
    );
}

#[tokio::test]
async fn job_request_is_built_from_event() {
    let h = Harness::succeeding("J1");
    h.store.put_json(BUCKET_OUT, "a/b/J1/NS_IN/results/a/b/c.pdf.json", &json!({"pages": []}));

    assert_ok!(h.pipeline.process_event(&event("a/b/c.pdf", "E")).await);

    let requests = h.documents.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(
        request.input_location.objects(),
        &[StorageObjectRef::new(NS, BUCKET_IN, "a/b/c.pdf")]
    );
    assert_eq!(request.output_location.bucket, BUCKET_OUT);
    assert_eq!(request.output_location.prefix.as_deref(), Some("a/b"));
    assert!(!request.processor_config.is_zip_output_enabled);
}

#[tokio::test]
async fn flat_upload_carries_original_content() {
    let h = Harness::succeeding("J2");
    h.store.put(BUCKET_IN, "inv.pdf", "%PDF-1.4 body", "application/pdf");
    h.store.put_json(BUCKET_OUT, "J2/NS_IN/results/inv.pdf.json", &json!({"pages": []}));

    let report = assert_ok!(h.pipeline.process_event(&event("inv.pdf", "E2")).await);
    assert_eq!(report.result_key, "J2/NS_IN/results/inv.pdf.json");

    let payload = &h.sink.delivered()[0];
    assert_eq!(payload.id, None);
    assert_eq!(payload.name, "inv.pdf");
    assert_eq!(payload.data.as_deref(), Some(STANDARD.encode("%PDF-1.4 body").as_str()));
    assert_eq!(payload.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(
        payload.received.as_deref(),
        Some("Sun, 18 Oct 2026 09:00:00 GMT")
    );
}

#[tokio::test]
async fn single_level_upload_fetches_input_and_uses_prefix() {
    let h = Harness::succeeding("J3");
    h.store.put(BUCKET_IN, "inbox/inv.pdf", "bytes", "application/pdf");
    h.store.put_json(
        BUCKET_OUT,
        "inbox/J3/NS_IN/results/inbox/inv.pdf.json",
        &json!({"pages": []}),
    );

    assert_ok!(h.pipeline.process_event(&event("inbox/inv.pdf", "E")).await);
    assert_eq!(h.store.gets().len(), 2);
    assert!(h.sink.delivered()[0].data.is_some());
}

#[tokio::test]
async fn failed_job_produces_no_delivery() {
    let h = Harness::new(
        FakeDocuments::ending_in("J4", LifecycleState::Failed),
        RecordingSink::default(),
    );

    let err = assert_err!(h.pipeline.process_event(&event("a/b/c.pdf", "E")).await);
    assert!(matches!(
        err,
        PipelineError::JobSubmission(JobError::Failed { ref job_id, ref state, .. })
            if job_id == "J4" && state == "FAILED"
    ));
    assert!(h.sink.delivered().is_empty());
    assert!(h.store.gets().is_empty());
}

#[tokio::test]
async fn canceled_job_is_a_failure() {
    let h = Harness::new(
        FakeDocuments::ending_in("J5", LifecycleState::Canceled),
        RecordingSink::default(),
    );
    let err = assert_err!(h.pipeline.process_event(&event("c.pdf", "E")).await);
    assert!(matches!(err, PipelineError::JobSubmission(JobError::Failed { .. })));
    assert!(h.sink.delivered().is_empty());
}

#[tokio::test]
async fn rejected_submission_is_a_failure() {
    let h = Harness::new(FakeDocuments::rejecting(), RecordingSink::default());
    let err = assert_err!(h.pipeline.process_event(&event("c.pdf", "E")).await);
    assert!(matches!(err, PipelineError::JobSubmission(JobError::Rejected { status: 400, .. })));
    assert!(h.sink.delivered().is_empty());
}

#[tokio::test]
async fn missing_result_produces_no_delivery() {
    let h = Harness::succeeding("J6");

    let err = assert_err!(h.pipeline.process_event(&event("a/b/c.pdf", "E")).await);
    match err {
        PipelineError::ResultNotFound { bucket, key } => {
            assert_eq!(bucket, BUCKET_OUT);
            assert_eq!(key, "a/b/J6/NS_IN/results/a/b/c.pdf.json");
        }
        other => panic!("expected ResultNotFound, got {other:?}"),
    }
    assert!(h.sink.delivered().is_empty());
}

#[tokio::test]
async fn missing_input_object_is_a_storage_failure() {
    let h = Harness::succeeding("J7");
    h.store.put_json(BUCKET_OUT, "J7/NS_IN/results/c.pdf.json", &json!({}));

    let err = assert_err!(h.pipeline.process_event(&event("c.pdf", "E")).await);
    assert!(matches!(
        err,
        PipelineError::StorageAccess { source: StorageError::NotFound, .. }
    ));
    assert!(h.sink.delivered().is_empty());
}

#[tokio::test]
async fn result_storage_error_is_not_reported_as_not_found() {
    let h = Harness::succeeding("J8");
    h.store.fail(BUCKET_OUT, "a/b/J8/NS_IN/results/a/b/c.pdf.json", 503);

    let err = assert_err!(h.pipeline.process_event(&event("a/b/c.pdf", "E")).await);
    assert!(matches!(
        err,
        PipelineError::StorageAccess { source: StorageError::Status { status: 503, .. }, .. }
    ));
}

#[tokio::test]
async fn non_json_result_is_invalid() {
    let h = Harness::succeeding("J10");
    h.store.put(BUCKET_OUT, "a/b/J10/NS_IN/results/a/b/c.pdf.json", "PK\x03\x04", "application/zip");

    let err = assert_err!(h.pipeline.process_event(&event("a/b/c.pdf", "E")).await);
    assert!(matches!(err, PipelineError::InvalidResult { .. }));
    assert!(h.sink.delivered().is_empty());
}

#[tokio::test]
async fn delivery_failure_surfaces_once() {
    let h = Harness::new(FakeDocuments::succeeding("J11"), RecordingSink::failing());
    h.store.put_json(BUCKET_OUT, "a/b/J11/NS_IN/results/a/b/c.pdf.json", &json!({}));

    let err = assert_err!(h.pipeline.process_event(&event("a/b/c.pdf", "E")).await);
    assert!(matches!(err, PipelineError::Delivery(_)));
    assert_eq!(h.sink.delivered().len(), 1);
}

#[tokio::test]
async fn malformed_event_submits_nothing() {
    let h = Harness::succeeding("J12");
    let err = assert_err!(
        h.pipeline
            .process_event(&json!({"data": {"resourceName": "c.pdf"}}))
            .await
    );
    assert!(matches!(err, PipelineError::MalformedEvent(_)));
    assert!(h.documents.requests().is_empty());
}

#[tokio::test]
async fn empty_resource_name_submits_nothing() {
    let h = Harness::succeeding("J12");
    let err = assert_err!(h.pipeline.process_event(&event("", "E")).await);
    assert!(matches!(err, PipelineError::MalformedEvent(_)));
    assert!(h.documents.requests().is_empty());
    assert!(h.store.gets().is_empty());
}

#[tokio::test]
async fn repeated_events_are_independent() {
    let h = Harness::succeeding("J13");
    h.store.put_json(BUCKET_OUT, "a/b/J13/NS_IN/results/a/b/c.pdf.json", &json!({}));

    assert_ok!(h.pipeline.process_event(&event("a/b/c.pdf", "E")).await);
    assert_ok!(h.pipeline.process_event(&event("a/b/c.pdf", "E")).await);

    let requests = h.documents.requests();
    assert_eq!(requests.len(), 2);
    assert_ne!(requests[0].display_name, requests[1].display_name);
    assert_eq!(h.sink.delivered().len(), 2);
}

// ── Top-level handler ────────────────────────────────────────────────────

#[tokio::test]
async fn handle_reports_success_marker() {
    let h = Harness::succeeding("J14");
    h.store.put_json(BUCKET_OUT, "a/b/J14/NS_IN/results/a/b/c.pdf.json", &json!({}));

    let body = event("a/b/c.pdf", "E").to_string();
    let response = h.pipeline.handle(body.as_bytes()).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "success");
}

#[tokio::test]
async fn handle_converts_errors_to_500() {
    let h = Harness::new(
        FakeDocuments::ending_in("J15", LifecycleState::Failed),
        RecordingSink::default(),
    );

    let body = event("a/b/c.pdf", "E").to_string();
    let response = h.pipeline.handle(body.as_bytes()).await;
    assert_eq!(response.status, 500);
    assert!(
        response.body.starts_with("Processing failed due to "),
        "got: {}",
        response.body
    );
    assert!(response.body.contains("J15"), "got: {}", response.body);
    assert!(h.sink.delivered().is_empty());
}

#[tokio::test]
async fn handle_rejects_non_json_body() {
    let h = Harness::succeeding("J16");
    let response = h.pipeline.handle(b"<xml/>").await;
    assert_eq!(response.status, 500);
    assert!(response.body.contains("Malformed event"), "got: {}", response.body);
    assert!(h.documents.requests().is_empty());
}
