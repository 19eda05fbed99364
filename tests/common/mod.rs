//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use docrelay::model::{ExtractionJobRequest, OutboundPayload, ProcessorJob, StoredObject};
use docrelay::{
    DeliveryError, DocumentService, JobError, LifecycleState, ObjectStore, PayloadSink, Pipeline,
    PipelineConfig, StorageError, StorageObjectRef,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const NS: &str = "NS";
pub const BUCKET_IN: &str = "IN";
pub const BUCKET_OUT: &str = "OUT";

pub fn config() -> PipelineConfig {
    PipelineConfig::builder()
        .namespace(NS)
        .compartment_id("ocid1.compartment.test")
        .input_bucket(BUCKET_IN)
        .output_bucket(BUCKET_OUT)
        .destination_url("http://sink.invalid/hook")
        .build()
        .expect("test config is complete")
}

pub fn event(resource: &str, etag: &str) -> serde_json::Value {
    serde_json::json!({
        "eventType": "com.oraclecloud.objectstorage.createobject",
        "data": {
            "resourceName": resource,
            "additionalDetails": { "eTag": etag }
        }
    })
}

// ── Object store ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeStore {
    objects: Mutex<HashMap<StorageObjectRef, StoredObject>>,
    errors: Mutex<HashMap<StorageObjectRef, u16>>,
    gets: Mutex<Vec<StorageObjectRef>>,
}

impl FakeStore {
    pub fn put(&self, bucket: &str, key: &str, content: impl Into<Bytes>, content_type: &str) {
        self.objects.lock().unwrap().insert(
            StorageObjectRef::new(NS, bucket, key),
            StoredObject {
                content: content.into(),
                content_type: Some(content_type.to_string()),
                last_modified: Some("Sun, 18 Oct 2026 09:00:00 GMT".to_string()),
            },
        );
    }

    pub fn put_json(&self, bucket: &str, key: &str, value: &serde_json::Value) {
        self.put(bucket, key, value.to_string(), "application/json");
    }

    pub fn fail(&self, bucket: &str, key: &str, status: u16) {
        self.errors
            .lock()
            .unwrap()
            .insert(StorageObjectRef::new(NS, bucket, key), status);
    }

    pub fn gets(&self) -> Vec<StorageObjectRef> {
        self.gets.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn get_object(&self, object: &StorageObjectRef) -> Result<StoredObject, StorageError> {
        self.gets.lock().unwrap().push(object.clone());
        if let Some(status) = self.errors.lock().unwrap().get(object) {
            return Err(StorageError::Status {
                status: *status,
                body: "injected".to_string(),
            });
        }
        self.objects
            .lock()
            .unwrap()
            .get(object)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

// ── Document service ─────────────────────────────────────────────────────

pub struct FakeDocuments {
    job_id: String,
    terminal: LifecycleState,
    reject: bool,
    requests: Mutex<Vec<ExtractionJobRequest>>,
}

impl FakeDocuments {
    pub fn succeeding(job_id: &str) -> Self {
        Self::ending_in(job_id, LifecycleState::Succeeded)
    }

    pub fn ending_in(job_id: &str, terminal: LifecycleState) -> Self {
        Self {
            job_id: job_id.to_string(),
            terminal,
            reject: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::succeeding("unused")
        }
    }

    pub fn requests(&self) -> Vec<ExtractionJobRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentService for FakeDocuments {
    async fn create_job_and_wait(
        &self,
        request: &ExtractionJobRequest,
    ) -> Result<ProcessorJob, JobError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.reject {
            return Err(JobError::Rejected {
                status: 400,
                body: "quota exceeded".to_string(),
            });
        }
        Ok(ProcessorJob {
            id: self.job_id.clone(),
            lifecycle_state: self.terminal,
            lifecycle_details: (self.terminal != LifecycleState::Succeeded)
                .then(|| "injected failure".to_string()),
        })
    }
}

// ── Sink ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    fail: bool,
    delivered: Mutex<Vec<OutboundPayload>>,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> Vec<OutboundPayload> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl PayloadSink for RecordingSink {
    async fn deliver(&self, payload: &OutboundPayload) -> Result<(), DeliveryError> {
        self.delivered.lock().unwrap().push(payload.clone());
        if self.fail {
            return Err(DeliveryError {
                url: "http://sink.invalid/hook".to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

// ── Harness ──────────────────────────────────────────────────────────────

pub struct Harness {
    pub store: Arc<FakeStore>,
    pub documents: Arc<FakeDocuments>,
    pub sink: Arc<RecordingSink>,
    pub pipeline: Pipeline,
}

impl Harness {
    pub fn new(documents: FakeDocuments, sink: RecordingSink) -> Self {
        let store = Arc::new(FakeStore::default());
        let documents = Arc::new(documents);
        let sink = Arc::new(sink);
        let pipeline = Pipeline::new(config(), store.clone(), documents.clone(), sink.clone());
        Self {
            store,
            documents,
            sink,
            pipeline,
        }
    }

    pub fn succeeding(job_id: &str) -> Self {
        Self::new(FakeDocuments::succeeding(job_id), RecordingSink::default())
    }
}
