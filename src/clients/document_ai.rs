//! Document-understanding service client: create a processor job, then poll
//! it until it reaches a terminal state.
//!
//! ## Polling
//!
//! The service only offers "create" and "get" for jobs, so waiting is a loop:
//! sleep `poll_interval`, GET the job, stop on a terminal state. The loop is
//! bounded by `max_wait`; running past it yields [`JobError::TimedOut`].
//! Nothing is retried: a failed poll ends the wait with the error.

use super::{join_segments, with_auth, DocumentService};
use crate::error::JobError;
use crate::model::{ExtractionJobRequest, ProcessorJob};
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

const API_VERSION: &str = "20221109";

/// Processor-job client over the REST API.
#[derive(Debug, Clone)]
pub struct HttpDocumentService {
    client: reqwest::Client,
    endpoint: Url,
    auth_token: Option<String>,
    poll_interval: Duration,
    max_wait: Duration,
}

impl HttpDocumentService {
    pub fn new(
        client: reqwest::Client,
        endpoint: Url,
        auth_token: Option<String>,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> Self {
        Self {
            client,
            endpoint,
            auth_token,
            poll_interval,
            max_wait,
        }
    }

    fn jobs_url(&self, job_id: Option<&str>) -> Result<Url, JobError> {
        let mut segments = vec![API_VERSION, "processorJobs"];
        if let Some(id) = job_id {
            segments.push(id);
        }
        join_segments(&self.endpoint, &segments)
            .ok_or_else(|| JobError::Transport(format!("cannot build URL from '{}'", self.endpoint)))
    }

    async fn create_job(&self, request: &ExtractionJobRequest) -> Result<ProcessorJob, JobError> {
        let response = with_auth(
            self.client.post(self.jobs_url(None)?).json(request),
            self.auth_token.as_deref(),
        )
        .send()
        .await
        .map_err(|e| JobError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JobError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<ProcessorJob>()
            .await
            .map_err(|e| JobError::Transport(format!("invalid job response: {e}")))
    }

    async fn get_job(&self, job_id: &str) -> Result<ProcessorJob, JobError> {
        let response = with_auth(
            self.client.get(self.jobs_url(Some(job_id))?),
            self.auth_token.as_deref(),
        )
        .send()
        .await
        .map_err(|e| JobError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JobError::Poll {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<ProcessorJob>()
            .await
            .map_err(|e| JobError::Transport(format!("invalid job response: {e}")))
    }
}

#[async_trait]
impl DocumentService for HttpDocumentService {
    async fn create_job_and_wait(
        &self,
        request: &ExtractionJobRequest,
    ) -> Result<ProcessorJob, JobError> {
        let mut job = self.create_job(request).await?;
        info!("Created processor job {} ({})", job.id, job.lifecycle_state);

        let deadline = Instant::now() + self.max_wait;
        while !job.lifecycle_state.is_terminal() {
            if Instant::now() >= deadline {
                return Err(JobError::TimedOut {
                    job_id: job.id,
                    secs: self.max_wait.as_secs(),
                });
            }
            sleep(self.poll_interval).await;
            job = self.get_job(&job.id).await?;
            debug!("Job {}: {}", job.id, job.lifecycle_state);
        }

        Ok(job)
    }
}
