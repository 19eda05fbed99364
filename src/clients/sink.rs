//! Outbound delivery: one JSON POST, response not inspected.

use super::PayloadSink;
use crate::error::DeliveryError;
use crate::model::OutboundPayload;
use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, warn};

/// POSTs the payload to a fixed destination.
#[derive(Debug, Clone)]
pub struct HttpPayloadSink {
    client: reqwest::Client,
    url: Url,
}

impl HttpPayloadSink {
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl PayloadSink for HttpPayloadSink {
    async fn deliver(&self, payload: &OutboundPayload) -> Result<(), DeliveryError> {
        // `.json()` sets `content-type: application/json`.
        let response = self
            .client
            .post(self.url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| DeliveryError {
                url: self.url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            debug!("Destination answered {}", status);
        } else {
            warn!("Destination answered {} (not treated as a failure)", status);
        }
        Ok(())
    }
}
