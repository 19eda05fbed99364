//! Object storage over the REST `GetObject` call.

use super::{join_segments, with_auth, ObjectStore};
use crate::error::StorageError;
use crate::model::{StorageObjectRef, StoredObject};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE, LAST_MODIFIED};
use reqwest::{StatusCode, Url};
use tracing::debug;

/// Reads objects with `GET {endpoint}/n/{namespace}/b/{bucket}/o/{key}`.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: Url,
    auth_token: Option<String>,
}

impl HttpObjectStore {
    pub fn new(client: reqwest::Client, endpoint: Url, auth_token: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            auth_token,
        }
    }

    fn object_url(&self, object: &StorageObjectRef) -> Result<Url, StorageError> {
        join_segments(
            &self.endpoint,
            &[
                "n",
                object.namespace.as_str(),
                "b",
                object.bucket.as_str(),
                "o",
                object.key.as_str(),
            ],
        )
        .ok_or_else(|| StorageError::Transport(format!("cannot build URL from '{}'", self.endpoint)))
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get_object(&self, object: &StorageObjectRef) -> Result<StoredObject, StorageError> {
        let url = self.object_url(object)?;
        debug!("GET object {}", object);

        let response = with_auth(self.client.get(url), self.auth_token.as_deref())
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let headers = response.headers().clone();
        let content = response
            .bytes()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        debug!("Fetched {} ({} bytes)", object, content.len());

        Ok(StoredObject {
            content,
            content_type: header_string(&headers, CONTENT_TYPE.as_str()),
            last_modified: header_string(&headers, LAST_MODIFIED.as_str()),
        })
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
