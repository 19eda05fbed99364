//! Process-wide configuration for the relay.
//!
//! All behaviour is controlled through [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. The config is constructed and validated once at
//! startup, then held read-only inside [`crate::handler::Pipeline`] for the
//! lifetime of the process. A missing required key is fatal: the process must
//! not accept invocations it cannot complete.

use crate::error::PipelineError;
use reqwest::Url;
use std::fmt;
use std::time::Duration;

/// Environment variable names read by [`PipelineConfig::from_env`].
pub mod keys {
    pub const NAMESPACE: &str = "NAMESPACE_NAME";
    pub const COMPARTMENT: &str = "COMPARTMENT_OCID";
    pub const BUCKET_IN: &str = "BUCKET_NAME_IN";
    pub const BUCKET_OUT: &str = "BUCKET_NAME_OUT";
    pub const DESTINATION_URL: &str = "DESTINATION_URL";
    pub const OBJECT_STORAGE_ENDPOINT: &str = "OBJECT_STORAGE_ENDPOINT";
    pub const DOCUMENT_AI_ENDPOINT: &str = "DOCUMENT_AI_ENDPOINT";
    pub const AUTH_TOKEN: &str = "DOCRELAY_AUTH_TOKEN";
    pub const POLL_INTERVAL_MS: &str = "DOCRELAY_POLL_INTERVAL_MS";
    pub const MAX_WAIT_SECS: &str = "DOCRELAY_MAX_WAIT_SECS";
    pub const HTTP_TIMEOUT_SECS: &str = "DOCRELAY_HTTP_TIMEOUT_SECS";
}

/// Configuration for the relay pipeline.
///
/// # Example
/// ```rust
/// use docrelay::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .namespace("ns")
///     .compartment_id("ocid1.compartment.oc1..aaaa")
///     .input_bucket("incoming")
///     .output_bucket("extracted")
///     .destination_url("https://erp.example.com/invoices")
///     .build()
///     .unwrap();
/// assert_eq!(config.input_bucket, "incoming");
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Object storage namespace shared by both buckets.
    pub namespace: String,

    /// Compartment the extraction job is created in.
    pub compartment_id: String,

    /// Bucket the triggering objects land in.
    pub input_bucket: String,

    /// Bucket the extraction service writes its results to.
    pub output_bucket: String,

    /// Receiver of the outbound payload.
    pub destination_url: Url,

    /// Base URL of the object storage REST API.
    pub object_storage_endpoint: Url,

    /// Base URL of the document-understanding REST API.
    pub document_ai_endpoint: Url,

    /// Bearer token forwarded to both service endpoints, if any.
    pub auth_token: Option<String>,

    /// Interval between job-status polls. Default: 5 s.
    ///
    /// Belongs to the extraction-service client, not to the pipeline: the
    /// pipeline only ever awaits "job reached a terminal state".
    pub poll_interval: Duration,

    /// Upper bound on how long the client waits for a terminal job state.
    /// Default: 1200 s.
    pub max_wait: Duration,

    /// Per-request timeout for every outbound HTTP call. Default: 60 s.
    pub http_timeout: Duration,
}

pub const DEFAULT_OBJECT_STORAGE_ENDPOINT: &str =
    "https://objectstorage.us-ashburn-1.oraclecloud.com";
pub const DEFAULT_DOCUMENT_AI_ENDPOINT: &str = "https://document.aiservice.us-ashburn-1.oci.oraclecloud.com";

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("namespace", &self.namespace)
            .field("compartment_id", &self.compartment_id)
            .field("input_bucket", &self.input_bucket)
            .field("output_bucket", &self.output_bucket)
            .field("destination_url", &self.destination_url.as_str())
            .field("object_storage_endpoint", &self.object_storage_endpoint.as_str())
            .field("document_ai_endpoint", &self.document_ai_endpoint.as_str())
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("poll_interval", &self.poll_interval)
            .field("max_wait", &self.max_wait)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration from an arbitrary key lookup.
    ///
    /// Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = Self::builder();
        if let Some(v) = get(keys::NAMESPACE) {
            builder = builder.namespace(v);
        }
        if let Some(v) = get(keys::COMPARTMENT) {
            builder = builder.compartment_id(v);
        }
        if let Some(v) = get(keys::BUCKET_IN) {
            builder = builder.input_bucket(v);
        }
        if let Some(v) = get(keys::BUCKET_OUT) {
            builder = builder.output_bucket(v);
        }
        if let Some(v) = get(keys::DESTINATION_URL) {
            builder = builder.destination_url(v);
        }
        if let Some(v) = get(keys::OBJECT_STORAGE_ENDPOINT) {
            builder = builder.object_storage_endpoint(v);
        }
        if let Some(v) = get(keys::DOCUMENT_AI_ENDPOINT) {
            builder = builder.document_ai_endpoint(v);
        }
        if let Some(v) = get(keys::AUTH_TOKEN) {
            builder = builder.auth_token(v);
        }
        if let Some(v) = get(keys::POLL_INTERVAL_MS) {
            builder = builder.poll_interval(Duration::from_millis(parse_number(
                keys::POLL_INTERVAL_MS,
                &v,
            )?));
        }
        if let Some(v) = get(keys::MAX_WAIT_SECS) {
            builder = builder.max_wait(Duration::from_secs(parse_number(keys::MAX_WAIT_SECS, &v)?));
        }
        if let Some(v) = get(keys::HTTP_TIMEOUT_SECS) {
            builder = builder.http_timeout(Duration::from_secs(parse_number(
                keys::HTTP_TIMEOUT_SECS,
                &v,
            )?));
        }
        builder.build()
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<u64, PipelineError> {
    value
        .trim()
        .parse()
        .map_err(|e| PipelineError::Configuration {
            key,
            reason: format!("'{value}' is not a whole number ({e})"),
        })
}

/// Builder for [`PipelineConfig`].
///
/// Every setter takes the raw value; parsing, the required-key check and the
/// duration bounds happen in [`PipelineConfigBuilder::build`].
#[derive(Debug, Clone)]
pub struct PipelineConfigBuilder {
    namespace: Option<String>,
    compartment_id: Option<String>,
    input_bucket: Option<String>,
    output_bucket: Option<String>,
    destination_url: Option<String>,
    object_storage_endpoint: String,
    document_ai_endpoint: String,
    auth_token: Option<String>,
    poll_interval: Duration,
    max_wait: Duration,
    http_timeout: Duration,
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self {
            namespace: None,
            compartment_id: None,
            input_bucket: None,
            output_bucket: None,
            destination_url: None,
            object_storage_endpoint: DEFAULT_OBJECT_STORAGE_ENDPOINT.to_string(),
            document_ai_endpoint: DEFAULT_DOCUMENT_AI_ENDPOINT.to_string(),
            auth_token: None,
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(1200),
            http_timeout: Duration::from_secs(60),
        }
    }
}

impl PipelineConfigBuilder {
    pub fn namespace(mut self, v: impl Into<String>) -> Self {
        self.namespace = Some(v.into());
        self
    }

    pub fn compartment_id(mut self, v: impl Into<String>) -> Self {
        self.compartment_id = Some(v.into());
        self
    }

    pub fn input_bucket(mut self, v: impl Into<String>) -> Self {
        self.input_bucket = Some(v.into());
        self
    }

    pub fn output_bucket(mut self, v: impl Into<String>) -> Self {
        self.output_bucket = Some(v.into());
        self
    }

    pub fn destination_url(mut self, v: impl Into<String>) -> Self {
        self.destination_url = Some(v.into());
        self
    }

    pub fn object_storage_endpoint(mut self, v: impl Into<String>) -> Self {
        self.object_storage_endpoint = v.into();
        self
    }

    pub fn document_ai_endpoint(mut self, v: impl Into<String>) -> Self {
        self.document_ai_endpoint = v.into();
        self
    }

    pub fn auth_token(mut self, v: impl Into<String>) -> Self {
        self.auth_token = Some(v.into());
        self
    }

    pub fn poll_interval(mut self, d: Duration) -> Self {
        self.poll_interval = d;
        self
    }

    pub fn max_wait(mut self, d: Duration) -> Self {
        self.max_wait = d;
        self
    }

    pub fn http_timeout(mut self, d: Duration) -> Self {
        self.http_timeout = d;
        self
    }

    /// Build the configuration, checking required keys first and in the
    /// order they are documented.
    pub fn build(self) -> Result<PipelineConfig, PipelineError> {
        let namespace = required(keys::NAMESPACE, self.namespace)?;
        let compartment_id = required(keys::COMPARTMENT, self.compartment_id)?;
        let input_bucket = required(keys::BUCKET_IN, self.input_bucket)?;
        let output_bucket = required(keys::BUCKET_OUT, self.output_bucket)?;
        let destination_url = required(keys::DESTINATION_URL, self.destination_url)?;

        non_zero(keys::POLL_INTERVAL_MS, self.poll_interval)?;
        non_zero(keys::MAX_WAIT_SECS, self.max_wait)?;
        non_zero(keys::HTTP_TIMEOUT_SECS, self.http_timeout)?;
        if self.max_wait < self.poll_interval {
            return Err(PipelineError::Configuration {
                key: keys::MAX_WAIT_SECS,
                reason: format!(
                    "{:?} is shorter than the poll interval {:?}",
                    self.max_wait, self.poll_interval
                ),
            });
        }

        Ok(PipelineConfig {
            namespace,
            compartment_id,
            input_bucket,
            output_bucket,
            destination_url: parse_http_url(keys::DESTINATION_URL, &destination_url)?,
            object_storage_endpoint: parse_http_url(
                keys::OBJECT_STORAGE_ENDPOINT,
                &self.object_storage_endpoint,
            )?,
            document_ai_endpoint: parse_http_url(
                keys::DOCUMENT_AI_ENDPOINT,
                &self.document_ai_endpoint,
            )?,
            auth_token: self.auth_token,
            poll_interval: self.poll_interval,
            max_wait: self.max_wait,
            http_timeout: self.http_timeout,
        })
    }
}

fn required(key: &'static str, value: Option<String>) -> Result<String, PipelineError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(PipelineError::MissingConfiguration { key }),
    }
}

fn non_zero(key: &'static str, value: Duration) -> Result<(), PipelineError> {
    if value.is_zero() {
        return Err(PipelineError::Configuration {
            key,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

fn parse_http_url(key: &'static str, raw: &str) -> Result<Url, PipelineError> {
    let url = Url::parse(raw.trim()).map_err(|e| PipelineError::Configuration {
        key,
        reason: format!("'{raw}' is not a URL ({e})"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PipelineError::Configuration {
            key,
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, String> {
        HashMap::from([
            (keys::NAMESPACE, "ns".to_string()),
            (keys::COMPARTMENT, "ocid1.compartment".to_string()),
            (keys::BUCKET_IN, "in".to_string()),
            (keys::BUCKET_OUT, "out".to_string()),
            (keys::DESTINATION_URL, "https://sink.example.com/hook".to_string()),
        ])
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<PipelineConfig, PipelineError> {
        PipelineConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn loads_required_keys_with_defaults() {
        let config = load(&full_env()).unwrap();
        assert_eq!(config.namespace, "ns");
        assert_eq!(config.output_bucket, "out");
        assert_eq!(config.destination_url.as_str(), "https://sink.example.com/hook");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.max_wait, Duration::from_secs(1200));
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn each_required_key_is_fatal_when_missing() {
        for key in [
            keys::NAMESPACE,
            keys::COMPARTMENT,
            keys::BUCKET_IN,
            keys::BUCKET_OUT,
            keys::DESTINATION_URL,
        ] {
            let mut env = full_env();
            env.remove(key);
            match load(&env) {
                Err(PipelineError::MissingConfiguration { key: k }) => assert_eq!(k, key),
                other => panic!("expected missing {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let mut env = full_env();
        env.insert(keys::BUCKET_IN, "  ".to_string());
        assert!(matches!(
            load(&env),
            Err(PipelineError::MissingConfiguration { key: keys::BUCKET_IN })
        ));
    }

    #[test]
    fn rejects_non_http_destination() {
        let mut env = full_env();
        env.insert(keys::DESTINATION_URL, "ftp://sink".to_string());
        assert!(matches!(
            load(&env),
            Err(PipelineError::Configuration { key: keys::DESTINATION_URL, .. })
        ));
    }

    #[test]
    fn parses_optional_tuning_keys() {
        let mut env = full_env();
        env.insert(keys::POLL_INTERVAL_MS, "250".to_string());
        env.insert(keys::MAX_WAIT_SECS, "30".to_string());
        env.insert(keys::AUTH_TOKEN, "secret".to_string());
        let config = load(&env).unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.max_wait, Duration::from_secs(30));
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn rejects_garbage_numbers() {
        let mut env = full_env();
        env.insert(keys::MAX_WAIT_SECS, "soon".to_string());
        assert!(matches!(
            load(&env),
            Err(PipelineError::Configuration { key: keys::MAX_WAIT_SECS, .. })
        ));
    }

    #[test]
    fn rejects_zero_durations() {
        for key in [
            keys::POLL_INTERVAL_MS,
            keys::MAX_WAIT_SECS,
            keys::HTTP_TIMEOUT_SECS,
        ] {
            let mut env = full_env();
            env.insert(key, "0".to_string());
            match load(&env) {
                Err(PipelineError::Configuration { key: k, .. }) => assert_eq!(k, key),
                other => panic!("expected {key} to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn max_wait_must_cover_one_poll() {
        let mut env = full_env();
        env.insert(keys::POLL_INTERVAL_MS, "5000".to_string());
        env.insert(keys::MAX_WAIT_SECS, "2".to_string());
        assert!(matches!(
            load(&env),
            Err(PipelineError::Configuration { key: keys::MAX_WAIT_SECS, .. })
        ));

        let config = PipelineConfig::builder()
            .namespace("ns")
            .compartment_id("c")
            .input_bucket("in")
            .output_bucket("out")
            .destination_url("http://sink")
            .poll_interval(Duration::from_millis(10))
            .max_wait(Duration::from_millis(10))
            .build()
            .unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(10));
    }
}
