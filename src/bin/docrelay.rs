//! CLI binary for docrelay.
//!
//! A thin shim over the library crate: maps flags (or their environment
//! variables) onto `PipelineConfig`, then either serves invocations over HTTP
//! or runs a single event from a file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docrelay::config::keys;
use docrelay::{Pipeline, PipelineConfig};
use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve invocations on port 8080
  docrelay serve --listen 0.0.0.0:8080

  # Run one event from a file (or '-' for stdin)
  docrelay invoke event.json

EVENT SHAPE:
  { "data": { "resourceName": "invoices/doc1/inv.pdf",
              "additionalDetails": { "eTag": "..." } } }

REQUIRED ENVIRONMENT:
  NAMESPACE_NAME      Object storage namespace
  COMPARTMENT_OCID    Compartment the extraction job runs in
  BUCKET_NAME_IN      Bucket that receives uploads
  BUCKET_NAME_OUT     Bucket the extraction service writes results to
  DESTINATION_URL     Receiver of the assembled payload

OPTIONAL ENVIRONMENT:
  OBJECT_STORAGE_ENDPOINT     Object storage REST endpoint
  DOCUMENT_AI_ENDPOINT        Document-understanding REST endpoint
  DOCRELAY_AUTH_TOKEN         Bearer token for both endpoints
  DOCRELAY_POLL_INTERVAL_MS   Job status poll interval (default 5000)
  DOCRELAY_MAX_WAIT_SECS      Give up waiting on a job after (default 1200)
  DOCRELAY_HTTP_TIMEOUT_SECS  Per-request timeout (default 60)
  RUST_LOG                    Overrides -v / -q
"#;

/// Relay uploaded invoices through a document-understanding service.
#[derive(Parser, Debug)]
#[command(
    name = "docrelay",
    version,
    about = "Relay uploaded invoices through a document-understanding service",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Object storage namespace.
    #[arg(long, global = true, env = keys::NAMESPACE)]
    namespace: Option<String>,

    /// Compartment OCID for extraction jobs.
    #[arg(long, global = true, env = keys::COMPARTMENT)]
    compartment: Option<String>,

    /// Input bucket name.
    #[arg(long, global = true, env = keys::BUCKET_IN)]
    bucket_in: Option<String>,

    /// Output bucket name.
    #[arg(long, global = true, env = keys::BUCKET_OUT)]
    bucket_out: Option<String>,

    /// Destination URL for the payload.
    #[arg(long, global = true, env = keys::DESTINATION_URL)]
    destination_url: Option<String>,

    /// Object storage REST endpoint.
    #[arg(long, global = true, env = keys::OBJECT_STORAGE_ENDPOINT)]
    object_storage_endpoint: Option<String>,

    /// Document-understanding REST endpoint.
    #[arg(long, global = true, env = keys::DOCUMENT_AI_ENDPOINT)]
    document_ai_endpoint: Option<String>,

    /// Bearer token forwarded to both endpoints.
    #[arg(long, global = true, env = keys::AUTH_TOKEN, hide_env_values = true)]
    auth_token: Option<String>,

    /// Job status poll interval in milliseconds.
    #[arg(long, global = true, env = keys::POLL_INTERVAL_MS, default_value_t = 5000)]
    poll_interval_ms: u64,

    /// Maximum time to wait for a job, in seconds.
    #[arg(long, global = true, env = keys::MAX_WAIT_SECS, default_value_t = 1200)]
    max_wait_secs: u64,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, global = true, env = keys::HTTP_TIMEOUT_SECS, default_value_t = 60)]
    http_timeout_secs: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCRELAY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCRELAY_QUIET")]
    quiet: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "DOCRELAY_JSON_LOGS")]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve invocations over HTTP (POST / or /call, GET /health).
    Serve {
        /// Address to listen on.
        #[arg(long, env = "DOCRELAY_LISTEN", default_value = "0.0.0.0:8080")]
        listen: SocketAddr,
    },
    /// Process one event and exit; non-zero exit status on failure.
    Invoke {
        /// Event JSON file, or '-' for stdin.
        event: PathBuf,
    },
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig, docrelay::PipelineError> {
        let mut builder = PipelineConfig::builder()
            .poll_interval(Duration::from_millis(self.poll_interval_ms))
            .max_wait(Duration::from_secs(self.max_wait_secs))
            .http_timeout(Duration::from_secs(self.http_timeout_secs));

        if let Some(ref v) = self.namespace {
            builder = builder.namespace(v);
        }
        if let Some(ref v) = self.compartment {
            builder = builder.compartment_id(v);
        }
        if let Some(ref v) = self.bucket_in {
            builder = builder.input_bucket(v);
        }
        if let Some(ref v) = self.bucket_out {
            builder = builder.output_bucket(v);
        }
        if let Some(ref v) = self.destination_url {
            builder = builder.destination_url(v);
        }
        if let Some(ref v) = self.object_storage_endpoint {
            builder = builder.object_storage_endpoint(v);
        }
        if let Some(ref v) = self.document_ai_endpoint {
            builder = builder.document_ai_endpoint(v);
        }
        if let Some(ref v) = self.auth_token {
            builder = builder.auth_token(v);
        }
        builder.build()
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .init();
    }

    // ── Startup: a missing key means we must not serve ───────────────────
    let config = match cli.pipeline_config() {
        Ok(c) => c,
        Err(e) => {
            error!("ERROR: {}", e);
            return Err(e).context("configuration is incomplete");
        }
    };
    info!(
        "Relaying {}/{} -> {}",
        config.namespace, config.input_bucket, config.destination_url
    );
    let pipeline = Arc::new(Pipeline::from_config(config).context("failed to build pipeline")?);

    match cli.command {
        Command::Serve { listen } => {
            let listener = tokio::net::TcpListener::bind(listen)
                .await
                .with_context(|| format!("cannot listen on {listen}"))?;
            info!("Listening on {}", listen);
            axum::serve(listener, docrelay::server::router(pipeline))
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("server error")?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Invoke { event } => {
            let body = read_event(&event)?;
            let response = pipeline.handle(&body).await;
            println!("{}", response.body);
            Ok(if response.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn read_event(path: &PathBuf) -> Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read event from stdin")?;
        Ok(buf)
    } else {
        std::fs::read(path).with_context(|| format!("failed to read event file {}", path.display()))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
