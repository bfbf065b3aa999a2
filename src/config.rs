use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments; CLI wins.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the remote storage service, without a trailing slash.
    pub supabase_url: String,
    /// Bearer credential sent on every outbound call.
    pub service_key: String,
    /// Bucket all operations target.
    pub bucket: String,
    /// Timeout applied to each outbound storage call.
    pub request_timeout_secs: u64,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP gateway for Supabase-style object storage")]
pub struct Args {
    /// Host to bind to (overrides STORAGE_GATEWAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides STORAGE_GATEWAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Remote storage base URL (overrides SUPABASE_URL)
    #[arg(long)]
    pub supabase_url: Option<String>,

    /// Remote storage service key (overrides SUPABASE_SERVICE_KEY)
    #[arg(long)]
    pub service_key: Option<String>,

    /// Target bucket (overrides SUPABASE_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Outbound request timeout in seconds (overrides STORAGE_GATEWAY_REQUEST_TIMEOUT)
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        Self::from_args(args)
    }

    fn from_args(args: Args) -> Result<Self> {
        // --- Environment fallback ---
        let env_host = env::var("STORAGE_GATEWAY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("STORAGE_GATEWAY_PORT") {
            Ok(value) => Some(
                value
                    .parse::<u16>()
                    .with_context(|| format!("parsing STORAGE_GATEWAY_PORT value `{}`", value))?,
            ),
            Err(env::VarError::NotPresent) => None,
            Err(err) => return Err(err).context("reading STORAGE_GATEWAY_PORT"),
        };
        let env_timeout = match env::var("STORAGE_GATEWAY_REQUEST_TIMEOUT") {
            Ok(value) => Some(value.parse::<u64>().with_context(|| {
                format!("parsing STORAGE_GATEWAY_REQUEST_TIMEOUT value `{}`", value)
            })?),
            Err(env::VarError::NotPresent) => None,
            Err(err) => return Err(err).context("reading STORAGE_GATEWAY_REQUEST_TIMEOUT"),
        };

        // Remote credentials have no sensible default; fail early if absent.
        let supabase_url = args
            .supabase_url
            .or_else(|| env::var("SUPABASE_URL").ok())
            .context("SUPABASE_URL is not set and --supabase-url was not given")?;
        let service_key = args
            .service_key
            .or_else(|| env::var("SUPABASE_SERVICE_KEY").ok())
            .context("SUPABASE_SERVICE_KEY is not set and --service-key was not given")?;
        let bucket = args
            .bucket
            .or_else(|| env::var("SUPABASE_BUCKET").ok())
            .context("SUPABASE_BUCKET is not set and --bucket was not given")?;

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.or(env_port).unwrap_or(3000),
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            service_key,
            bucket,
            request_timeout_secs: args.request_timeout_secs.or(env_timeout).unwrap_or(30),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
