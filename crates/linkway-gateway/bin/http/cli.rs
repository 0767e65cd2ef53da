use clap::{Parser, ValueEnum};
use linkway_telemetry::{LogFormat, TelemetryConfig};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use url::Url;

pub const LISTEN_ADDR_ENV: &str = "LINKWAY_LISTEN_ADDR";
pub const BASE_URL_ENV: &str = "LINKWAY_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "LINKWAY_STORAGE_BACKEND";
pub const POSTGRES_DSN_ENV: &str = "LINKWAY_POSTGRES_DSN";
pub const GENERATOR_ENV: &str = "LINKWAY_GENERATOR";
pub const CODE_LENGTH_ENV: &str = "LINKWAY_CODE_LENGTH";
pub const GENERATOR_PREFIX_ENV: &str = "LINKWAY_GENERATOR_PREFIX";
pub const MAX_ATTEMPTS_ENV: &str = "LINKWAY_MAX_ATTEMPTS";
pub const LOG_FORMAT_ENV: &str = "LINKWAY_LOG_FORMAT";
pub const OTLP_ENDPOINT_ENV: &str = "LINKWAY_OTLP_ENDPOINT";

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_GENERATOR_PREFIX: &str = "lw";

pub const SERVICE_NAME: &str = "linkway";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "postgres")]
    Postgres,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GeneratorArg {
    Random,
    Sequential,
}

impl Display for GeneratorArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorArg::Random => write!(f, "random"),
            GeneratorArg::Sequential => write!(f, "sequential"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "linkway", about = "URL shortener with 307 redirects")]
pub struct Cli {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Public origin short links are built on, e.g. `https://lnk.way`.
    /// Links are served at the root, so it cannot carry a path.
    #[arg(
        long,
        env = BASE_URL_ENV,
        default_value = DEFAULT_BASE_URL,
        value_parser = parse_base_url
    )]
    pub base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = POSTGRES_DSN_ENV, required_if_eq("storage", "postgres"))]
    pub postgres_dsn: Option<String>,

    #[arg(
        long,
        env = GENERATOR_ENV,
        value_enum,
        default_value_t = GeneratorArg::Random
    )]
    pub generator: GeneratorArg,

    /// Length of random codes (6-8).
    #[arg(long, env = CODE_LENGTH_ENV, default_value_t = linkway_generator::random::DEFAULT_LENGTH)]
    pub code_length: usize,

    /// Prefix of sequential codes.
    #[arg(long, env = GENERATOR_PREFIX_ENV, default_value = DEFAULT_GENERATOR_PREFIX)]
    pub generator_prefix: String,

    /// Codes tried per request before giving up.
    #[arg(long, env = MAX_ATTEMPTS_ENV, default_value_t = 5)]
    pub max_attempts: u32,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    /// OTLP gRPC collector endpoint; span export is off when unset.
    #[arg(long, env = OTLP_ENDPOINT_ENV)]
    pub otlp_endpoint: Option<String>,
}

fn parse_base_url(raw: &str) -> Result<String, String> {
    let url = Url::parse(raw).map_err(|e| format!("not an absolute URL: {e}"))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("scheme must be http or https, got {}", url.scheme()));
    }
    if url.path() != "/" {
        return Err(format!(
            "short links are served at the root, drop the path {:?}",
            url.path()
        ));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a query or fragment".to_string());
    }

    Ok(raw.trim_end_matches('/').to_string())
}

impl Cli {
    pub fn telemetry_config(&self) -> TelemetryConfig {
        let config = TelemetryConfig::builder()
            .service_name(SERVICE_NAME)
            .format(self.log_format.into());

        match &self.otlp_endpoint {
            Some(endpoint) => config.otlp_endpoint(endpoint.clone()).build(),
            None => config.build(),
        }
    }
}
