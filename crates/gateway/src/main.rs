use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use revops_mcp_gateway::{Gateway, GatewayConfig, serve};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Authenticated MCP gateway exposing Gmail, Google Calendar and Salesforce tools.
#[derive(Debug, Parser)]
#[command(name = "revops-mcp-gateway", version, about, long_about = None)]
struct Args {
    /// YAML config file; flags and env vars override its values.
    #[arg(long, env = "REVOPS_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address (default 0.0.0.0:8000).
    #[arg(long, env = "REVOPS_MCP_BIND")]
    bind: Option<SocketAddr>,

    /// Shared api key callers present as `Authorization: Bearer <key>`.
    #[arg(long, env = "MCP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "REVOPS_MCP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "REVOPS_MCP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Vendor HTTP timeout in seconds.
    #[arg(long, env = "REVOPS_MCP_HTTP_TIMEOUT_SECS")]
    http_timeout_secs: Option<u64>,

    /// Mailbox impersonated through domain-wide delegation.
    #[arg(long, env = "REVOPS_MCP_IMPERSONATE")]
    impersonate: Option<String>,

    #[arg(long, env = "REVOPS_MCP_GMAIL_KEY_FILE")]
    gmail_key_file: Option<PathBuf>,

    #[arg(long, env = "REVOPS_MCP_CALENDAR_KEY_FILE")]
    calendar_key_file: Option<PathBuf>,

    #[arg(long, env = "REVOPS_MCP_GOOGLE_TOKEN_URI")]
    google_token_uri: Option<String>,

    #[arg(long, env = "REVOPS_MCP_GMAIL_BASE_URL")]
    gmail_base_url: Option<String>,

    #[arg(long, env = "REVOPS_MCP_CALENDAR_BASE_URL")]
    calendar_base_url: Option<String>,

    #[arg(long, env = "SALESFORCE_USER")]
    salesforce_user: Option<String>,

    #[arg(long, env = "SALESFORCE_PASSWORD", hide_env_values = true)]
    salesforce_password: Option<String>,

    #[arg(long, env = "SALESFORCE_TOKEN", hide_env_values = true)]
    salesforce_token: Option<String>,

    /// `login`, `test`, or a My Domain prefix.
    #[arg(long, env = "REVOPS_MCP_SALESFORCE_DOMAIN")]
    salesforce_domain: Option<String>,

    /// Explicit login base URL; overrides the domain.
    #[arg(long, env = "REVOPS_MCP_SALESFORCE_LOGIN_URL")]
    salesforce_login_url: Option<String>,

    #[arg(long, env = "REVOPS_MCP_SALESFORCE_API_VERSION")]
    salesforce_api_version: Option<String>,
}

impl Args {
    fn apply_to(self, cfg: &mut GatewayConfig) {
        if let Some(v) = self.bind {
            cfg.bind = v;
        }
        if let Some(v) = self.api_key {
            cfg.api_key = v;
        }
        if let Some(v) = self.http_timeout_secs {
            cfg.http_timeout_secs = v;
        }
        if let Some(v) = self.impersonate {
            cfg.google.mailbox = v;
        }
        if self.gmail_key_file.is_some() {
            cfg.google.gmail_key_file = self.gmail_key_file;
        }
        if self.calendar_key_file.is_some() {
            cfg.google.calendar_key_file = self.calendar_key_file;
        }
        if self.google_token_uri.is_some() {
            cfg.google.token_uri = self.google_token_uri;
        }
        if let Some(v) = self.gmail_base_url {
            cfg.google.gmail_base_url = v;
        }
        if let Some(v) = self.calendar_base_url {
            cfg.google.calendar_base_url = v;
        }
        if let Some(v) = self.salesforce_user {
            cfg.salesforce.username = v;
        }
        if let Some(v) = self.salesforce_password {
            cfg.salesforce.password = v;
        }
        if let Some(v) = self.salesforce_token {
            cfg.salesforce.security_token = v;
        }
        if let Some(v) = self.salesforce_domain {
            cfg.salesforce.domain = v;
        }
        if self.salesforce_login_url.is_some() {
            cfg.salesforce.login_url = self.salesforce_login_url;
        }
        if let Some(v) = self.salesforce_api_version {
            cfg.salesforce.api_version = v;
        }
    }
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args.log_level, args.log_format);

    let mut cfg = match args.config.as_deref() {
        Some(path) => GatewayConfig::from_yaml_file(path)?,
        None => GatewayConfig::default(),
    };
    args.apply_to(&mut cfg);
    for w in cfg.warnings() {
        tracing::warn!("{w}");
    }

    let gateway = Arc::new(Gateway::from_config(&cfg)?);
    let listener = tokio::net::TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("bind {}", cfg.bind))?;
    let addr = listener.local_addr().context("listener local_addr")?;
    tracing::info!(%addr, tools = gateway.registry().tools().len(), "revops mcp gateway listening");

    serve(listener, gateway, shutdown_signal()).await
}
