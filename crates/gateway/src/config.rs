//! Gateway configuration.
//!
//! The gateway is configured once at startup from an optional YAML file, then overridden by
//! CLI flags / env vars (see `main.rs`). The resulting [`GatewayConfig`] is passed explicitly
//! into the gateway; nothing reads ambient configuration afterwards.

use revops_vendor_clients::google::{DEFAULT_CALENDAR_BASE_URL, DEFAULT_GMAIL_BASE_URL};
use revops_vendor_clients::salesforce::{DEFAULT_API_VERSION, DEFAULT_DOMAIN};
use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    /// The single shared secret every `POST /` request must present.
    #[serde(default)]
    pub api_key: String,
    /// Outbound HTTP timeout for vendor calls (seconds).
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub salesforce: SalesforceConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GoogleConfig {
    /// Service-account key with the `gmail.send` scope delegated.
    #[serde(default)]
    pub gmail_key_file: Option<PathBuf>,
    /// Service-account key with the `calendar` scope delegated.
    #[serde(default)]
    pub calendar_key_file: Option<PathBuf>,
    /// Mailbox impersonated for both Gmail and Calendar (and the default free/busy calendar).
    #[serde(default)]
    pub mailbox: String,
    /// Overrides the key file's `token_uri`.
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default = "default_gmail_base_url")]
    pub gmail_base_url: String,
    #[serde(default = "default_calendar_base_url")]
    pub calendar_base_url: String,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SalesforceConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub security_token: String,
    /// `login`, `test`, or a My Domain prefix.
    #[serde(default = "default_salesforce_domain")]
    pub domain: String,
    /// Explicit login base URL; takes precedence over `domain`.
    #[serde(default)]
    pub login_url: Option<String>,
    #[serde(default = "default_salesforce_api_version")]
    pub api_version: String,
    #[serde(default = "default_salesforce_client_name")]
    pub client_name: String,
    #[serde(default)]
    pub task: TaskDefaults,
}

/// Org-specific ids stamped on every logged Task.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskDefaults {
    #[serde(default = "default_task_record_type_id")]
    pub record_type_id: String,
    #[serde(default = "default_task_owner_id")]
    pub owner_id: String,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_gmail_base_url() -> String {
    DEFAULT_GMAIL_BASE_URL.to_string()
}

fn default_calendar_base_url() -> String {
    DEFAULT_CALENDAR_BASE_URL.to_string()
}

fn default_salesforce_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

fn default_salesforce_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_salesforce_client_name() -> String {
    "revops-mcp-gateway".to_string()
}

fn default_task_record_type_id() -> String {
    "012f100000116jjAAA".to_string()
}

fn default_task_owner_id() -> String {
    "005Qk000001pqtdIAA".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            api_key: String::new(),
            http_timeout_secs: default_http_timeout_secs(),
            google: GoogleConfig::default(),
            salesforce: SalesforceConfig::default(),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            gmail_key_file: None,
            calendar_key_file: None,
            mailbox: String::new(),
            token_uri: None,
            gmail_base_url: default_gmail_base_url(),
            calendar_base_url: default_calendar_base_url(),
        }
    }
}

impl Default for SalesforceConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            security_token: String::new(),
            domain: default_salesforce_domain(),
            login_url: None,
            api_version: default_salesforce_api_version(),
            client_name: default_salesforce_client_name(),
            task: TaskDefaults::default(),
        }
    }
}

impl Default for TaskDefaults {
    fn default() -> Self {
        Self {
            record_type_id: default_task_record_type_id(),
            owner_id: default_task_owner_id(),
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("bind", &self.bind)
            .field("api_key", &redacted(&self.api_key))
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("google", &self.google)
            .field("salesforce", &self.salesforce)
            .finish()
    }
}

impl fmt::Debug for SalesforceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SalesforceConfig")
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("security_token", &redacted(&self.security_token))
            .field("domain", &self.domain)
            .field("login_url", &self.login_url)
            .field("api_version", &self.api_version)
            .field("client_name", &self.client_name)
            .field("task", &self.task)
            .finish()
    }
}

fn redacted(s: &str) -> &'static str {
    if s.is_empty() { "<unset>" } else { "<redacted>" }
}

impl GatewayConfig {
    /// Load a YAML config file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid config YAML.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Parse config YAML. An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid YAML or unknown keys.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Non-fatal problems worth logging at startup.
    #[must_use]
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.api_key.trim().is_empty() {
            out.push("api key is empty; every MCP request will be rejected");
        }
        let google_configured =
            self.google.gmail_key_file.is_some() || self.google.calendar_key_file.is_some();
        if google_configured && self.google.mailbox.trim().is_empty() {
            out.push("google key files are set but no mailbox to impersonate");
        }
        if self.google.gmail_key_file.is_none() {
            out.push("gmail key file not set; send_email will fail");
        }
        if self.google.calendar_key_file.is_none() {
            out.push("calendar key file not set; calendar tools will fail");
        }
        if self.salesforce.username.trim().is_empty() {
            out.push("salesforce username not set; salesforce tools will fail");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = GatewayConfig::from_yaml_str("").expect("parse");
        assert_eq!(cfg.bind, default_bind());
        assert_eq!(cfg.http_timeout_secs, 30);
        assert_eq!(cfg.salesforce.api_version, "59.0");
        assert_eq!(cfg.salesforce.task.record_type_id, "012f100000116jjAAA");
        assert_eq!(cfg.salesforce.task.owner_id, "005Qk000001pqtdIAA");
        assert!(cfg.warnings().iter().any(|w| w.contains("api key")));
    }

    #[test]
    fn parses_nested_camel_case_sections() {
        let cfg = GatewayConfig::from_yaml_str(
            r#"
bind: 127.0.0.1:9000
apiKey: s3cret
google:
  gmailKeyFile: /etc/revops/gmail.json
  calendarKeyFile: /etc/revops/calendar.json
  mailbox: owner@example.com
salesforce:
  username: ops@example.com
  domain: test
  task:
    ownerId: "005000000000001"
"#,
        )
        .expect("parse");
        assert_eq!(cfg.bind.port(), 9000);
        assert_eq!(cfg.api_key, "s3cret");
        assert_eq!(cfg.google.mailbox, "owner@example.com");
        assert_eq!(cfg.salesforce.domain, "test");
        assert_eq!(cfg.salesforce.task.owner_id, "005000000000001");
        assert_eq!(cfg.salesforce.task.record_type_id, "012f100000116jjAAA");
        assert!(cfg.warnings().is_empty());
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = GatewayConfig::from_yaml_str("apiKey: x\nmystery: 1\n").expect_err("unknown key");
        assert!(err.to_string().contains("mystery"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut cfg = GatewayConfig::default();
        cfg.api_key = "top-secret".to_string();
        cfg.salesforce.password = "hunter2".to_string();
        let s = format!("{cfg:?}");
        assert!(!s.contains("top-secret"));
        assert!(!s.contains("hunter2"));
        assert!(s.contains("<redacted>"));
    }
}
