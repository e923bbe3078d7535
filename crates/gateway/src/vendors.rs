use crate::config::GatewayConfig;
use anyhow::Context as _;
use revops_vendor_clients::google::{CALENDAR_SCOPE, GMAIL_SEND_SCOPE};
use revops_vendor_clients::{
    CalendarApi, CalendarClient, GmailApi, GmailClient, SalesforceApi, SalesforceClient,
    SalesforceLogin, ServiceAccountCredentials,
};
use std::sync::Arc;
use std::time::Duration;

/// The vendor seams tool handlers call through.
#[derive(Clone)]
pub struct Vendors {
    pub gmail: Arc<dyn GmailApi>,
    pub calendar: Arc<dyn CalendarApi>,
    pub salesforce: Arc<dyn SalesforceApi>,
}

impl Vendors {
    /// Build the real HTTP clients. No network traffic happens here; credentials are
    /// obtained per call.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(cfg: &GatewayConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs.max(1)))
            .user_agent(concat!("revops-mcp-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build vendor http client")?;

        let google = &cfg.google;
        let gmail_creds = ServiceAccountCredentials::new(
            http.clone(),
            google.gmail_key_file.clone(),
            &google.mailbox,
            &[GMAIL_SEND_SCOPE],
        )
        .with_token_uri(google.token_uri.clone());
        let calendar_creds = ServiceAccountCredentials::new(
            http.clone(),
            google.calendar_key_file.clone(),
            &google.mailbox,
            &[CALENDAR_SCOPE],
        )
        .with_token_uri(google.token_uri.clone());

        let sf = &cfg.salesforce;
        let mut login = SalesforceLogin::new(
            http.clone(),
            &sf.username,
            &sf.password,
            &sf.security_token,
        )
        .with_domain(&sf.domain)
        .with_api_version(&sf.api_version)
        .with_client_name(&sf.client_name);
        if let Some(url) = sf.login_url.as_deref().filter(|u| !u.trim().is_empty()) {
            login = login.with_login_base(url.trim());
        }

        Ok(Self {
            gmail: Arc::new(GmailClient::new(
                http.clone(),
                &google.gmail_base_url,
                Arc::new(gmail_creds),
            )),
            calendar: Arc::new(CalendarClient::new(
                http,
                &google.calendar_base_url,
                Arc::new(calendar_creds),
            )),
            salesforce: Arc::new(SalesforceClient::new(login)),
        })
    }
}
