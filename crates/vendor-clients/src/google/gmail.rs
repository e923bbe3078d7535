use super::credentials::AccessTokenSource;
use crate::error::Result;
use crate::http::{join_segments, send_json};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

const VENDOR: &str = "gmail";

#[async_trait]
pub trait GmailApi: Send + Sync {
    /// Send an already-encoded (base64url RFC 5322) message from the delegated mailbox.
    async fn send_raw(&self, raw: String) -> Result<Value>;
}

pub struct GmailClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn AccessTokenSource>,
}

impl GmailClient {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        credentials: Arc<dyn AccessTokenSource>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            credentials,
        }
    }
}

#[async_trait]
impl GmailApi for GmailClient {
    async fn send_raw(&self, raw: String) -> Result<Value> {
        let token = self.credentials.access_token().await?;
        let url = join_segments(
            &self.base_url,
            &["gmail", "v1", "users", "me", "messages", "send"],
        )?;
        let req = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "raw": raw }));
        send_json(VENDOR, req).await
    }
}
