use super::credentials::AccessTokenSource;
use crate::error::Result;
use crate::http::{join_segments, send_json};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const VENDOR: &str = "calendar";

#[async_trait]
pub trait CalendarApi: Send + Sync {
    /// `freeBusy.query` with a fully formed request body.
    async fn free_busy(&self, body: Value) -> Result<Value>;
    /// `events.insert`.
    async fn insert_event(&self, calendar_id: &str, event: Value) -> Result<Value>;
    /// `events.patch` (only the supplied fields change).
    async fn patch_event(&self, calendar_id: &str, event_id: &str, event: Value) -> Result<Value>;
    /// `events.delete`.
    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()>;
}

pub struct CalendarClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn AccessTokenSource>,
}

impl CalendarClient {
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
impl CalendarApi for CalendarClient {
    async fn free_busy(&self, body: Value) -> Result<Value> {
        let token = self.credentials.access_token().await?;
        let url = join_segments(&self.base_url, &["freeBusy"])?;
        send_json(VENDOR, self.http.post(url).bearer_auth(token).json(&body)).await
    }

    async fn insert_event(&self, calendar_id: &str, event: Value) -> Result<Value> {
        let token = self.credentials.access_token().await?;
        let url = join_segments(&self.base_url, &["calendars", calendar_id, "events"])?;
        send_json(VENDOR, self.http.post(url).bearer_auth(token).json(&event)).await
    }

    async fn patch_event(&self, calendar_id: &str, event_id: &str, event: Value) -> Result<Value> {
        let token = self.credentials.access_token().await?;
        let url = join_segments(
            &self.base_url,
            &["calendars", calendar_id, "events", event_id],
        )?;
        send_json(VENDOR, self.http.patch(url).bearer_auth(token).json(&event)).await
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()> {
        let token = self.credentials.access_token().await?;
        let url = join_segments(
            &self.base_url,
            &["calendars", calendar_id, "events", event_id],
        )?;
        send_json(VENDOR, self.http.delete(url).bearer_auth(token)).await?;
        Ok(())
    }
}
