use super::login::{SalesforceLogin, SalesforceSession};
use crate::error::{Result, VendorError};
use crate::http::{join_segments, send_json};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

const VENDOR: &str = "salesforce";

/// Response of a SOQL `query` call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    #[serde(default)]
    pub total_size: u64,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub records: Vec<Map<String, Value>>,
}

#[async_trait]
pub trait SalesforceApi: Send + Sync {
    /// Run a SOQL query.
    async fn query(&self, soql: &str) -> Result<QueryResult>;
    /// Create one record of `sobject` type; returns the vendor's `{id, success, errors}`.
    async fn create(&self, sobject: &str, fields: Map<String, Value>) -> Result<Value>;
}

/// REST data API client; logs in fresh for every call.
pub struct SalesforceClient {
    login: SalesforceLogin,
}

impl SalesforceClient {
    #[must_use]
    pub fn new(login: SalesforceLogin) -> Self {
        Self { login }
    }

    fn data_url(&self, session: &SalesforceSession, segments: &[&str]) -> Result<url::Url> {
        let version = format!("v{}", self.login.api_version());
        let mut all: Vec<&str> = vec!["services", "data", version.as_str()];
        all.extend_from_slice(segments);
        join_segments(&session.instance_url, &all)
    }
}

#[async_trait]
impl SalesforceApi for SalesforceClient {
    async fn query(&self, soql: &str) -> Result<QueryResult> {
        let session = self.login.login().await?;
        let url = self.data_url(&session, &["query", ""])?;
        let req = self
            .login
            .http()
            .get(url)
            .bearer_auth(&session.session_id)
            .query(&[("q", soql)]);
        let body = send_json(VENDOR, req).await?;
        serde_json::from_value(body).map_err(|e| VendorError::Decode {
            vendor: VENDOR,
            message: e.to_string(),
        })
    }

    async fn create(&self, sobject: &str, fields: Map<String, Value>) -> Result<Value> {
        let session = self.login.login().await?;
        let url = self.data_url(&session, &["sobjects", sobject, ""])?;
        let req = self
            .login
            .http()
            .post(url)
            .bearer_auth(&session.session_id)
            .json(&fields);
        send_json(VENDOR, req).await
    }
}
