#![allow(dead_code)]

use anyhow::Context as _;
use async_trait::async_trait;
use parking_lot::Mutex;
use revops_mcp_gateway::{Gateway, GatewayConfig, Vendors, router};
use revops_test_support::TestServer;
use revops_vendor_clients::{
    CalendarApi, GmailApi, QueryResult, Result as VendorResult, SalesforceApi, VendorError,
};
use serde_json::{Map, Value, json};
use std::sync::Arc;

pub const API_KEY: &str = "test-api-key";

/// Counts every vendor call; optionally fails them all.
#[derive(Default)]
pub struct CountingVendors {
    calls: Mutex<Vec<String>>,
    created: Mutex<Vec<(String, Value)>>,
    fail: Mutex<Option<String>>,
}

impl CountingVendors {
    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Records passed to `SalesforceApi::create`, in call order.
    pub fn created(&self) -> Vec<(String, Value)> {
        self.created.lock().clone()
    }

    pub fn fail_with(&self, msg: &str) {
        *self.fail.lock() = Some(msg.to_string());
    }

    fn hit(&self, what: String) -> VendorResult<()> {
        self.calls.lock().push(what);
        match self.fail.lock().clone() {
            Some(msg) => Err(VendorError::Transport(msg)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GmailApi for CountingVendors {
    async fn send_raw(&self, _raw: String) -> VendorResult<Value> {
        self.hit("gmail.send".to_string())?;
        Ok(json!({ "id": "msg-1" }))
    }
}

#[async_trait]
impl CalendarApi for CountingVendors {
    async fn free_busy(&self, _body: Value) -> VendorResult<Value> {
        self.hit("calendar.freeBusy".to_string())?;
        Ok(json!({ "calendars": {} }))
    }

    async fn insert_event(&self, calendar_id: &str, _event: Value) -> VendorResult<Value> {
        self.hit(format!("calendar.insert:{calendar_id}"))?;
        Ok(json!({ "id": "evt-1" }))
    }

    async fn patch_event(&self, calendar_id: &str, event_id: &str, _event: Value) -> VendorResult<Value> {
        self.hit(format!("calendar.patch:{calendar_id}:{event_id}"))?;
        Ok(json!({ "id": event_id }))
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> VendorResult<()> {
        self.hit(format!("calendar.delete:{calendar_id}:{event_id}"))
    }
}

#[async_trait]
impl SalesforceApi for CountingVendors {
    async fn query(&self, soql: &str) -> VendorResult<QueryResult> {
        self.hit(format!("salesforce.query:{soql}"))?;
        Ok(QueryResult::default())
    }

    async fn create(&self, sobject: &str, fields: Map<String, Value>) -> VendorResult<Value> {
        self.created
            .lock()
            .push((sobject.to_string(), Value::Object(fields)));
        self.hit(format!("salesforce.create:{sobject}"))?;
        Ok(json!({ "id": "00TXX0000001", "success": true, "errors": [] }))
    }
}

pub fn test_config(api_key: &str) -> GatewayConfig {
    let mut cfg = GatewayConfig::default();
    cfg.api_key = api_key.to_string();
    cfg.google.mailbox = "owner@example.com".to_string();
    cfg
}

/// Serve the gateway router in-process with counting vendors.
pub async fn start_gateway(api_key: &str) -> anyhow::Result<(TestServer, Arc<CountingVendors>)> {
    let fake = Arc::new(CountingVendors::default());
    let vendors = Vendors {
        gmail: fake.clone(),
        calendar: fake.clone(),
        salesforce: fake.clone(),
    };
    let gateway = Arc::new(Gateway::new(&test_config(api_key), vendors));
    let server = TestServer::start(router(gateway)).await?;
    Ok((server, fake))
}

/// Minimal JSON-RPC client for the gateway's `POST /` endpoint.
pub struct McpClient {
    http: reqwest::Client,
    url: String,
    auth: Option<String>,
    next_id: Mutex<u64>,
}

impl McpClient {
    pub fn new(base_url: &str, auth: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: format!("{base_url}/"),
            auth: auth.map(str::to_string),
            next_id: Mutex::new(1),
        }
    }

    pub fn bearer(base_url: &str) -> Self {
        Self::new(base_url, Some(&format!("Bearer {API_KEY}")))
    }

    pub async fn post_raw(&self, body: String) -> anyhow::Result<reqwest::Response> {
        let mut req = self
            .http
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(auth) = &self.auth {
            req = req.header(reqwest::header::AUTHORIZATION, auth);
        }
        req.send().await.context("POST /")
    }

    /// Send a request and return the full JSON-RPC response envelope.
    pub async fn request(&self, method: &str, params: Value) -> anyhow::Result<Value> {
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            *next
        };
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        let resp = self.post_raw(body.to_string()).await?;
        anyhow::ensure!(
            resp.status() == reqwest::StatusCode::OK,
            "unexpected status {}",
            resp.status()
        );
        let v: Value = resp.json().await.context("decode json-rpc response")?;
        anyhow::ensure!(v["id"] == json!(id), "response id mismatch: {v}");
        Ok(v)
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> anyhow::Result<Value> {
        self.request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await
    }
}
