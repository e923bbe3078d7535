use crate::auth::AuthGate;
use crate::config::GatewayConfig;
use crate::jsonrpc::{CallToolParams, JsonRpcRequest, RpcError, error_response, result_response};
use crate::registry::ToolRegistry;
use crate::tools::ToolContext;
use crate::vendors::Vendors;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rmcp::model::ErrorCode;
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;

pub const SERVER_NAME: &str = "RevOps Functions Server";
pub const INFO_TEXT: &str = "RevOps MCP Server - MCP endpoint is at / (POST).";
const DEFAULT_PROTOCOL_VERSION: &str = "2025-03-26";

/// Shared, immutable per-process state.
pub struct Gateway {
    gate: AuthGate,
    registry: ToolRegistry,
}

impl Gateway {
    #[must_use]
    pub fn new(config: &GatewayConfig, vendors: Vendors) -> Self {
        let context = ToolContext {
            vendors,
            mailbox: config.google.mailbox.trim().to_string(),
            task_defaults: config.salesforce.task.clone(),
        };
        Self {
            gate: AuthGate::new(&config.api_key),
            registry: ToolRegistry::new(context),
        }
    }

    /// Build the gateway with real vendor clients.
    ///
    /// # Errors
    ///
    /// Returns an error if the vendor HTTP client cannot be built.
    pub fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config, Vendors::from_config(config)?))
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

pub fn router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/", post(mcp_post))
        .route("/health", get(health))
        .route("/info", get(info))
        .with_state(gateway)
}

/// Serve until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn serve(
    listener: tokio::net::TcpListener,
    gateway: Arc<Gateway>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    axum::serve(listener, router(gateway))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn info() -> &'static str {
    INFO_TEXT
}

async fn mcp_post(State(gw): State<Arc<Gateway>>, headers: HeaderMap, body: Bytes) -> Response {
    if let Err(e) = gw.gate.verify_headers(&headers) {
        tracing::warn!(reason = ?e, "rejected unauthenticated mcp request");
        return e.into_response();
    }

    let value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return error_response(
                None,
                &RpcError::new(ErrorCode::PARSE_ERROR, format!("Parse error: {e}")),
            );
        }
    };
    let id_hint = value.get("id").cloned();
    let req: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => {
            return error_response(
                id_hint,
                &RpcError::new(ErrorCode::INVALID_REQUEST, format!("Invalid request: {e}")),
            );
        }
    };
    if req.jsonrpc != "2.0" {
        return error_response(
            req.id,
            &RpcError::new(ErrorCode::INVALID_REQUEST, "Invalid request: jsonrpc must be \"2.0\""),
        );
    }
    if req.is_notification() {
        tracing::debug!(method = %req.method, "notification");
        return StatusCode::ACCEPTED.into_response();
    }

    let id = req.id.unwrap_or(Value::Null);
    match req.method.as_str() {
        "initialize" => result_response(id, initialize_result(req.params.as_ref())),
        "ping" => result_response(id, json!({})),
        "tools/list" => match serde_json::to_value(gw.registry.tools()) {
            Ok(tools) => result_response(id, json!({ "tools": tools })),
            Err(e) => error_response(
                Some(id),
                &RpcError::new(ErrorCode::INTERNAL_ERROR, format!("serialize tools: {e}")),
            ),
        },
        "tools/call" => tools_call(&gw, id, req.params).await,
        other => error_response(
            Some(id),
            &RpcError::new(ErrorCode::METHOD_NOT_FOUND, format!("Method not found: {other}")),
        ),
    }
}

async fn tools_call(gw: &Gateway, id: Value, params: Option<Value>) -> Response {
    let params: CallToolParams = match params.map(serde_json::from_value::<CallToolParams>) {
        Some(Ok(p)) => p,
        Some(Err(e)) => {
            return error_response(Some(id), &RpcError::invalid_params(format!("Invalid params: {e}")));
        }
        None => {
            return error_response(Some(id), &RpcError::invalid_params("Invalid params: missing params"));
        }
    };

    match gw.registry.call(&params.name, params.arguments).await {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(v) => result_response(id, v),
            Err(e) => error_response(
                Some(id),
                &RpcError::new(ErrorCode::INTERNAL_ERROR, format!("serialize result: {e}")),
            ),
        },
        Err(e) => {
            tracing::debug!(tool = %params.name, error = %e.message, "tool call rejected");
            error_response(Some(id), &e)
        }
    }
}

fn initialize_result(params: Option<&Value>) -> Value {
    let protocol_version = params
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_PROTOCOL_VERSION);
    json!({
        "protocolVersion": protocol_version,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
        "instructions": "Tools for Gmail, Google Calendar and Salesforce. Authenticate with Authorization: Bearer <api key>.",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_echoes_protocol_version() {
        let v = initialize_result(Some(&json!({ "protocolVersion": "2024-11-05" })));
        assert_eq!(v["protocolVersion"], "2024-11-05");
        assert_eq!(v["serverInfo"]["name"], SERVER_NAME);
        assert!(v["capabilities"]["tools"].is_object());

        let v = initialize_result(None);
        assert_eq!(v["protocolVersion"], DEFAULT_PROTOCOL_VERSION);
    }
}
