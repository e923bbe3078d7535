//! JSON-RPC 2.0 envelopes for the stateless MCP endpoint.

use axum::Json;
use axum::response::{IntoResponse, Response};
use rmcp::model::ErrorCode;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    /// Absent for notifications. An explicit `null` id is kept as `Some(Null)`.
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(d).map(Some)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Map<String, Value>>,
}

/// A JSON-RPC error object.
#[derive(Debug, Clone)]
pub struct RpcError {
    pub code: ErrorCode,
    pub message: String,
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::INVALID_PARAMS, message)
    }

    fn to_value(&self) -> Value {
        let mut err = json!({ "code": self.code.0, "message": self.message });
        if let Some(data) = &self.data {
            err["data"] = data.clone();
        }
        err
    }
}

pub fn result_response(id: Value, result: Value) -> Response {
    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result })).into_response()
}

/// Errors are still HTTP 200; the failure lives in the envelope.
pub fn error_response(id: Option<Value>, error: &RpcError) -> Response {
    Json(json!({
        "jsonrpc": "2.0",
        "id": id.unwrap_or(Value::Null),
        "error": error.to_value(),
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_has_no_id() {
        let req: JsonRpcRequest =
            serde_json::from_value(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
                .expect("parse");
        assert!(req.is_notification());

        let req: JsonRpcRequest =
            serde_json::from_value(json!({ "jsonrpc": "2.0", "id": 0, "method": "ping" }))
                .expect("parse");
        assert!(!req.is_notification());
    }

    #[test]
    fn null_id_is_a_request_not_a_notification() {
        let req: JsonRpcRequest =
            serde_json::from_value(json!({ "jsonrpc": "2.0", "id": null, "method": "tools/list" }))
                .expect("parse");
        assert!(!req.is_notification());
        assert_eq!(req.id, Some(Value::Null));
    }

    #[test]
    fn error_object_carries_code_and_data() {
        let err = RpcError::invalid_params("bad").with_data(json!({ "type": "validation-errors" }));
        let v = err.to_value();
        assert_eq!(v["code"], -32602);
        assert_eq!(v["message"], "bad");
        assert_eq!(v["data"]["type"], "validation-errors");

        let v = RpcError::new(ErrorCode::METHOD_NOT_FOUND, "nope").to_value();
        assert_eq!(v["code"], -32601);
        assert!(v.get("data").is_none());
    }
}
