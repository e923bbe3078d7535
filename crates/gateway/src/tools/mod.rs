//! Tool handlers. Each handler takes typed arguments, performs its vendor calls through the
//! [`Vendors`] seams, and yields a [`ToolOutcome`].

pub mod calendar;
pub mod gmail;
pub mod salesforce;

use crate::config::TaskDefaults;
use crate::vendors::Vendors;
use revops_vendor_clients::VendorError;
use rmcp::model::{CallToolResult, Content};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Everything a handler may touch. Built once at startup and shared read-only.
#[derive(Clone)]
pub struct ToolContext {
    pub vendors: Vendors,
    /// Impersonated Google mailbox.
    pub mailbox: String,
    pub task_defaults: TaskDefaults,
}

#[derive(Error, Debug)]
pub enum ToolError {
    /// Arguments passed schema validation but are still unusable.
    #[error("{0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Vendor(#[from] VendorError),
}

/// Tagged result of a tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(Value),
    Failure(String),
}

impl ToolOutcome {
    #[must_use]
    pub fn into_call_result(self) -> CallToolResult {
        match self {
            Self::Success(payload) => {
                let structured = match payload {
                    Value::Object(_) => payload,
                    other => json!({ "result": other }),
                };
                CallToolResult {
                    content: vec![Content::text(structured.to_string())],
                    structured_content: Some(structured),
                    is_error: Some(false),
                    meta: None,
                }
            }
            Self::Failure(error) => {
                let structured = json!({ "success": false, "error": error });
                CallToolResult {
                    content: vec![Content::text(structured.to_string())],
                    structured_content: Some(structured),
                    is_error: Some(true),
                    meta: None,
                }
            }
        }
    }
}

pub(crate) fn parse_args<T: DeserializeOwned>(args: Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| ToolError::InvalidArguments(format!("Invalid params: {e}")))
}

pub(crate) fn mailbox(ctx: &ToolContext) -> Result<&str, ToolError> {
    let m = ctx.mailbox.trim();
    if m.is_empty() {
        return Err(VendorError::Credential(
            revops_vendor_clients::CredentialError::NotConfigured("google mailbox"),
        )
        .into());
    }
    Ok(m)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_wraps_non_object_payloads() {
        let r = ToolOutcome::Success(json!([1, 2])).into_call_result();
        assert_eq!(r.is_error, Some(false));
        assert_eq!(r.structured_content, Some(json!({ "result": [1, 2] })));
        assert_eq!(r.content.len(), 1);
    }

    #[test]
    fn failure_is_flagged_and_tagged() {
        let r = ToolOutcome::Failure("boom".to_string()).into_call_result();
        assert_eq!(r.is_error, Some(true));
        assert_eq!(
            r.structured_content,
            Some(json!({ "success": false, "error": "boom" }))
        );
    }
}
