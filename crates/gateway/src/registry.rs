//! The fixed tool table: descriptors for `tools/list` and dispatch for `tools/call`.

use crate::jsonrpc::RpcError;
use crate::tools::{ToolContext, ToolError, ToolOutcome, calendar, gmail, parse_args, salesforce};
use crate::validate::validate_arguments;
use rmcp::model::{CallToolResult, JsonObject, Tool, ToolAnnotations};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    SendEmail,
    GetCalendarFreeBusy,
    CreateCalendarEvent,
    UpdateCalendarEvent,
    DeleteCalendarEvent,
    FindSalesforceContactOrLead,
    CreateSalesforceLead,
    LogSalesforceTask,
}

impl ToolKind {
    pub const ALL: [ToolKind; 8] = [
        ToolKind::SendEmail,
        ToolKind::GetCalendarFreeBusy,
        ToolKind::CreateCalendarEvent,
        ToolKind::UpdateCalendarEvent,
        ToolKind::DeleteCalendarEvent,
        ToolKind::FindSalesforceContactOrLead,
        ToolKind::CreateSalesforceLead,
        ToolKind::LogSalesforceTask,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SendEmail => "send_email",
            Self::GetCalendarFreeBusy => "get_calendar_free_busy",
            Self::CreateCalendarEvent => "create_calendar_event",
            Self::UpdateCalendarEvent => "update_calendar_event",
            Self::DeleteCalendarEvent => "delete_calendar_event",
            Self::FindSalesforceContactOrLead => "find_salesforce_contact_or_lead",
            Self::CreateSalesforceLead => "create_salesforce_lead",
            Self::LogSalesforceTask => "log_salesforce_task",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    fn description(self) -> &'static str {
        match self {
            Self::SendEmail => {
                "Send an email from the gateway mailbox. Set is_html when message_text is HTML."
            }
            Self::GetCalendarFreeBusy => {
                "Get busy intervals for calendars between time_min and time_max (RFC 3339)."
            }
            Self::CreateCalendarEvent => {
                "Create a calendar event. event_details needs summary, start and end; use \
                 camelCase keys (dateTime, timeZone)."
            }
            Self::UpdateCalendarEvent => {
                "Update an existing calendar event. Only the fields given in event_details change."
            }
            Self::DeleteCalendarEvent => "Delete a calendar event.",
            Self::FindSalesforceContactOrLead => {
                "Find the Salesforce Contact (or else Lead) with this email or phone. Returns \
                 found=false when nothing matches."
            }
            Self::CreateSalesforceLead => {
                "Create a Salesforce Lead. LastName and Company default to \"Unknown\"."
            }
            Self::LogSalesforceTask => {
                "Log a completed call Task against a Contact or Lead id. Always returns success \
                 plus id or error."
            }
        }
    }

    fn input_schema(self) -> Value {
        match self {
            Self::SendEmail => gmail::send_email_schema(),
            Self::GetCalendarFreeBusy => calendar::free_busy_schema(),
            Self::CreateCalendarEvent => calendar::create_event_schema(),
            Self::UpdateCalendarEvent => calendar::update_event_schema(),
            Self::DeleteCalendarEvent => calendar::delete_event_schema(),
            Self::FindSalesforceContactOrLead => salesforce::find_person_schema(),
            Self::CreateSalesforceLead => salesforce::create_lead_schema(),
            Self::LogSalesforceTask => salesforce::log_task_schema(),
        }
    }

    fn annotations(self) -> ToolAnnotations {
        let (read_only, destructive, idempotent) = match self {
            Self::GetCalendarFreeBusy | Self::FindSalesforceContactOrLead => (true, false, true),
            Self::UpdateCalendarEvent => (false, true, true),
            Self::DeleteCalendarEvent => (false, true, true),
            Self::SendEmail
            | Self::CreateCalendarEvent
            | Self::CreateSalesforceLead
            | Self::LogSalesforceTask => (false, false, false),
        };
        ToolAnnotations {
            title: None,
            read_only_hint: Some(read_only),
            destructive_hint: Some(destructive),
            idempotent_hint: Some(idempotent),
            open_world_hint: Some(true),
        }
    }

    #[must_use]
    pub fn tool(self) -> Tool {
        let schema: JsonObject = match self.input_schema() {
            Value::Object(m) => m,
            _ => Map::new(),
        };
        let mut tool = Tool::new(self.name(), self.description(), Arc::new(schema));
        tool.annotations = Some(self.annotations());
        tool
    }

    async fn invoke(self, ctx: &ToolContext, args: Map<String, Value>) -> Result<ToolOutcome, ToolError> {
        match self {
            Self::SendEmail => gmail::send_email(ctx, parse_args(args)?).await,
            Self::GetCalendarFreeBusy => calendar::free_busy(ctx, parse_args(args)?).await,
            Self::CreateCalendarEvent => calendar::create_event(ctx, parse_args(args)?).await,
            Self::UpdateCalendarEvent => calendar::update_event(ctx, parse_args(args)?).await,
            Self::DeleteCalendarEvent => calendar::delete_event(ctx, parse_args(args)?).await,
            Self::FindSalesforceContactOrLead => salesforce::find_person(ctx, parse_args(args)?).await,
            Self::CreateSalesforceLead => salesforce::create_lead(ctx, parse_args(args)?).await,
            Self::LogSalesforceTask => salesforce::log_task(ctx, parse_args(args)?).await,
        }
    }
}

/// Tool descriptors plus dispatch over a shared [`ToolContext`].
pub struct ToolRegistry {
    tools: Vec<Tool>,
    context: ToolContext,
}

impl ToolRegistry {
    #[must_use]
    pub fn new(context: ToolContext) -> Self {
        Self {
            tools: ToolKind::ALL.into_iter().map(ToolKind::tool).collect(),
            context,
        }
    }

    #[must_use]
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    fn descriptor(&self, kind: ToolKind) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == kind.name())
    }

    /// Look up, validate, and run one tool.
    ///
    /// Vendor failures become an `isError` result; only unknown tools and bad arguments
    /// surface as JSON-RPC errors.
    ///
    /// # Errors
    ///
    /// Returns an invalid-params error for an unknown name or invalid arguments.
    pub async fn call(&self, name: &str, args: Option<Map<String, Value>>) -> Result<CallToolResult, RpcError> {
        let Some(kind) = ToolKind::from_name(name) else {
            return Err(RpcError::invalid_params(format!("unknown tool: {name}")));
        };
        let args = args.unwrap_or_default();
        if let Some(tool) = self.descriptor(kind) {
            validate_arguments(&tool.input_schema, &args)?;
        }

        tracing::debug!(tool = name, "dispatching tool call");
        let outcome = match kind.invoke(&self.context, args).await {
            Ok(outcome) => outcome,
            Err(ToolError::InvalidArguments(msg)) => return Err(RpcError::invalid_params(msg)),
            Err(ToolError::Vendor(e)) => {
                tracing::warn!(tool = name, error = %e, "tool call failed");
                ToolOutcome::Failure(e.to_string())
            }
        };
        Ok(outcome.into_call_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{FakeVendors, context};
    use serde_json::json;

    fn registry() -> (ToolRegistry, Arc<FakeVendors>) {
        let fake = Arc::new(FakeVendors::default());
        (ToolRegistry::new(context(&fake)), fake)
    }

    fn obj(v: Value) -> Option<Map<String, Value>> {
        v.as_object().cloned()
    }

    #[test]
    fn names_round_trip_and_list_is_complete() {
        let (reg, _) = registry();
        let names: Vec<&str> = reg.tools().iter().map(|t| t.name.as_ref()).collect();
        assert_eq!(names.len(), 8);
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
            assert!(names.contains(&kind.name()));
        }
        assert_eq!(ToolKind::from_name("send_sms"), None);
    }

    #[test]
    fn every_schema_compiles() {
        for kind in ToolKind::ALL {
            let schema = kind.input_schema();
            assert!(jsonschema::validator_for(&schema).is_ok(), "{}", kind.name());
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_an_invalid_params_error() {
        let (reg, fake) = registry();
        let err = reg.call("send_sms", None).await.expect_err("unknown");
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
        assert_eq!(err.message, "unknown tool: send_sms");
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_vendors() {
        let (reg, fake) = registry();
        let err = reg
            .call("send_email", obj(json!({ "to": "a@example.com", "subjet": "x", "message_text": "y" })))
            .await
            .expect_err("typo");
        assert!(err.message.contains("did you mean 'subject'"), "{}", err.message);
        let err = reg
            .call("log_salesforce_task", obj(json!({ "person_id": "003", "subject": "s", "body": "b", "direction": "Sideways" })))
            .await
            .expect_err("bad enum");
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn find_shortcuts_on_blank_arguments() {
        let (reg, fake) = registry();
        let result = reg
            .call("find_salesforce_contact_or_lead", obj(json!({ "email": "  " })))
            .await
            .expect("call");
        assert_eq!(result.is_error, Some(false));
        assert_eq!(result.structured_content, Some(json!({ "found": false })));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn vendor_failure_is_a_tagged_error_result() {
        let (reg, fake) = registry();
        *fake.fail_with.lock() = Some("upstream unavailable".to_string());
        let result = reg
            .call("delete_calendar_event", obj(json!({ "event_id": "evt-1" })))
            .await
            .expect("call");
        assert_eq!(result.is_error, Some(true));
        let structured = result.structured_content.expect("structured");
        assert_eq!(structured["success"], false);
        assert!(
            structured["error"]
                .as_str()
                .is_some_and(|e| e.contains("upstream unavailable"))
        );
    }

    #[tokio::test]
    async fn create_lead_fills_unknown_defaults() {
        let (reg, fake) = registry();
        let result = reg
            .call("create_salesforce_lead", obj(json!({ "fields": {} })))
            .await
            .expect("call");
        assert_eq!(result.is_error, Some(false));
        let calls = fake.calls();
        assert_eq!(calls[0].0, "salesforce.create:Lead");
        assert_eq!(calls[0].1, json!({ "LastName": "Unknown", "Company": "Unknown" }));
    }
}
