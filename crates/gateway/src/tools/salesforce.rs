use super::{ToolContext, ToolError, ToolOutcome};
use crate::config::TaskDefaults;
use chrono::NaiveDate;
use revops_vendor_clients::SalesforceApi;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FindPersonArgs {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadSourceDetail {
    #[serde(rename = "SMS Chat")]
    SmsChat,
    #[serde(rename = "Web Chat")]
    WebChat,
    #[serde(rename = "Sales Line")]
    SalesLine,
}

/// Lead fields accepted from callers. Names are the Salesforce API names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeadFields {
    #[serde(rename = "FirstName", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "LastName", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "Email", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "Phone", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "Company", default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(rename = "Title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "Website", default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(rename = "Country", default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(
        rename = "Lead_Source_Detail__c",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub lead_source_detail: Option<LeadSourceDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLeadArgs {
    pub fields: LeadFields,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskDirection {
    #[default]
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogTaskArgs {
    pub person_id: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub direction: TaskDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonKind {
    Contact,
    Lead,
}

impl PersonKind {
    fn sobject(&self) -> &'static str {
        match self {
            Self::Contact => "Contact",
            Self::Lead => "Lead",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonMatch {
    #[serde(rename = "type")]
    pub kind: PersonKind,
    pub id: String,
    pub first_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskLogOutcome {
    Logged { id: String },
    Failed { error: String },
}

pub fn find_person_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "email": { "type": "string", "description": "Email address to look up." },
            "phone": { "type": "string", "description": "Phone number to look up." }
        },
        "additionalProperties": false
    })
}

pub fn create_lead_schema() -> Value {
    let text = json!({ "type": "string" });
    json!({
        "type": "object",
        "properties": {
            "fields": {
                "type": "object",
                "properties": {
                    "FirstName": text,
                    "LastName": { "type": "string", "description": "Defaults to \"Unknown\"." },
                    "Email": text,
                    "Phone": text,
                    "Company": { "type": "string", "description": "Defaults to \"Unknown\"." },
                    "Title": text,
                    "Website": text,
                    "Country": text,
                    "Lead_Source_Detail__c": { "type": "string", "enum": ["SMS Chat", "Web Chat", "Sales Line"] }
                },
                "additionalProperties": false
            }
        },
        "required": ["fields"],
        "additionalProperties": false
    })
}

pub fn log_task_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "person_id": { "type": "string", "minLength": 1, "description": "Contact or Lead id (WhoId)." },
            "subject": { "type": "string" },
            "body": { "type": "string", "description": "Activity description." },
            "direction": { "type": "string", "enum": ["Inbound", "Outbound"], "default": "Inbound" }
        },
        "required": ["person_id", "subject", "body"],
        "additionalProperties": false
    })
}

/// Quote a value as a SOQL string literal.
pub(crate) fn soql_literal(v: &str) -> String {
    let mut out = String::with_capacity(v.len() + 2);
    out.push('\'');
    for c in v.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn where_clause(email: Option<&str>, phone: Option<&str>) -> Option<String> {
    let conditions: Vec<String> = [("Email", email), ("Phone", phone)]
        .into_iter()
        .filter_map(|(field, v)| {
            let v = v.map(str::trim).filter(|s| !s.is_empty())?;
            Some(format!("{field} = {}", soql_literal(v)))
        })
        .collect();
    if conditions.is_empty() {
        None
    } else {
        Some(conditions.join(" OR "))
    }
}

/// Look for a Contact, then a Lead, matching either identifier.
///
/// `Ok(None)` is the not-found result; blank identifiers return it without querying.
pub async fn find_contact_or_lead(
    sf: &dyn SalesforceApi,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<Option<PersonMatch>, ToolError> {
    let Some(clause) = where_clause(email, phone) else {
        return Ok(None);
    };
    for kind in [PersonKind::Contact, PersonKind::Lead] {
        let soql = format!(
            "SELECT Id, Email, FirstName FROM {} WHERE {clause} LIMIT 1",
            kind.sobject()
        );
        let result = sf.query(&soql).await?;
        if let Some(record) = result.records.first() {
            let id = record
                .get("Id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let first_name = record
                .get("FirstName")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Ok(Some(PersonMatch {
                kind,
                id,
                first_name,
            }));
        }
    }
    Ok(None)
}

pub async fn find_person(ctx: &ToolContext, args: FindPersonArgs) -> Result<ToolOutcome, ToolError> {
    let found = find_contact_or_lead(
        ctx.vendors.salesforce.as_ref(),
        args.email.as_deref(),
        args.phone.as_deref(),
    )
    .await?;
    let payload = match found {
        Some(m) => json!({ "found": true, "type": m.kind, "id": m.id, "first_name": m.first_name }),
        None => json!({ "found": false }),
    };
    Ok(ToolOutcome::Success(payload))
}

pub(crate) fn lead_record(mut fields: LeadFields) -> Result<Map<String, Value>, ToolError> {
    for slot in [&mut fields.last_name, &mut fields.company] {
        if slot.as_deref().is_none_or(|s| s.trim().is_empty()) {
            *slot = Some(UNKNOWN.to_string());
        }
    }
    match serde_json::to_value(fields) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ToolError::InvalidArguments(
            "Invalid params: lead fields must be an object".to_string(),
        )),
        Err(e) => Err(ToolError::InvalidArguments(format!("Invalid params: {e}"))),
    }
}

pub async fn create_lead(ctx: &ToolContext, args: CreateLeadArgs) -> Result<ToolOutcome, ToolError> {
    let record = lead_record(args.fields)?;
    let created = ctx.vendors.salesforce.create("Lead", record).await?;
    Ok(ToolOutcome::Success(created))
}

pub(crate) fn task_record(
    defaults: &TaskDefaults,
    args: &LogTaskArgs,
    today: NaiveDate,
) -> Map<String, Value> {
    let direction = match args.direction {
        TaskDirection::Inbound => "Inbound",
        TaskDirection::Outbound => "Outbound",
    };
    let v = json!({
        "RecordTypeId": defaults.record_type_id,
        "WhoId": args.person_id.trim(),
        "Subject": args.subject,
        "ActivityDate": today.format("%Y-%m-%d").to_string(),
        "Status": "Completed",
        "OwnerId": defaults.owner_id,
        "Description": args.body,
        "Type": "Call",
        "TaskSubType": "Call",
        "Task_Direction__c": direction,
    });
    match v {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Create the activity Task. Failures are folded into the outcome.
pub async fn log_sfdc_task(
    sf: &dyn SalesforceApi,
    defaults: &TaskDefaults,
    args: &LogTaskArgs,
) -> TaskLogOutcome {
    let record = task_record(defaults, args, chrono::Local::now().date_naive());
    match sf.create("Task", record).await {
        Ok(resp) => match resp.get("id").and_then(Value::as_str) {
            Some(id) => TaskLogOutcome::Logged { id: id.to_string() },
            None => TaskLogOutcome::Failed {
                error: format!("salesforce returned no task id: {resp}"),
            },
        },
        Err(e) => {
            tracing::warn!(error = %e, "salesforce task create failed");
            TaskLogOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

pub async fn log_task(ctx: &ToolContext, args: LogTaskArgs) -> Result<ToolOutcome, ToolError> {
    let outcome = log_sfdc_task(
        ctx.vendors.salesforce.as_ref(),
        &ctx.task_defaults,
        &args,
    )
    .await;
    Ok(match outcome {
        TaskLogOutcome::Logged { id } => ToolOutcome::Success(json!({ "success": true, "id": id })),
        TaskLogOutcome::Failed { error } => ToolOutcome::Failure(error),
    })
}
