use super::{ToolContext, ToolError, ToolOutcome, mailbox};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

const DEFAULT_CALENDAR: &str = "primary";

/// A start or end instant. Exactly one of `date_time` / `date` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// All-day events: `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Attendee {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

/// The event fields a caller may set. Anything else is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EventFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<Attendee>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FreeBusyArgs {
    pub time_min: String,
    pub time_max: String,
    #[serde(default)]
    pub calendar_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventArgs {
    pub event_details: EventFields,
    #[serde(default)]
    pub calendar_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEventArgs {
    pub event_id: String,
    pub event_details: EventFields,
    #[serde(default)]
    pub calendar_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteEventArgs {
    pub event_id: String,
    #[serde(default)]
    pub calendar_id: Option<String>,
}

fn event_time_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "dateTime": { "type": "string", "description": "RFC 3339 timestamp, e.g. 2024-01-15T09:00:00-05:00." },
            "date": { "type": "string", "description": "All-day date, YYYY-MM-DD." },
            "timeZone": { "type": "string", "description": "IANA zone, e.g. America/New_York." }
        },
        "additionalProperties": false
    })
}

fn event_fields_schema(required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": { "type": "string", "description": "Event title." },
            "location": { "type": "string" },
            "description": { "type": "string" },
            "start": event_time_schema(),
            "end": event_time_schema(),
            "attendees": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "email": { "type": "string", "minLength": 1 },
                        "displayName": { "type": "string" },
                        "optional": { "type": "boolean" }
                    },
                    "required": ["email"],
                    "additionalProperties": false
                }
            }
        },
        "required": required,
        "additionalProperties": false
    })
}

fn calendar_id_schema() -> Value {
    json!({ "type": "string", "default": DEFAULT_CALENDAR, "description": "Calendar id; defaults to the primary calendar." })
}

pub fn free_busy_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "time_min": { "type": "string", "description": "Start of the window (RFC 3339, e.g. 2024-01-15T09:00:00Z)." },
            "time_max": { "type": "string", "description": "End of the window (RFC 3339)." },
            "calendar_ids": {
                "type": "array",
                "items": { "type": "string", "minLength": 1 },
                "description": "Calendars to check; defaults to the gateway mailbox."
            }
        },
        "required": ["time_min", "time_max"],
        "additionalProperties": false
    })
}

pub fn create_event_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "event_details": event_fields_schema(&["summary", "start", "end"]),
            "calendar_id": calendar_id_schema()
        },
        "required": ["event_details"],
        "additionalProperties": false
    })
}

pub fn update_event_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "event_id": { "type": "string", "minLength": 1 },
            "event_details": event_fields_schema(&[]),
            "calendar_id": calendar_id_schema()
        },
        "required": ["event_id", "event_details"],
        "additionalProperties": false
    })
}

pub fn delete_event_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "event_id": { "type": "string", "minLength": 1 },
            "calendar_id": calendar_id_schema()
        },
        "required": ["event_id"],
        "additionalProperties": false
    })
}

pub async fn free_busy(ctx: &ToolContext, args: FreeBusyArgs) -> Result<ToolOutcome, ToolError> {
    let min = parse_rfc3339("time_min", &args.time_min)?;
    let max = parse_rfc3339("time_max", &args.time_max)?;
    if max <= min {
        return Err(invalid("'time_max' must be after 'time_min'"));
    }

    let ids: Vec<String> = match args.calendar_ids {
        Some(ids) if !ids.is_empty() => ids,
        _ => vec![mailbox(ctx)?.to_string()],
    };
    let body = json!({
        "timeMin": args.time_min,
        "timeMax": args.time_max,
        "items": ids.iter().map(|id| json!({ "id": id })).collect::<Vec<_>>(),
    });
    let resp = ctx.vendors.calendar.free_busy(body).await?;
    Ok(ToolOutcome::Success(resp))
}

pub async fn create_event(ctx: &ToolContext, args: CreateEventArgs) -> Result<ToolOutcome, ToolError> {
    let fields = args.event_details;
    if fields.summary.as_deref().is_none_or(|s| s.trim().is_empty()) {
        return Err(invalid("'event_details.summary' is required"));
    }
    let (Some(start), Some(end)) = (&fields.start, &fields.end) else {
        return Err(invalid("'event_details.start' and 'event_details.end' are required"));
    };
    check_time("start", start)?;
    check_time("end", end)?;
    check_order(start, end)?;

    let calendar_id = calendar_or_default(args.calendar_id.as_deref());
    let created = ctx
        .vendors
        .calendar
        .insert_event(calendar_id, event_body(&fields)?)
        .await?;
    Ok(ToolOutcome::Success(created))
}

pub async fn update_event(ctx: &ToolContext, args: UpdateEventArgs) -> Result<ToolOutcome, ToolError> {
    let event_id = required_id(&args.event_id)?;
    let fields = args.event_details;
    if fields == EventFields::default() {
        return Err(invalid("'event_details' must set at least one field"));
    }
    if let Some(start) = &fields.start {
        check_time("start", start)?;
    }
    if let Some(end) = &fields.end {
        check_time("end", end)?;
    }
    if let (Some(start), Some(end)) = (&fields.start, &fields.end) {
        check_order(start, end)?;
    }

    let calendar_id = calendar_or_default(args.calendar_id.as_deref());
    let updated = ctx
        .vendors
        .calendar
        .patch_event(calendar_id, event_id, event_body(&fields)?)
        .await?;
    Ok(ToolOutcome::Success(updated))
}

pub async fn delete_event(ctx: &ToolContext, args: DeleteEventArgs) -> Result<ToolOutcome, ToolError> {
    let event_id = required_id(&args.event_id)?;
    let calendar_id = calendar_or_default(args.calendar_id.as_deref());
    ctx.vendors.calendar.delete_event(calendar_id, event_id).await?;
    Ok(ToolOutcome::Success(
        json!({ "status": "deleted", "event_id": event_id }),
    ))
}

fn calendar_or_default(id: Option<&str>) -> &str {
    id.map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_CALENDAR)
}

fn required_id(id: &str) -> Result<&str, ToolError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(invalid("'event_id' must not be blank"));
    }
    Ok(id)
}

fn event_body(fields: &EventFields) -> Result<Value, ToolError> {
    serde_json::to_value(fields).map_err(|e| invalid(&format!("event_details: {e}")))
}

fn invalid(msg: &str) -> ToolError {
    ToolError::InvalidArguments(format!("Invalid params: {msg}"))
}

fn parse_rfc3339(field: &str, v: &str) -> Result<DateTime<FixedOffset>, ToolError> {
    DateTime::parse_from_rfc3339(v.trim())
        .map_err(|e| invalid(&format!("'{field}' is not an RFC 3339 timestamp: {e}")))
}

fn check_time(which: &str, t: &EventTime) -> Result<(), ToolError> {
    match (t.date_time.as_deref(), t.date.as_deref()) {
        (Some(dt), None) => {
            if DateTime::parse_from_rfc3339(dt).is_ok() {
                return Ok(());
            }
            if NaiveDateTime::parse_from_str(dt, "%Y-%m-%dT%H:%M:%S").is_err() {
                return Err(invalid(&format!("'{which}.dateTime' is not a valid timestamp")));
            }
            if t.time_zone.as_deref().is_none_or(|z| z.trim().is_empty()) {
                return Err(invalid(&format!(
                    "'{which}.timeZone' is required when '{which}.dateTime' has no UTC offset"
                )));
            }
            Ok(())
        }
        (None, Some(d)) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map(|_| ())
            .map_err(|_| invalid(&format!("'{which}.date' must be YYYY-MM-DD"))),
        _ => Err(invalid(&format!(
            "'{which}' must set exactly one of 'dateTime' or 'date'"
        ))),
    }
}

// Only comparable when both carry offsets or both are dates.
fn check_order(start: &EventTime, end: &EventTime) -> Result<(), ToolError> {
    let backwards = match (&start.date_time, &end.date_time, &start.date, &end.date) {
        (Some(s), Some(e), _, _) => match (
            DateTime::parse_from_rfc3339(s),
            DateTime::parse_from_rfc3339(e),
        ) {
            (Ok(s), Ok(e)) => e < s,
            _ => false,
        },
        (_, _, Some(s), Some(e)) => e < s,
        _ => false,
    };
    if backwards {
        return Err(invalid("'end' must not be before 'start'"));
    }
    Ok(())
}
