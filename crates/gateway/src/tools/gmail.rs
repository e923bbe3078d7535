use super::{ToolContext, ToolError, ToolOutcome, mailbox};
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Deserialize)]
pub struct SendEmailArgs {
    pub to: String,
    pub subject: String,
    pub message_text: String,
    #[serde(default)]
    pub cc: Option<String>,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub is_html: bool,
}

pub fn send_email_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "to": { "type": "string", "minLength": 1, "description": "Recipient address(es), comma separated." },
            "subject": { "type": "string" },
            "message_text": { "type": "string", "description": "Message body." },
            "cc": { "type": "string", "default": "" },
            "reply_to": { "type": "string", "default": "" },
            "is_html": { "type": "boolean", "default": false, "description": "Send the body as text/html." }
        },
        "required": ["to", "subject", "message_text"],
        "additionalProperties": false
    })
}

pub async fn send_email(ctx: &ToolContext, args: SendEmailArgs) -> Result<ToolOutcome, ToolError> {
    let from = mailbox(ctx)?;
    let message = build_message(from, &args)?;
    let raw = URL_SAFE.encode(message.as_bytes());
    let sent = ctx.vendors.gmail.send_raw(raw).await?;
    Ok(ToolOutcome::Success(sent))
}

/// Render a single-part RFC 5322 message with a base64 body.
pub(crate) fn build_message(from: &str, args: &SendEmailArgs) -> Result<String, ToolError> {
    if args.to.trim().is_empty() {
        return Err(ToolError::InvalidArguments(
            "Invalid params: 'to' must not be blank".to_string(),
        ));
    }
    let mut headers: Vec<(&str, String)> = vec![
        ("From", header_value("from", from)?),
        ("To", header_value("to", &args.to)?),
    ];
    if let Some(cc) = non_empty(args.cc.as_deref()) {
        headers.push(("Cc", header_value("cc", cc)?));
    }
    if let Some(reply_to) = non_empty(args.reply_to.as_deref()) {
        headers.push(("Reply-To", header_value("reply_to", reply_to)?));
    }
    headers.push(("Subject", encode_subject(&header_value("subject", &args.subject)?)));
    headers.push(("MIME-Version", "1.0".to_string()));
    let subtype = if args.is_html { "html" } else { "plain" };
    headers.push(("Content-Type", format!("text/{subtype}; charset=\"utf-8\"")));
    headers.push(("Content-Transfer-Encoding", "base64".to_string()));

    let mut out = String::new();
    for (name, value) in headers {
        out.push_str(name);
        out.push_str(": ");
        out.push_str(&value);
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    let body = STANDARD.encode(args.message_text.as_bytes());
    for line in body.as_bytes().chunks(76) {
        // base64 output is ASCII.
        out.push_str(&String::from_utf8_lossy(line));
        out.push_str("\r\n");
    }
    Ok(out)
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

fn header_value(field: &str, v: &str) -> Result<String, ToolError> {
    if v.contains(['\r', '\n']) {
        return Err(ToolError::InvalidArguments(format!(
            "Invalid params: '{field}' must not contain line breaks"
        )));
    }
    Ok(v.trim().to_string())
}

fn encode_subject(subject: &str) -> String {
    if subject.is_ascii() {
        subject.to_string()
    } else {
        format!("=?utf-8?b?{}?=", STANDARD.encode(subject.as_bytes()))
    }
}
