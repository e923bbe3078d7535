use crate::error::{Result, VendorError};
use serde_json::{Value, json};

/// Send a request and interpret the response as JSON.
///
/// 2xx with an empty body yields `Value::Null`. Non-2xx responses become
/// [`VendorError::Api`] carrying the (JSON-decoded when possible) body.
pub(crate) async fn send_json(vendor: &'static str, request: reqwest::RequestBuilder) -> Result<Value> {
    let response = request.send().await?;
    let status = response.status();
    let bytes = response.bytes().await?;

    if status.is_success() {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        return serde_json::from_slice(&bytes).map_err(|e| VendorError::Decode {
            vendor,
            message: e.to_string(),
        });
    }

    let body = serde_json::from_slice::<Value>(&bytes)
        .unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)));
    tracing::debug!(vendor, status = status.as_u16(), "vendor api returned error status");
    Err(VendorError::Api {
        vendor,
        status: status.as_u16(),
        body,
    })
}

/// Parse a base URL and append path segments (each segment is percent-encoded).
pub(crate) fn join_segments(base: &str, segments: &[&str]) -> Result<url::Url> {
    let mut url = url::Url::parse(base)
        .map_err(|e| VendorError::InvalidRequest(format!("invalid base url '{base}': {e}")))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| VendorError::InvalidRequest(format!("base url '{base}' cannot be a base")))?;
        path.pop_if_empty();
        for s in segments {
            path.push(s);
        }
    }
    Ok(url)
}
