use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use hmac::{Hmac, Mac as _};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Authorization schemes whose prefix is stripped before comparison.
const SCHEMES: [&str; 3] = ["bearer", "token", "apikey"];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unauthorized: missing access token")]
    Missing,
    #[error("Unauthorized: invalid access token")]
    Invalid,
    #[error("Unauthorized: gateway has no api key configured")]
    NotConfigured,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            self.to_string(),
        )
            .into_response()
    }
}

/// The identity admitted by the gate. There is one trust tier, so it carries no scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub client_id: &'static str,
}

/// Strip a recognized `<scheme> <token>` prefix; anything else is compared whole.
#[must_use]
pub fn normalize_token(raw: Option<&str>) -> &str {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    let mut parts = trimmed.split_whitespace();
    if let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next())
        && SCHEMES.iter().any(|s| scheme.eq_ignore_ascii_case(s))
    {
        return token;
    }
    trimmed
}

/// Validates caller tokens against the single configured api key.
#[derive(Clone)]
pub struct AuthGate {
    secret: Vec<u8>,
    // HMAC(secret, secret): both sides of the comparison are fixed-length tags.
    expected_tag: Option<Vec<u8>>,
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("configured", &self.expected_tag.is_some())
            .finish_non_exhaustive()
    }
}

impl AuthGate {
    #[must_use]
    pub fn new(api_key: &str) -> Self {
        let secret = api_key.trim().as_bytes().to_vec();
        let expected_tag = if secret.is_empty() {
            None
        } else {
            tag(&secret, &secret)
        };
        Self {
            secret,
            expected_tag,
        }
    }

    /// Check a raw `Authorization` value.
    ///
    /// # Errors
    ///
    /// Rejects an empty candidate, a mismatch, and every request when no key is configured.
    pub fn verify(&self, raw: Option<&str>) -> Result<AccessToken, AuthError> {
        let Some(expected) = self.expected_tag.as_deref() else {
            return Err(AuthError::NotConfigured);
        };
        let candidate = normalize_token(raw);
        if candidate.is_empty() {
            return Err(AuthError::Missing);
        }
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| AuthError::NotConfigured)?;
        mac.update(candidate.as_bytes());
        mac.verify_slice(expected)
            .map_err(|_| AuthError::Invalid)?;
        Ok(AccessToken {
            client_id: "revops-mcp-client",
        })
    }

    /// Verify the `Authorization` header of an inbound request.
    ///
    /// # Errors
    ///
    /// See [`AuthGate::verify`].
    pub fn verify_headers(&self, headers: &HeaderMap) -> Result<AccessToken, AuthError> {
        let raw = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());
        self.verify(raw)
    }
}

fn tag(key: &[u8], msg: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(msg);
    Some(mac.finalize().into_bytes().to_vec())
}
