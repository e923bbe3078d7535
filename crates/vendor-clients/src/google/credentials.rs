use crate::error::{CredentialError, sanitize_reqwest_error};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;

/// Something that can produce a bearer access token for a Google API call.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, CredentialError>;
}

/// A fixed token. Useful when a token is minted out of band (and in tests).
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, CredentialError> {
        Ok(self.0.clone())
    }
}

/// The subset of a Google service-account JSON key we need.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    scope: String,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Service-account credentials impersonating one mailbox (domain-wide delegation).
///
/// The key file is read and a new token is exchanged on every call.
#[derive(Clone)]
pub struct ServiceAccountCredentials {
    http: reqwest::Client,
    key_path: Option<PathBuf>,
    subject: String,
    scopes: Vec<String>,
    token_uri_override: Option<String>,
}

impl ServiceAccountCredentials {
    /// `key_path = None` yields credentials that fail every call with `NotConfigured`.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        key_path: Option<PathBuf>,
        subject: impl Into<String>,
        scopes: &[&str],
    ) -> Self {
        Self {
            http,
            key_path,
            subject: subject.into(),
            scopes: scopes.iter().map(|s| (*s).to_string()).collect(),
            token_uri_override: None,
        }
    }

    /// Exchange assertions at `uri` instead of the key file's `token_uri`.
    #[must_use]
    pub fn with_token_uri(mut self, uri: Option<String>) -> Self {
        self.token_uri_override = uri;
        self
    }

    async fn load_key(&self) -> Result<ServiceAccountKey, CredentialError> {
        let Some(path) = self.key_path.as_ref() else {
            return Err(CredentialError::NotConfigured("google service account"));
        };
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| CredentialError::ReadKey {
                path: path.display().to_string(),
                source,
            })?;
        serde_json::from_slice(&bytes).map_err(|source| CredentialError::ParseKey {
            path: path.display().to_string(),
            source,
        })
    }

    fn token_uri<'a>(&'a self, key: &'a ServiceAccountKey) -> &'a str {
        self.token_uri_override
            .as_deref()
            .or(key.token_uri.as_deref())
            .unwrap_or(super::DEFAULT_TOKEN_URI)
    }
}

/// Build the signed RS256 assertion for the JWT-bearer grant.
///
/// # Errors
///
/// Returns an error if the private key is not a valid RSA PEM.
pub fn sign_assertion(
    key: &ServiceAccountKey,
    subject: &str,
    scopes: &[String],
    audience: &str,
    now_unix_secs: u64,
) -> Result<String, CredentialError> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid.clone_from(&key.private_key_id);

    let claims = AssertionClaims {
        iss: &key.client_email,
        sub: subject,
        scope: scopes.join(" "),
        aud: audience,
        iat: now_unix_secs,
        exp: now_unix_secs + ASSERTION_LIFETIME_SECS,
    };
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    Ok(jsonwebtoken::encode(&header, &claims, &encoding_key)?)
}

#[async_trait]
impl AccessTokenSource for ServiceAccountCredentials {
    async fn access_token(&self) -> Result<String, CredentialError> {
        let key = self.load_key().await?;
        let token_uri = self.token_uri(&key);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| CredentialError::TokenExchange("system clock is before UNIX_EPOCH".into()))?
            .as_secs();
        let assertion = sign_assertion(&key, &self.subject, &self.scopes, token_uri, now)?;

        let resp = self
            .http
            .post(token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| CredentialError::TokenExchange(sanitize_reqwest_error(e)))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = match resp.text().await {
                Ok(body) => body,
                Err(e) => format!("<body unreadable: {}>", sanitize_reqwest_error(e)),
            };
            return Err(CredentialError::TokenExchange(format!(
                "token endpoint returned {}: {detail}",
                status.as_u16()
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| CredentialError::TokenExchange(sanitize_reqwest_error(e)))?;
        tracing::debug!(
            client_email = %key.client_email,
            subject = %self.subject,
            "exchanged service account assertion"
        );
        Ok(token.access_token)
    }
}
