//! Error types for vendor calls.

use thiserror::Error;

/// Failure to obtain credentials for a vendor API.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// The integration has no credential material configured.
    #[error("{0} credentials are not configured")]
    NotConfigured(&'static str),

    #[error("failed to read service account key '{path}': {source}")]
    ReadKey {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse service account key '{path}': {source}")]
    ParseKey {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Signing the JWT assertion failed (usually a malformed private key).
    #[error("failed to sign jwt assertion: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),

    /// The OAuth token endpoint rejected the assertion or could not be reached.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// Salesforce SOAP login failed.
    #[error("salesforce login failed: {0}")]
    Login(String),
}

/// Failure of a single vendor API call.
#[derive(Error, Debug)]
pub enum VendorError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Connect/timeout/IO errors (URLs are stripped from the message).
    #[error("http transport error: {0}")]
    Transport(String),

    /// The vendor returned a non-2xx status.
    #[error("{vendor} API returned {status}: {body}")]
    Api {
        vendor: &'static str,
        status: u16,
        body: serde_json::Value,
    },

    /// The vendor returned a 2xx body we could not interpret.
    #[error("failed to decode {vendor} response: {message}")]
    Decode {
        vendor: &'static str,
        message: String,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for VendorError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(sanitize_reqwest_error(value))
    }
}

/// Render a reqwest error without the request URL (query strings may carry secrets).
pub(crate) fn sanitize_reqwest_error(e: reqwest::Error) -> String {
    e.without_url().to_string()
}

/// Result type alias for vendor calls.
pub type Result<T> = std::result::Result<T, VendorError>;
