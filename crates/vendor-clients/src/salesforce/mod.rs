//! Salesforce clients (SOAP partner login + REST data API).

pub mod client;
pub mod login;

pub const DEFAULT_API_VERSION: &str = "59.0";
pub const DEFAULT_DOMAIN: &str = "login";
