//! Credential providers and thin REST clients for the vendor APIs behind the gateway.
//!
//! Every client obtains fresh credentials on each call; nothing is cached between calls.
//! The `*Api` traits are the seams the gateway dispatches through, so tests can substitute
//! recording fakes for the real HTTP clients.

pub mod error;
pub mod google;
mod http;
pub mod salesforce;

pub use error::{CredentialError, Result, VendorError};
pub use google::calendar::{CalendarApi, CalendarClient};
pub use google::credentials::{AccessTokenSource, ServiceAccountCredentials, StaticToken};
pub use google::gmail::{GmailApi, GmailClient};
pub use salesforce::client::{QueryResult, SalesforceApi, SalesforceClient};
pub use salesforce::login::{SalesforceLogin, SalesforceSession};
