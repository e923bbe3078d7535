//! Google Workspace clients (service account + domain-wide delegation).

pub mod calendar;
pub mod credentials;
pub mod gmail;

pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_GMAIL_BASE_URL: &str = "https://gmail.googleapis.com";
pub const DEFAULT_CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
