//! Authenticated MCP tool gateway for Gmail, Google Calendar and Salesforce.
//!
//! One `POST /` JSON-RPC endpoint guarded by a single shared api key, dispatching into a
//! fixed registry of tools that call the vendor APIs in `revops-vendor-clients`.

pub mod auth;
pub mod config;
pub mod jsonrpc;
pub mod registry;
pub mod server;
pub mod tools;
pub mod validate;
pub mod vendors;

pub use config::GatewayConfig;
pub use server::{Gateway, router, serve};
pub use vendors::Vendors;
