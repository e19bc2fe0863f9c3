//! Thin blocking client for the agent-management API.

mod client;
mod error;
mod session;
mod types;

pub use client::AgentClient;
pub use error::ClientError;
pub use session::Session;
pub use types::{is_truthy, AgentTarget, DafExportOptions, ExportOptions, HealthReport};
