mod catalog;
mod core;
mod http;
mod log_payload;
mod schemas;
mod workflow;

pub use core::OattyMcpCore;
pub use http::{McpHttpLogEntry, McpHttpServer, RunningMcpHttpServer, resolve_bind_address};
