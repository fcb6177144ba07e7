//! MCP server for OpenSearch clusters
//!
//! Exposes a fixed catalogue of OpenSearch operations as MCP tools over
//! JSON-RPC 2.0/stdio. Each call runs through the dispatch state
//! machine: argument validation, the version compatibility gate,
//! cluster resolution, index access control and finally the bounded
//! backend call.
//!
//! - [`tools`] - the static tool catalogue and typed argument models
//! - [`filter`] - configured tool exposure rules (single-cluster mode)
//! - [`compat`] - the version compatibility gate
//! - [`dispatcher`] - the per-request state machine
//! - [`handlers`] - per-tool execution and response rendering
//! - [`protocol`], [`server`] - JSON-RPC message types and stdio loop

pub mod compat;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod tools;

pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use filter::ToolFilter;
pub use server::BridgeServer;
pub use tools::{ToolDescriptor, ToolRegistry, ToolResult};
