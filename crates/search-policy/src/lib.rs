//! Index-level access control for the OpenSearch MCP bridge
//!
//! This crate decides whether a request may touch a given index name.
//! Policies are built once from configuration and are read-only
//! afterwards, so they can be shared freely across concurrent requests.
//!
//! Two layers:
//! - [`pattern`] - ordered pattern sets (shell-style wildcards or
//!   `regex:`-prefixed expressions) with any-match semantics
//! - [`access`] - the allow/deny decision with its fixed precedence:
//!   wildcard names bypass, denied patterns win over allowed patterns,
//!   a non-empty allow list is exhaustive

pub mod access;
pub mod error;
pub mod pattern;

pub use access::{AccessViolation, IndexSecurityPolicy};
pub use error::{Error, Result};
pub use pattern::{Pattern, PatternSet};
