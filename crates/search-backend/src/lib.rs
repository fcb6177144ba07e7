//! Backend call executor for the OpenSearch MCP bridge
//!
//! This crate owns the outbound boundary: one opaque "execute a backend
//! operation" call against a resolved cluster connection. The rest of
//! the bridge only sees the [`BackendExecutor`] trait, so tests swap in
//! spies and the dispatcher never learns about HTTP.
//!
//! - [`executor`] - the trait, [`BackendCall`] and [`BackendResponse`]
//! - [`http`] - the production reqwest implementation, applying the
//!   resolved authentication strategy per request
//! - [`sigv4`] - AWS SigV4 request signing for role/ambient strategies
//! - [`api`] - thin helpers, one per backend REST operation

pub mod api;
pub mod error;
pub mod executor;
pub mod http;
pub mod sigv4;

pub use error::{Error, Result};
pub use executor::{BackendCall, BackendExecutor, BackendResponse, Method};
pub use http::{HttpExecutor, RequestAuth, SigningCredentialsProvider};
pub use sigv4::SigningCredentials;
