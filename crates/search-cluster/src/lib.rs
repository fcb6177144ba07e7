//! Cluster configuration and connection registry
//!
//! Owns everything between "a raw configuration record" and "a
//! resolved, ready-to-use cluster connection":
//!
//! - [`config`] - the YAML/env configuration surface (single
//!   `connection:` record or a named `clusters:` map, per-cluster and
//!   global index security, the global tool filter)
//! - [`auth`] - authentication strategy selection by strict priority
//! - [`registry`] - the construct-once [`ClusterRegistry`] with
//!   identifier routing and cached backend version lookup
//!
//! The registry is built before any request is accepted and is
//! read-only afterwards; descriptors are shared as `Arc` handles.

pub mod auth;
pub mod config;
pub mod error;
pub mod registry;

pub use auth::AuthStrategy;
pub use config::{BridgeConfig, ClusterConfig, IndexSecurityConfig, ToolFilterConfig};
pub use error::{Error, Result};
pub use registry::{ClusterDescriptor, ClusterMode, ClusterRegistry, ExecutorFactory};
