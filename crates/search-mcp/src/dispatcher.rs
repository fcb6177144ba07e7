//! The per-request dispatch state machine
//!
//! Every tool call walks the same fixed sequence:
//!
//! ```text
//! Received -> Validated -> Compatible -> Resolved -> Authorized
//!          -> Executed -> {Succeeded, Failed}
//! ```
//!
//! No step is skipped and none run out of order. Authorization must
//! come after resolution (the target cluster's policy applies) and
//! before execution (no backend call happens for a denied resource).
//! The version gate needs the target's version, so cluster resolution
//! happens inside the Compatible step and the Resolved step binds the
//! executor handle carried into execution.
//!
//! Every failure is recovered into a typed [`Error`] here; nothing
//! escapes a dispatch as a panic or unhandled fault.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use search_cluster::{ClusterMode, ClusterRegistry, ToolFilterConfig};

use crate::compat;
use crate::error::{Error, Result};
use crate::filter::ToolFilter;
use crate::tools::{ToolRegistry, ToolResult};

/// The request orchestrator
///
/// Holds the visible tool set and the cluster registry; both are
/// read-only after construction, so concurrent dispatches share one
/// instance freely.
pub struct Dispatcher {
    tools: ToolRegistry,
    clusters: Arc<ClusterRegistry>,
    timeout: Duration,
}

impl Dispatcher {
    /// Build the dispatcher, applying the tool filter and the startup
    /// version prune in single-cluster mode.
    pub async fn new(
        clusters: Arc<ClusterRegistry>,
        filter: Option<&ToolFilterConfig>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut tools = ToolRegistry::all();

        if clusters.mode() == ClusterMode::Single {
            if let Some(filter) = filter {
                ToolFilter::from_config(filter)?.apply(&mut tools);
            }

            // One backend, one version: prune incompatible tools now
            // instead of gating every call.
            let descriptor = clusters.resolve(None)?;
            match descriptor.version().await {
                Ok(version) => {
                    let before = tools.len();
                    tools.retain(|t| compat::check(t, &version).is_ok());
                    if tools.len() != before {
                        tracing::info!(
                            version = %version,
                            pruned = before - tools.len(),
                            "removed tools unsupported by the backend version"
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "backend version unavailable at startup, gating tools per request"
                    );
                }
            }
        } else if filter.is_some() {
            tracing::warn!("tool_filter is ignored in multi-cluster mode");
        }

        Ok(Self {
            tools,
            clusters,
            timeout,
        })
    }

    /// The tools exposed to `tools/list`.
    pub fn visible_tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn cluster_mode(&self) -> ClusterMode {
        self.clusters.mode()
    }

    /// Run one tool call through the state machine.
    pub async fn dispatch(&self, tool_name: &str, arguments: Value) -> Result<ToolResult> {
        // Received: the tool must be in the visible set.
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| Error::UnknownTool(tool_name.to_string()))?;

        // Received -> Validated
        (tool.validate)(tool.name, &arguments)?;
        tracing::debug!(tool = tool.name, "arguments validated");

        let identifier = arguments
            .get("opensearch_cluster")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let pipeline = async move {
            // Validated -> Compatible. Resolution happens inside this
            // step; the gate needs the target cluster's version.
            let cluster = self.clusters.resolve(identifier.as_deref())?;
            if tool.min_version.is_some() || tool.max_version.is_some() {
                let version = cluster.version().await?;
                compat::check(tool, &version)?;
            }

            // Compatible -> Resolved: `cluster` now binds the executor
            // handle used for execution.
            tracing::debug!(
                tool = tool.name,
                cluster = cluster.display_name(),
                "cluster resolved"
            );

            // Resolved -> Authorized: every resource-bearing argument
            // field is checked against the cluster's policy.
            for field in tool.resource_fields {
                if let Some(name) = arguments.get(*field).and_then(Value::as_str) {
                    cluster.policy().check(name)?;
                }
            }

            // Authorized -> Executed
            (tool.handler)(arguments, cluster).await
        };

        // The bound covers everything that can touch the backend, the
        // version lookup included, so a hung endpoint cannot stall a
        // dispatch past the configured limit.
        let seconds = self.timeout.as_secs();
        match tokio::time::timeout(self.timeout, pipeline).await {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::BackendTimeout { seconds }),
        }
    }
}
