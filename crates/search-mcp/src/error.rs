//! Error types for the MCP bridge
//!
//! Every failure a request can hit is recovered into one of these
//! variants at the dispatcher boundary and rendered as a tool result;
//! nothing propagates past it as a panic or unhandled fault.

use semver::Version;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while dispatching a tool call
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested tool is not in the visible set
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The arguments did not match the tool's schema
    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    /// The tool is outside the target cluster's supported version range
    #[error("{}", incompatible_message(.tool, .current, .supported.as_deref()))]
    IncompatibleVersion {
        tool: String,
        current: Version,
        /// Human-readable supported range, absent when unbounded
        supported: Option<String>,
    },

    /// A tool filter rule could not be compiled
    #[error("invalid tool filter regex \"{pattern}\"")]
    InvalidFilterRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Cluster routing or configuration failure
    #[error(transparent)]
    Cluster(#[from] search_cluster::Error),

    /// An index access policy violation
    #[error("access denied: {0}")]
    AccessDenied(#[from] search_policy::AccessViolation),

    /// The backend collaborator failed
    #[error("backend error: {0}")]
    Backend(#[from] search_backend::Error),

    /// The backend call exceeded the dispatch timeout
    #[error("backend call timed out after {seconds}s")]
    BackendTimeout { seconds: u64 },

    /// Error during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error on the stdio transport
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The tool task was aborted or panicked
    #[error("tool execution aborted: {0}")]
    Aborted(String),
}

impl Error {
    /// A stable label for the failure kind, used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnknownTool(_) => "unknown_tool",
            Error::InvalidArguments { .. } => "invalid_arguments",
            Error::IncompatibleVersion { .. } => "incompatible_version",
            Error::InvalidFilterRegex { .. } => "invalid_filter",
            Error::Cluster(e) => match e {
                search_cluster::Error::UnknownCluster(_) => "unknown_cluster",
                search_cluster::Error::ClusterIdentifierRequired => "cluster_identifier_required",
                search_cluster::Error::ClusterIdentifierNotAllowed(_) => {
                    "cluster_identifier_not_allowed"
                }
                search_cluster::Error::NoAuthenticationAvailable { .. } => {
                    "no_authentication_available"
                }
                search_cluster::Error::Backend(_) => "backend_error",
                _ => "cluster_error",
            },
            Error::AccessDenied(_) => "access_denied",
            // A timeout is a backend failure; the message carries the
            // timeout detail.
            Error::Backend(_) | Error::BackendTimeout { .. } => "backend_error",
            Error::Json(_) => "json_error",
            Error::Io(_) => "io_error",
            Error::Aborted(_) => "aborted",
        }
    }
}

/// Render the incompatibility message with the original wording.
fn incompatible_message(tool: &str, current: &Version, supported: Option<&str>) -> String {
    let mut message = format!(
        "Tool '{tool}' is not supported for this OpenSearch version (current version: {current})."
    );
    if let Some(range) = supported {
        message.push_str(&format!(" Supported version: {range}."));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incompatible_version_names_tool_and_range() {
        let err = Error::IncompatibleVersion {
            tool: "GetQueryInsightsTool".to_string(),
            current: Version::new(2, 9, 0),
            supported: Some("2.12.0 or later".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("GetQueryInsightsTool"));
        assert!(msg.contains("current version: 2.9.0"));
        assert!(msg.contains("Supported version: 2.12.0 or later."));
    }

    #[test]
    fn kinds_are_stable_labels() {
        assert_eq!(Error::UnknownTool("x".to_string()).kind(), "unknown_tool");
        assert_eq!(
            Error::Cluster(search_cluster::Error::ClusterIdentifierRequired).kind(),
            "cluster_identifier_required"
        );
    }

    #[test]
    fn timeouts_report_the_backend_kind_with_the_detail_in_the_message() {
        let err = Error::BackendTimeout { seconds: 30 };
        assert_eq!(err.kind(), "backend_error");
        assert!(err.to_string().contains("timed out after 30s"));
    }
}
