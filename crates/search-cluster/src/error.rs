//! Error types for search-cluster

use std::path::PathBuf;

/// Result type for search-cluster operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cluster configuration and resolution
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An identifier was given but no such cluster is configured
    #[error("unknown cluster \"{0}\"")]
    UnknownCluster(String),

    /// Multi-cluster mode requires an explicit cluster identifier
    #[error("a cluster identifier is required in multi-cluster mode")]
    ClusterIdentifierRequired,

    /// Single-cluster mode forbids cluster identifiers
    #[error("cluster identifier \"{0}\" is not allowed in single-cluster mode")]
    ClusterIdentifierNotAllowed(String),

    /// No authentication strategy could be selected for a cluster
    #[error("no authentication method available for cluster \"{cluster}\"")]
    NoAuthenticationAvailable { cluster: String },

    /// A cluster record is missing its endpoint
    #[error("cluster \"{cluster}\" has no endpoint configured")]
    MissingEndpoint { cluster: String },

    /// No cluster survived registry construction
    #[error("no clusters could be initialized from the configuration")]
    NoClusters,

    /// The configuration file could not be read
    #[error("failed to read configuration file {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be parsed
    #[error("failed to parse configuration file {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Invalid index security pattern in configuration
    #[error(transparent)]
    Policy(#[from] search_policy::Error),

    /// Backend failure while fetching the cluster version
    #[error(transparent)]
    Backend(#[from] search_backend::Error),
}
