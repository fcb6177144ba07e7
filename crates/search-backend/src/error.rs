//! Error types for search-backend

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while executing a backend call
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure (connection, TLS, ...)
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("backend returned {status} for {method} {path}: {body}")]
    Status {
        status: u16,
        method: String,
        path: String,
        body: String,
    },

    /// The response body could not be decoded
    #[error("backend response decoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The response decoded but did not have the expected shape
    #[error("unexpected backend response: {0}")]
    UnexpectedResponse(String),

    /// The backend version string could not be parsed
    #[error("unparseable backend version \"{0}\"")]
    InvalidVersion(String),

    /// Credential material could not be obtained for request signing
    #[error("request signing failed: {0}")]
    Signing(String),

    /// The endpoint URL in the connection handle is invalid
    #[error("invalid backend endpoint \"{endpoint}\": {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}
