//! Error types for search-policy

/// Result type for search-policy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a policy
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configured pattern failed to compile
    #[error("invalid pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
