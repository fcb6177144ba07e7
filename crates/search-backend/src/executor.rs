//! The backend call boundary
//!
//! [`BackendExecutor`] is the single seam between the dispatch engine
//! and the cluster's REST API. A call is a method, a path, query
//! parameters and an optional JSON body; a response is either JSON or
//! plain text (some cat/diagnostic endpoints answer text).

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};

/// HTTP method of a backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }
}

/// One backend operation, ready for execution
#[derive(Debug, Clone)]
pub struct BackendCall {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl BackendCall {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A backend response body
#[derive(Debug, Clone)]
pub enum BackendResponse {
    Json(Value),
    Text(String),
}

impl BackendResponse {
    /// Extract the JSON payload, failing on text responses.
    pub fn into_json(self) -> Result<Value> {
        match self {
            BackendResponse::Json(value) => Ok(value),
            BackendResponse::Text(text) => Err(Error::UnexpectedResponse(format!(
                "expected JSON, got text response ({} bytes)",
                text.len()
            ))),
        }
    }

    /// Render the payload as text (pretty JSON for JSON responses).
    pub fn into_text(self) -> String {
        match self {
            BackendResponse::Json(value) => {
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            }
            BackendResponse::Text(text) => text,
        }
    }
}

/// Executes one backend operation against a resolved cluster connection
///
/// Implementations must be safe for unlimited concurrent use; the same
/// executor instance is shared by every in-flight request targeting its
/// cluster.
#[async_trait]
pub trait BackendExecutor: Send + Sync {
    async fn execute(&self, call: BackendCall) -> Result<BackendResponse>;
}
