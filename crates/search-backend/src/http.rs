//! Production HTTP executor
//!
//! Applies the cluster's resolved authentication strategy to every
//! outgoing request: nothing for anonymous, an `Authorization: Basic`
//! header for credential auth, or a SigV4 signature derived from
//! freshly provided credentials for the role/ambient strategies.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::executor::{BackendCall, BackendExecutor, BackendResponse, Method};
use crate::sigv4::{self, SigningCredentials, SigningRequest};

/// Per-request ceiling for the underlying HTTP client
const CLIENT_TIMEOUT: Duration = Duration::from_secs(90);

/// Provides point-in-time signing credentials for SigV4 requests
///
/// Implemented by the cluster layer over the cloud SDK's credential
/// chain; credentials are fetched per request so rotation and session
/// expiry are handled upstream without tearing down the executor.
#[async_trait]
pub trait SigningCredentialsProvider: Send + Sync {
    async fn signing_credentials(&self) -> Result<SigningCredentials>;
}

/// Authentication applied to outgoing backend requests
#[derive(Clone)]
pub enum RequestAuth {
    /// No authentication material attached
    Anonymous,
    /// HTTP basic authentication
    Basic { username: String, password: String },
    /// SigV4 signing with credentials from the given provider
    SigV4 {
        provider: Arc<dyn SigningCredentialsProvider>,
        region: String,
    },
}

impl std::fmt::Debug for RequestAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestAuth::Anonymous => write!(f, "Anonymous"),
            RequestAuth::Basic { username, .. } => {
                write!(f, "Basic {{ username: {username:?}, password: <redacted> }}")
            }
            RequestAuth::SigV4 { region, .. } => write!(f, "SigV4 {{ region: {region:?} }}"),
        }
    }
}

/// reqwest-backed [`BackendExecutor`] bound to one cluster endpoint
pub struct HttpExecutor {
    client: reqwest::Client,
    base: Url,
    auth: RequestAuth,
}

impl HttpExecutor {
    pub fn new(endpoint: &str, auth: RequestAuth) -> Result<Self> {
        let mut base = Url::parse(endpoint).map_err(|e| Error::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        // Url::join drops the last path segment without this
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        if base.host_str().is_none() {
            return Err(Error::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "missing host".to_string(),
            });
        }
        // An unresponsive endpoint must not hang callers that run
        // outside the dispatch bound, such as the startup version fetch.
        let client = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .map_err(Error::Http)?;
        Ok(Self { client, base, auth })
    }

    fn method(&self, method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
        }
    }
}

#[async_trait]
impl BackendExecutor for HttpExecutor {
    async fn execute(&self, call: BackendCall) -> Result<BackendResponse> {
        let mut url = self
            .base
            .join(call.path.trim_start_matches('/'))
            .map_err(|e| Error::InvalidEndpoint {
                endpoint: call.path.clone(),
                reason: e.to_string(),
            })?;

        // The canonical form is used both for the URL and, when
        // signing, for the canonical request, so they cannot diverge.
        let query = sigv4::canonical_query(&call.query);
        if !query.is_empty() {
            url.set_query(Some(&query));
        }

        let body = match &call.body {
            Some(value) => serde_json::to_vec(value)?,
            None => Vec::new(),
        };

        let mut request = self
            .client
            .request(self.method(call.method), url.clone());
        if call.body.is_some() {
            request = request.header(CONTENT_TYPE, "application/json");
        }

        match &self.auth {
            RequestAuth::Anonymous => {}
            RequestAuth::Basic { username, password } => {
                request = request.basic_auth(username, Some(password));
            }
            RequestAuth::SigV4 { provider, region } => {
                let credentials = provider.signing_credentials().await?;
                let host = match (url.host_str(), url.port()) {
                    (Some(h), Some(p)) => format!("{h}:{p}"),
                    (Some(h), None) => h.to_string(),
                    (None, _) => unreachable!("validated at construction"),
                };
                let signing = SigningRequest {
                    credentials: &credentials,
                    region,
                    method: call.method.as_str(),
                    host: &host,
                    path: url.path(),
                    canonical_query: &query,
                    payload: &body,
                };
                for (name, value) in sigv4::sign(&signing) {
                    request = request.header(name, value);
                }
            }
        }

        if !body.is_empty() {
            request = request.body(body);
        }

        tracing::debug!(method = call.method.as_str(), path = %call.path, "executing backend call");

        let response = request.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                method: call.method.as_str().to_string(),
                path: call.path,
                body: truncate(&text, 512),
            });
        }

        if content_type.contains("json") {
            let value: Value = serde_json::from_str(&text)?;
            Ok(BackendResponse::Json(value))
        } else {
            Ok(BackendResponse::Text(text))
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        text.to_string()
    } else {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_endpoint() {
        assert!(HttpExecutor::new("not a url", RequestAuth::Anonymous).is_err());
        assert!(HttpExecutor::new("file:///tmp", RequestAuth::Anonymous).is_err());
        assert!(HttpExecutor::new("http://localhost:9200", RequestAuth::Anonymous).is_ok());
    }

    #[test]
    fn debug_redacts_secrets() {
        let auth = RequestAuth::Basic {
            username: "admin".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{auth:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 512), "short");
        let long = "é".repeat(300);
        let cut = truncate(&long, 511);
        assert!(cut.ends_with("..."));
    }
}
