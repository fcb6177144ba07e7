//! Authentication strategy resolution
//!
//! One strategy is selected per cluster at registry construction, by
//! strict priority - first satisfied wins, strategies never combine:
//!
//! 1. explicit `opensearch_no_auth` - anonymous
//! 2. `iam_arn` configured - assumed-role SigV4 signing
//! 3. username and password configured - basic credentials
//! 4. ambient AWS credentials discoverable - ambient SigV4 signing
//!
//! This order is a hard contract. Reordering it silently changes which
//! credentials are used in mixed-configuration environments.

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use search_backend::{RequestAuth, SigningCredentials, SigningCredentialsProvider};

use crate::config::ClusterConfig;
use crate::error::{Error, Result};

/// STS session name used for assumed-role connections
const SESSION_NAME: &str = "opensearch-mcp-bridge";

/// Region assumed when neither the cluster record nor the environment
/// names one
const DEFAULT_REGION: &str = "us-east-1";

/// The authentication strategy resolved for one cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// No authentication material is attached to requests
    Anonymous,
    /// SigV4 signing with credentials from an assumed IAM role
    AssumedRole { role_arn: String, region: String },
    /// HTTP basic authentication with static credentials
    Basic { username: String, password: String },
    /// SigV4 signing with ambient credentials from the default chain
    AmbientSigV4 { region: String },
}

impl AuthStrategy {
    /// Select a strategy for `cluster` from its raw configuration.
    pub async fn resolve(cluster: &str, config: &ClusterConfig) -> Result<Self> {
        match Self::explicit(config) {
            Some(strategy) => Ok(strategy),
            None => Self::fallback(cluster, config, ambient_credentials_available().await),
        }
    }

    /// Priorities 1-3: strategies decidable from the record alone.
    fn explicit(config: &ClusterConfig) -> Option<Self> {
        if config.opensearch_no_auth {
            return Some(AuthStrategy::Anonymous);
        }
        if let Some(role_arn) = &config.iam_arn {
            return Some(AuthStrategy::AssumedRole {
                role_arn: role_arn.clone(),
                region: region_for(config),
            });
        }
        if let (Some(username), Some(password)) =
            (&config.opensearch_username, &config.opensearch_password)
        {
            return Some(AuthStrategy::Basic {
                username: username.clone(),
                password: password.clone(),
            });
        }
        None
    }

    /// Priority 4 and the failure case.
    fn fallback(cluster: &str, config: &ClusterConfig, ambient_available: bool) -> Result<Self> {
        if ambient_available {
            return Ok(AuthStrategy::AmbientSigV4 {
                region: region_for(config),
            });
        }
        Err(Error::NoAuthenticationAvailable {
            cluster: cluster.to_string(),
        })
    }

    /// A short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthStrategy::Anonymous => "anonymous",
            AuthStrategy::AssumedRole { .. } => "assumed-role",
            AuthStrategy::Basic { .. } => "basic",
            AuthStrategy::AmbientSigV4 { .. } => "ambient-sigv4",
        }
    }

    /// Materialize the per-request authentication for this strategy.
    ///
    /// For the SigV4 strategies this builds the credential provider the
    /// executor draws from on every request, so rotation and session
    /// expiry never require rebuilding the connection handle.
    pub async fn request_auth(&self, cluster: &str) -> Result<RequestAuth> {
        match self {
            AuthStrategy::Anonymous => Ok(RequestAuth::Anonymous),
            AuthStrategy::Basic { username, password } => Ok(RequestAuth::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            AuthStrategy::AssumedRole { role_arn, region } => {
                let provider = aws_config::sts::AssumeRoleProvider::builder(role_arn.clone())
                    .session_name(SESSION_NAME)
                    .region(Region::new(region.clone()))
                    .build()
                    .await;
                Ok(RequestAuth::SigV4 {
                    provider: Arc::new(AwsCredentialsSource {
                        provider: SharedCredentialsProvider::new(provider),
                    }),
                    region: region.clone(),
                })
            }
            AuthStrategy::AmbientSigV4 { region } => {
                let sdk_config = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(region.clone()))
                    .load()
                    .await;
                let provider = sdk_config.credentials_provider().ok_or_else(|| {
                    Error::NoAuthenticationAvailable {
                        cluster: cluster.to_string(),
                    }
                })?;
                Ok(RequestAuth::SigV4 {
                    provider: Arc::new(AwsCredentialsSource { provider }),
                    region: region.clone(),
                })
            }
        }
    }
}

/// Bridges the AWS credential chain to the executor's signing seam
struct AwsCredentialsSource {
    provider: SharedCredentialsProvider,
}

#[async_trait]
impl SigningCredentialsProvider for AwsCredentialsSource {
    async fn signing_credentials(&self) -> search_backend::Result<SigningCredentials> {
        let credentials = self
            .provider
            .provide_credentials()
            .await
            .map_err(|e| search_backend::Error::Signing(e.to_string()))?;
        Ok(SigningCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().map(str::to_string),
        })
    }
}

fn region_for(config: &ClusterConfig) -> String {
    config
        .aws_region
        .clone()
        .or_else(|| std::env::var("AWS_REGION").ok())
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}

/// Probe the default credential chain once at resolution time.
async fn ambient_credentials_available() -> bool {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    match sdk_config.credentials_provider() {
        Some(provider) => provider.provide_credentials().await.is_ok(),
        None => false,
    }
}
