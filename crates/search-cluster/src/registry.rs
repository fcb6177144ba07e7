//! The cluster registry
//!
//! Built once at startup, read-only afterwards. Each descriptor owns
//! its resolved authentication, its index security policy and a shared
//! executor handle; concurrent requests only ever read them. The
//! backend version is fetched lazily, cached per descriptor, and
//! invalidated only by an explicit refresh (replace-then-swap under a
//! lock, so in-flight readers keep the previous value).

use std::collections::BTreeMap;
use std::sync::Arc;

use semver::Version;
use search_backend::{BackendExecutor, HttpExecutor, RequestAuth, api};
use search_policy::IndexSecurityPolicy;
use tokio::sync::RwLock;

use crate::auth::AuthStrategy;
use crate::config::{BridgeConfig, ClusterConfig, IndexSecurityConfig};
use crate::error::{Error, Result};

/// How the bridge routes requests to clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterMode {
    /// Exactly one unnamed cluster; identifiers are forbidden
    Single,
    /// Named clusters; an identifier is required on every request
    Multi,
}

/// Builds an executor for a resolved connection
///
/// Injected so tests can substitute spies for the HTTP implementation.
pub type ExecutorFactory =
    dyn Fn(&str, RequestAuth) -> search_backend::Result<Arc<dyn BackendExecutor>> + Send + Sync;

/// One resolved cluster connection
pub struct ClusterDescriptor {
    name: Option<String>,
    endpoint: String,
    auth: AuthStrategy,
    policy: IndexSecurityPolicy,
    executor: Arc<dyn BackendExecutor>,
    version: RwLock<Option<Version>>,
}

impl ClusterDescriptor {
    /// The configured name, absent in single-cluster mode.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// A label for logs and error messages.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("default")
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn auth(&self) -> &AuthStrategy {
        &self.auth
    }

    pub fn policy(&self) -> &IndexSecurityPolicy {
        &self.policy
    }

    pub fn executor(&self) -> &Arc<dyn BackendExecutor> {
        &self.executor
    }

    /// The cached version, if one has been fetched.
    pub async fn cached_version(&self) -> Option<Version> {
        self.version.read().await.clone()
    }

    /// The backend version, fetched on first use and cached for the
    /// rest of the session.
    pub async fn version(&self) -> Result<Version> {
        if let Some(version) = self.version.read().await.clone() {
            return Ok(version);
        }
        self.refresh_version().await
    }

    /// Fetch the version again and replace the cached value.
    pub async fn refresh_version(&self) -> Result<Version> {
        let fetched = api::get_version(self.executor.as_ref()).await?;
        tracing::debug!(
            cluster = self.display_name(),
            version = %fetched,
            "resolved backend version"
        );
        *self.version.write().await = Some(fetched.clone());
        Ok(fetched)
    }
}

impl std::fmt::Debug for ClusterDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterDescriptor")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("auth", &self.auth.kind())
            .finish_non_exhaustive()
    }
}

/// Holds every resolved cluster connection for the process lifetime
pub struct ClusterRegistry {
    mode: ClusterMode,
    single: Option<Arc<ClusterDescriptor>>,
    named: BTreeMap<String, Arc<ClusterDescriptor>>,
}

impl std::fmt::Debug for ClusterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterRegistry")
            .field("mode", &self.mode)
            .field("clusters", &self.named.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ClusterRegistry {
    /// Build the registry with the production HTTP executor.
    pub async fn from_config(config: &BridgeConfig) -> Result<Self> {
        Self::from_config_with(config, &default_executor_factory).await
    }

    /// Build the registry with a caller-supplied executor factory.
    pub async fn from_config_with(
        config: &BridgeConfig,
        factory: &ExecutorFactory,
    ) -> Result<Self> {
        if config.is_multi_cluster() {
            let mut named = BTreeMap::new();
            for (name, cluster) in &config.clusters {
                match build_descriptor(Some(name), cluster, &config.index_security, factory).await
                {
                    Ok(descriptor) => {
                        named.insert(name.clone(), descriptor);
                    }
                    // One broken cluster must not take the others down.
                    Err(e) => {
                        tracing::error!(cluster = %name, error = %e, "skipping cluster");
                    }
                }
            }
            if named.is_empty() {
                return Err(Error::NoClusters);
            }
            Ok(Self {
                mode: ClusterMode::Multi,
                single: None,
                named,
            })
        } else {
            let connection = config.connection.as_ref().ok_or(Error::MissingEndpoint {
                cluster: "default".to_string(),
            })?;
            let descriptor =
                build_descriptor(None, connection, &config.index_security, factory).await?;
            Ok(Self {
                mode: ClusterMode::Single,
                single: Some(descriptor),
                named: BTreeMap::new(),
            })
        }
    }

    pub fn mode(&self) -> ClusterMode {
        self.mode
    }

    /// Resolve the target cluster for a request.
    pub fn resolve(&self, identifier: Option<&str>) -> Result<Arc<ClusterDescriptor>> {
        match (self.mode, identifier) {
            (ClusterMode::Single, None) => self.single.clone().ok_or(Error::NoClusters),
            (ClusterMode::Single, Some(identifier)) => {
                Err(Error::ClusterIdentifierNotAllowed(identifier.to_string()))
            }
            (ClusterMode::Multi, None) => Err(Error::ClusterIdentifierRequired),
            (ClusterMode::Multi, Some(identifier)) => self
                .named
                .get(identifier)
                .cloned()
                .ok_or_else(|| Error::UnknownCluster(identifier.to_string())),
        }
    }

    /// All descriptors, in stable name order.
    pub fn clusters(&self) -> impl Iterator<Item = &Arc<ClusterDescriptor>> {
        self.single.iter().chain(self.named.values())
    }

    pub fn len(&self) -> usize {
        if self.single.is_some() {
            1
        } else {
            self.named.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn build_descriptor(
    name: Option<&str>,
    cluster: &ClusterConfig,
    global_security: &Option<IndexSecurityConfig>,
    factory: &ExecutorFactory,
) -> Result<Arc<ClusterDescriptor>> {
    let label = name.unwrap_or("default");
    let endpoint = cluster
        .opensearch_url
        .clone()
        .ok_or_else(|| Error::MissingEndpoint {
            cluster: label.to_string(),
        })?;

    // Cluster-level security wins over the global default.
    let security = cluster.index_security.as_ref().or(global_security.as_ref());
    let policy = match security {
        Some(s) => {
            IndexSecurityPolicy::from_patterns(&s.allowed_index_patterns, &s.denied_index_patterns)?
        }
        None => IndexSecurityPolicy::allow_all(),
    };

    let auth = AuthStrategy::resolve(label, cluster).await?;
    let request_auth = auth.request_auth(label).await?;
    let executor = factory(&endpoint, request_auth)?;

    tracing::info!(
        cluster = label,
        endpoint = %endpoint,
        auth = auth.kind(),
        restricted = !policy.is_unrestricted(),
        "initialized cluster connection"
    );

    Ok(Arc::new(ClusterDescriptor {
        name: name.map(str::to_string),
        endpoint,
        auth,
        policy,
        executor,
        version: RwLock::new(None),
    }))
}

fn default_executor_factory(
    endpoint: &str,
    auth: RequestAuth,
) -> search_backend::Result<Arc<dyn BackendExecutor>> {
    Ok(Arc::new(HttpExecutor::new(endpoint, auth)?))
}
