//! End-to-end dispatch tests
//!
//! Exercises the complete flow from a YAML configuration file through
//! registry construction to dispatched tool calls, with a spy executor
//! standing in for the backend.

use std::collections::BTreeMap;
use std::io::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use search_backend::{BackendCall, BackendExecutor, BackendResponse, RequestAuth};
use search_cluster::{BridgeConfig, ClusterConfig, ClusterRegistry, IndexSecurityConfig};
use search_mcp::{Dispatcher, Error};

/// Spy executor shared across every configured cluster
struct Spy {
    version: &'static str,
    calls: AtomicUsize,
    paths: Mutex<Vec<String>>,
}

impl Spy {
    fn new(version: &'static str) -> Arc<Self> {
        Arc::new(Self {
            version,
            calls: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackendExecutor for Spy {
    async fn execute(&self, call: BackendCall) -> search_backend::Result<BackendResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().unwrap().push(call.path.clone());
        if call.path == "/" {
            return Ok(BackendResponse::Json(json!({
                "version": {"number": self.version}
            })));
        }
        Ok(BackendResponse::Json(json!([
            {"index": "logs-app", "docs.count": "1200", "store.size": "4mb"}
        ])))
    }
}

async fn registry_with(config: &BridgeConfig, spy: Arc<Spy>) -> Arc<ClusterRegistry> {
    let factory = move |_: &str,
                        _: RequestAuth|
          -> search_backend::Result<Arc<dyn BackendExecutor>> { Ok(spy.clone()) };
    Arc::new(
        ClusterRegistry::from_config_with(config, &factory)
            .await
            .unwrap(),
    )
}

fn multi_cluster_config() -> BridgeConfig {
    let mut clusters = BTreeMap::new();
    clusters.insert(
        "prod".to_string(),
        ClusterConfig {
            opensearch_url: Some("https://prod.example.com:9200".to_string()),
            opensearch_no_auth: true,
            index_security: Some(IndexSecurityConfig {
                allowed_index_patterns: vec![],
                denied_index_patterns: vec!["sensitive-*".to_string()],
            }),
            ..ClusterConfig::default()
        },
    );
    clusters.insert(
        "staging".to_string(),
        ClusterConfig {
            opensearch_url: Some("http://staging.example.com:9200".to_string()),
            opensearch_no_auth: true,
            ..ClusterConfig::default()
        },
    );
    BridgeConfig {
        clusters,
        ..BridgeConfig::default()
    }
}

#[tokio::test]
async fn denied_resource_never_reaches_the_backend() {
    let spy = Spy::new("2.11.0");
    let registry = registry_with(&multi_cluster_config(), spy.clone()).await;
    let dispatcher = Dispatcher::new(registry, None, Duration::from_secs(30))
        .await
        .unwrap();

    let err = dispatcher
        .dispatch(
            "SearchIndexTool",
            json!({
                "index": "sensitive-logs-2024",
                "query": {"match_all": {}},
                "opensearch_cluster": "prod"
            }),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::AccessDenied(_)));
    assert!(err.to_string().contains("sensitive-logs-2024"));
    // Nothing at all hit the backend, not even a version lookup
    // (SearchIndexTool has no version bounds).
    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn wildcard_expression_bypasses_the_policy() {
    let spy = Spy::new("2.11.0");
    let registry = registry_with(&multi_cluster_config(), spy.clone()).await;
    let dispatcher = Dispatcher::new(registry, None, Duration::from_secs(30))
        .await
        .unwrap();

    let result = dispatcher
        .dispatch(
            "SearchIndexTool",
            json!({
                "index": "logs-*",
                "query": {"match_all": {}},
                "opensearch_cluster": "prod"
            }),
        )
        .await
        .unwrap();

    assert!(result.is_error.is_none());
    // Exactly one backend call: the search itself.
    assert_eq!(spy.calls(), 1);
    assert_eq!(spy.paths(), vec!["/logs-*/_search".to_string()]);
}

#[tokio::test]
async fn per_cluster_policies_are_independent() {
    let spy = Spy::new("2.11.0");
    let registry = registry_with(&multi_cluster_config(), spy.clone()).await;
    let dispatcher = Dispatcher::new(registry, None, Duration::from_secs(30))
        .await
        .unwrap();

    // prod denies sensitive-*, staging has no restrictions
    let args = json!({
        "index": "sensitive-logs-2024",
        "query": {"match_all": {}},
        "opensearch_cluster": "staging"
    });
    let result = dispatcher.dispatch("SearchIndexTool", args).await.unwrap();
    assert!(result.is_error.is_none());
    assert_eq!(spy.calls(), 1);
}

#[tokio::test]
async fn version_gate_runs_per_request_in_multi_mode() {
    let spy = Spy::new("2.9.0");
    let registry = registry_with(&multi_cluster_config(), spy.clone()).await;
    let dispatcher = Dispatcher::new(registry, None, Duration::from_secs(30))
        .await
        .unwrap();

    let err = dispatcher
        .dispatch(
            "GetQueryInsightsTool",
            json!({"opensearch_cluster": "prod"}),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::IncompatibleVersion { .. }));
    // Only the version lookup reached the backend; the tool call was
    // gated off before execution.
    assert_eq!(spy.paths(), vec!["/".to_string()]);

    // The version is cached, so a second attempt adds no calls.
    let err = dispatcher
        .dispatch(
            "GetQueryInsightsTool",
            json!({"opensearch_cluster": "prod"}),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::IncompatibleVersion { .. }));
    assert_eq!(spy.calls(), 1);
}

#[tokio::test]
async fn yaml_configuration_flows_through_to_dispatch() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(
        br#"
clusters:
  prod:
    opensearch_url: https://prod.example.com:9200
    opensearch_no_auth: true
    index_security:
      denied_index_patterns: ["sensitive-*"]
index_security:
  allowed_index_patterns: ["logs-*"]
"#,
    )
    .unwrap();

    let config = BridgeConfig::from_yaml_file(file.path()).unwrap();
    let spy = Spy::new("2.11.0");
    let registry = registry_with(&config, spy.clone()).await;
    let dispatcher = Dispatcher::new(registry, None, Duration::from_secs(30))
        .await
        .unwrap();

    // prod's own denied list overrides the global allow default
    let err = dispatcher
        .dispatch(
            "IndexMappingTool",
            json!({"index": "sensitive-audit", "opensearch_cluster": "prod"}),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AccessDenied(_)));

    let result = dispatcher
        .dispatch(
            "IndexMappingTool",
            json!({"index": "anything-else", "opensearch_cluster": "prod"}),
        )
        .await
        .unwrap();
    assert!(result.is_error.is_none());
}

#[tokio::test]
async fn list_indices_forwards_allow_patterns_to_the_backend() {
    let config = BridgeConfig {
        connection: Some(ClusterConfig {
            opensearch_url: Some("http://localhost:9200".to_string()),
            opensearch_no_auth: true,
            index_security: Some(IndexSecurityConfig {
                allowed_index_patterns: vec!["logs-*".to_string(), "metrics-*".to_string()],
                denied_index_patterns: vec![],
            }),
            ..ClusterConfig::default()
        }),
        ..BridgeConfig::default()
    };

    let spy = Spy::new("2.11.0");
    let registry = registry_with(&config, spy.clone()).await;
    let dispatcher = Dispatcher::new(registry, None, Duration::from_secs(30))
        .await
        .unwrap();

    let result = dispatcher
        .dispatch("ListIndexTool", json!({}))
        .await
        .unwrap();
    assert!(result.is_error.is_none());

    // The allow patterns ride along as a native index expression.
    assert!(
        spy.paths()
            .contains(&"/_cat/indices/logs-*,metrics-*".to_string())
    );
}

#[tokio::test]
async fn routing_misuse_is_rejected_in_both_modes() {
    let spy = Spy::new("2.11.0");

    let single = BridgeConfig {
        connection: Some(ClusterConfig {
            opensearch_url: Some("http://localhost:9200".to_string()),
            opensearch_no_auth: true,
            ..ClusterConfig::default()
        }),
        ..BridgeConfig::default()
    };
    let registry = registry_with(&single, spy.clone()).await;
    let dispatcher = Dispatcher::new(registry, None, Duration::from_secs(30))
        .await
        .unwrap();
    let err = dispatcher
        .dispatch("ListIndexTool", json!({"opensearch_cluster": "prod"}))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "cluster_identifier_not_allowed");

    let registry = registry_with(&multi_cluster_config(), spy).await;
    let dispatcher = Dispatcher::new(registry, None, Duration::from_secs(30))
        .await
        .unwrap();
    let err = dispatcher
        .dispatch("ListIndexTool", json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "cluster_identifier_required");
}

#[tokio::test]
async fn backend_failures_surface_as_backend_errors() {
    struct Failing;

    #[async_trait]
    impl BackendExecutor for Failing {
        async fn execute(&self, call: BackendCall) -> search_backend::Result<BackendResponse> {
            if call.path == "/" {
                return Ok(BackendResponse::Json(json!({
                    "version": {"number": "2.11.0"}
                })));
            }
            Err(search_backend::Error::UnexpectedResponse(
                "connection reset by peer".to_string(),
            ))
        }
    }

    let single = BridgeConfig {
        connection: Some(ClusterConfig {
            opensearch_url: Some("http://localhost:9200".to_string()),
            opensearch_no_auth: true,
            ..ClusterConfig::default()
        }),
        ..BridgeConfig::default()
    };
    let factory = |_: &str, _: RequestAuth| -> search_backend::Result<Arc<dyn BackendExecutor>> {
        Ok(Arc::new(Failing))
    };
    let registry = Arc::new(
        ClusterRegistry::from_config_with(&single, &factory)
            .await
            .unwrap(),
    );
    let dispatcher = Dispatcher::new(registry, None, Duration::from_secs(30))
        .await
        .unwrap();

    let err = dispatcher
        .dispatch(
            "SearchIndexTool",
            json!({"index": "logs-app", "query": {"match_all": {}}}),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "backend_error");
    assert!(err.to_string().contains("connection reset by peer"));
}

#[tokio::test]
async fn value_extraction_is_checked_per_resource_field() {
    let spy = Spy::new("2.11.0");
    let registry = registry_with(&multi_cluster_config(), spy.clone()).await;
    let dispatcher = Dispatcher::new(registry, None, Duration::from_secs(30))
        .await
        .unwrap();

    // GetClusterStateTool carries the index as an optional filter; the
    // policy still applies to it.
    let err = dispatcher
        .dispatch(
            "GetClusterStateTool",
            json!({"index": "sensitive-audit", "opensearch_cluster": "prod"}),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AccessDenied(_)));
}
