//! End-to-end JSON-RPC session tests
//!
//! Drives the stdio server's message handler through the sequences an
//! MCP client performs: initialize, tools/list, tools/call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use search_backend::{BackendCall, BackendExecutor, BackendResponse, RequestAuth};
use search_cluster::{BridgeConfig, ClusterConfig, ClusterRegistry, ToolFilterConfig};
use search_mcp::{BridgeServer, Dispatcher};

struct Stub {
    version: &'static str,
}

#[async_trait]
impl BackendExecutor for Stub {
    async fn execute(&self, call: BackendCall) -> search_backend::Result<BackendResponse> {
        if call.path == "/" {
            return Ok(BackendResponse::Json(json!({
                "version": {"number": self.version}
            })));
        }
        if call.path.ends_with("/_search") {
            return Ok(BackendResponse::Json(json!({
                "hits": {"total": {"value": 1}, "hits": [{"_id": "1"}]}
            })));
        }
        Ok(BackendResponse::Json(json!([
            {"index": "logs-app", "docs.count": "1200"}
        ])))
    }
}

async fn server_with(
    version: &'static str,
    tool_filter: Option<ToolFilterConfig>,
) -> BridgeServer {
    let config = BridgeConfig {
        connection: Some(ClusterConfig {
            opensearch_url: Some("http://localhost:9200".to_string()),
            opensearch_no_auth: true,
            ..ClusterConfig::default()
        }),
        tool_filter,
        ..BridgeConfig::default()
    };
    let factory = move |_: &str,
                        _: RequestAuth|
          -> search_backend::Result<Arc<dyn BackendExecutor>> {
        Ok(Arc::new(Stub { version }))
    };
    let registry = Arc::new(
        ClusterRegistry::from_config_with(&config, &factory)
            .await
            .unwrap(),
    );
    let dispatcher = Dispatcher::new(
        registry,
        config.tool_filter.as_ref(),
        Duration::from_secs(30),
    )
    .await
    .unwrap();
    BridgeServer::new(dispatcher)
}

async fn send(server: &BridgeServer, message: &str) -> Value {
    let response = server.handle_message(message).await.unwrap();
    serde_json::from_str(&response).unwrap()
}

#[tokio::test]
async fn full_session_handshake_and_search() {
    // 2.12.0 satisfies every catalogue bound, so the startup prune
    // leaves the full tool set visible.
    let server = server_with("2.12.0", None).await;

    let init = send(
        &server,
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"client","version":"1.0"}}}"#,
    )
    .await;
    assert_eq!(init["result"]["serverInfo"]["name"], "opensearch-mcp-bridge");

    let notified = server
        .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await
        .unwrap();
    assert!(notified.is_empty());

    let list = send(
        &server,
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list","params":{}}"#,
    )
    .await;
    let tools = list["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 14);

    let call = send(
        &server,
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"SearchIndexTool","arguments":{"index":"logs-app","query":{"match_all":{}}}}}"#,
    )
    .await;
    let text = call["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Search results from logs-app:"));
    assert!(text.contains("hits"));
}

#[tokio::test]
async fn tool_filter_restricts_the_listed_tools() {
    let filter = ToolFilterConfig {
        tool_names: vec!["ListIndexTool".to_string(), "SearchIndexTool".to_string()],
        allow_writes: false,
        ..ToolFilterConfig::default()
    };
    let server = server_with("2.11.0", Some(filter)).await;

    let list = send(
        &server,
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/list","params":{}}"#,
    )
    .await;
    let tools = list["result"]["tools"].as_array().unwrap();

    // SearchIndexTool issues POST and falls to the write toggle.
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "ListIndexTool");

    // Calling a hidden tool fails like an unknown one.
    let call = send(
        &server,
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"SearchIndexTool","arguments":{"index":"logs","query":{}}}}"#,
    )
    .await;
    assert_eq!(call["result"]["is_error"], true);
    assert!(call["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("unknown tool"));
}

#[tokio::test]
async fn startup_version_prune_hides_insights_on_old_backends() {
    let server = server_with("2.9.0", None).await;

    let list = send(
        &server,
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/list","params":{}}"#,
    )
    .await;
    let names: Vec<&str> = list["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();

    assert!(!names.contains(&"GetQueryInsightsTool"));
    assert!(names.contains(&"ListIndexTool"));
}

#[tokio::test]
async fn invalid_arguments_come_back_as_error_results() {
    let server = server_with("2.11.0", None).await;

    let call = send(
        &server,
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"SearchIndexTool","arguments":{"index":"logs"}}}"#,
    )
    .await;
    assert_eq!(call["result"]["is_error"], true);
    let text = call["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("invalid arguments for SearchIndexTool"));
}

#[tokio::test]
async fn unknown_methods_are_protocol_errors() {
    let server = server_with("2.11.0", None).await;

    let response = send(
        &server,
        r#"{"jsonrpc":"2.0","id":1,"method":"resources/list","params":{}}"#,
    )
    .await;
    assert_eq!(response["error"]["code"], -32601);
}
