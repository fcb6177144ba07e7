//! REST helpers, one per backend operation
//!
//! Each helper performs a single call through a [`BackendExecutor`].
//! Tool handlers compose these into user-facing behavior; nothing here
//! interprets the payloads beyond decoding.

use semver::Version;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::executor::{BackendCall, BackendExecutor};

/// `GET /_cat/indices[/{index}]?format=json`
pub async fn list_indices(executor: &dyn BackendExecutor, index: Option<&str>) -> Result<Value> {
    let path = match index {
        Some(index) => format!("/_cat/indices/{index}"),
        None => "/_cat/indices".to_string(),
    };
    executor
        .execute(BackendCall::get(path).with_query("format", "json"))
        .await?
        .into_json()
}

/// `GET /{index}` - settings, mappings and aliases for an index
pub async fn get_index(executor: &dyn BackendExecutor, index: &str) -> Result<Value> {
    executor
        .execute(BackendCall::get(format!("/{index}")))
        .await?
        .into_json()
}

/// `GET /{index}/_mapping`
pub async fn get_index_mapping(executor: &dyn BackendExecutor, index: &str) -> Result<Value> {
    executor
        .execute(BackendCall::get(format!("/{index}/_mapping")))
        .await?
        .into_json()
}

/// `POST /{index}/_search` with a query DSL body
pub async fn search_index(
    executor: &dyn BackendExecutor,
    index: &str,
    query: Value,
) -> Result<Value> {
    executor
        .execute(BackendCall::post(format!("/{index}/_search")).with_body(query))
        .await?
        .into_json()
}

/// `GET /_cat/shards[/{index}]?format=json`
pub async fn get_shards(executor: &dyn BackendExecutor, index: Option<&str>) -> Result<Value> {
    let path = match index {
        Some(index) => format!("/_cat/shards/{index}"),
        None => "/_cat/shards".to_string(),
    };
    executor
        .execute(BackendCall::get(path).with_query("format", "json"))
        .await?
        .into_json()
}

/// `GET /_cat/segments[/{index}]?format=json`
pub async fn get_segments(executor: &dyn BackendExecutor, index: Option<&str>) -> Result<Value> {
    let path = match index {
        Some(index) => format!("/_cat/segments/{index}"),
        None => "/_cat/segments".to_string(),
    };
    executor
        .execute(BackendCall::get(path).with_query("format", "json"))
        .await?
        .into_json()
}

/// `GET /_cluster/state[/{metric}[/{index}]]`
///
/// The index filter requires a metric path segment; `_all` stands in
/// when only an index filter was requested.
pub async fn get_cluster_state(
    executor: &dyn BackendExecutor,
    metric: Option<&str>,
    index: Option<&str>,
) -> Result<Value> {
    let path = match (metric, index) {
        (Some(metric), Some(index)) => format!("/_cluster/state/{metric}/{index}"),
        (Some(metric), None) => format!("/_cluster/state/{metric}"),
        (None, Some(index)) => format!("/_cluster/state/_all/{index}"),
        (None, None) => "/_cluster/state".to_string(),
    };
    executor.execute(BackendCall::get(path)).await?.into_json()
}

/// `GET /_cat/nodes?format=json[&h={metrics}]`
pub async fn get_cat_nodes(executor: &dyn BackendExecutor, metrics: Option<&str>) -> Result<Value> {
    let mut call = BackendCall::get("/_cat/nodes").with_query("format", "json");
    if let Some(metrics) = metrics {
        call = call.with_query("h", metrics);
    }
    executor.execute(call).await?.into_json()
}

/// `GET /{index}/_stats[/{metric}]`
pub async fn get_index_stats(
    executor: &dyn BackendExecutor,
    index: &str,
    metric: Option<&str>,
) -> Result<Value> {
    let path = match metric {
        Some(metric) => format!("/{index}/_stats/{metric}"),
        None => format!("/{index}/_stats"),
    };
    executor.execute(BackendCall::get(path)).await?.into_json()
}

/// `GET /_insights/top_queries`
pub async fn get_query_insights(executor: &dyn BackendExecutor) -> Result<Value> {
    executor
        .execute(BackendCall::get("/_insights/top_queries"))
        .await?
        .into_json()
}

/// `GET /_nodes/hot_threads` - answers plain text, not JSON
pub async fn get_nodes_hot_threads(executor: &dyn BackendExecutor) -> Result<String> {
    Ok(executor
        .execute(BackendCall::get("/_nodes/hot_threads"))
        .await?
        .into_text())
}

/// `GET /_cat/allocation?format=json`
pub async fn get_allocation(executor: &dyn BackendExecutor) -> Result<Value> {
    executor
        .execute(BackendCall::get("/_cat/allocation").with_query("format", "json"))
        .await?
        .into_json()
}

/// `GET /_cat/tasks?s=running_time:desc&format=json`, truncated to
/// `limit` entries client-side
pub async fn get_long_running_tasks(
    executor: &dyn BackendExecutor,
    limit: Option<usize>,
) -> Result<Value> {
    let value = executor
        .execute(
            BackendCall::get("/_cat/tasks")
                .with_query("s", "running_time:desc")
                .with_query("format", "json"),
        )
        .await?
        .into_json()?;

    match (limit, value) {
        (Some(limit), Value::Array(mut tasks)) => {
            tasks.truncate(limit);
            Ok(Value::Array(tasks))
        }
        (_, value) => Ok(value),
    }
}

/// `GET /_nodes[/{node_id}][/{metric}]`
pub async fn get_nodes_info(
    executor: &dyn BackendExecutor,
    node_id: Option<&str>,
    metric: Option<&str>,
) -> Result<Value> {
    let mut path = String::from("/_nodes");
    if let Some(node_id) = node_id {
        path.push('/');
        path.push_str(node_id);
    }
    if let Some(metric) = metric {
        path.push('/');
        path.push_str(metric);
    }
    executor.execute(BackendCall::get(path)).await?.into_json()
}

/// `GET /` - root info call; extracts and parses `version.number`
pub async fn get_version(executor: &dyn BackendExecutor) -> Result<Version> {
    let info = executor.execute(BackendCall::get("/")).await?.into_json()?;
    let number = info
        .pointer("/version/number")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::UnexpectedResponse("root info response missing version.number".to_string())
        })?;
    parse_version(number)
}

/// Parse a backend version, tolerating two-component forms like "7.10".
pub fn parse_version(text: &str) -> Result<Version> {
    Version::parse(text)
        .or_else(|_| Version::parse(&format!("{text}.0")))
        .map_err(|_| Error::InvalidVersion(text.to_string()))
}
