//! The tool catalogue
//!
//! A static registry built once at process start and read-only for the
//! process lifetime. Each descriptor carries the tool's input schema,
//! its typed argument model, version bounds, category tags, HTTP
//! methods and the argument fields that name backend indices (checked
//! against the index security policy before execution).
//!
//! # Tools
//!
//! ## Indices
//! - `ListIndexTool` - list indices, optionally with full cat metadata
//! - `IndexMappingTool` - mapping and settings for one index
//! - `GetIndexInfoTool` - mappings, settings and aliases
//! - `GetIndexStatsTool` - index statistics
//! - `GetShardsTool` - shard placement
//! - `GetSegmentsTool` - Lucene segment details
//!
//! ## Search
//! - `SearchIndexTool` - query DSL search against one index
//!
//! ## Cluster
//! - `GetClusterStateTool`, `CatNodesTool`, `GetNodesTool`,
//!   `GetNodesHotThreadsTool`, `GetAllocationTool`,
//!   `GetLongRunningTasksTool`
//!
//! ## Insights
//! - `GetQueryInsightsTool` - requires OpenSearch 2.12.0 or later

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use search_backend::Method;
use search_cluster::ClusterDescriptor;

use crate::error::{Error, Result};
use crate::handlers;

/// Result from a tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

/// Content types for tool results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolResult {
    /// Create a successful text result
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: content.into() }],
            is_error: None,
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: message.into() }],
            is_error: Some(true),
        }
    }
}

/// Boxed future returned by tool handlers
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<ToolResult>> + Send>>;

/// A tool's execution entry point, bound to a resolved cluster
pub type Handler = fn(Value, Arc<ClusterDescriptor>) -> HandlerFuture;

/// Schema validation entry point; parses and discards the typed model
pub type Validator = fn(&'static str, &Value) -> Result<()>;

/// One entry of the tool catalogue
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    /// Category tags targeted by filter rules
    pub categories: &'static [&'static str],
    /// HTTP methods the tool issues against the backend
    pub http_methods: &'static [Method],
    pub min_version: Option<Version>,
    pub max_version: Option<Version>,
    /// Argument fields holding index names, checked against the policy
    pub resource_fields: &'static [&'static str],
    pub input_schema: Value,
    pub validate: Validator,
    pub handler: Handler,
}

impl ToolDescriptor {
    /// True when every HTTP method the tool issues is non-mutating.
    pub fn is_read_only(&self) -> bool {
        self.http_methods
            .iter()
            .all(|m| matches!(m, Method::Get | Method::Head))
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("categories", &self.categories)
            .field("min_version", &self.min_version)
            .field("max_version", &self.max_version)
            .finish_non_exhaustive()
    }
}

/// The static tool catalogue
///
/// Populated once at process start, read for the process lifetime.
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&ToolDescriptor) -> bool) {
        self.tools.retain(keep);
    }
}

/// Parse raw arguments into a tool's typed model.
///
/// A null/absent argument object is treated as empty, matching clients
/// that omit `arguments` entirely for parameterless tools.
pub(crate) fn parse_args<T: serde::de::DeserializeOwned>(tool: &str, value: &Value) -> Result<T> {
    let value = match value {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(value).map_err(|e| Error::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

fn validate_as<T: serde::de::DeserializeOwned>(tool: &'static str, value: &Value) -> Result<()> {
    parse_args::<T>(tool, value).map(|_: T| ())
}

// Typed argument models. Every tool additionally accepts the optional
// `opensearch_cluster` routing field.

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListIndicesArgs {
    #[serde(default)]
    pub index: Option<String>,
    #[serde(default)]
    pub include_detail: bool,
    #[serde(default)]
    pub opensearch_cluster: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexMappingArgs {
    pub index: String,
    #[serde(default)]
    pub opensearch_cluster: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchIndexArgs {
    pub index: String,
    pub query: Value,
    #[serde(default)]
    pub opensearch_cluster: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetShardsArgs {
    #[serde(default)]
    pub index: Option<String>,
    #[serde(default)]
    pub opensearch_cluster: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetClusterStateArgs {
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub index: Option<String>,
    #[serde(default)]
    pub opensearch_cluster: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetSegmentsArgs {
    #[serde(default)]
    pub index: Option<String>,
    #[serde(default)]
    pub opensearch_cluster: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatNodesArgs {
    #[serde(default)]
    pub metrics: Option<String>,
    #[serde(default)]
    pub opensearch_cluster: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetIndexInfoArgs {
    pub index: String,
    #[serde(default)]
    pub opensearch_cluster: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetIndexStatsArgs {
    pub index: String,
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub opensearch_cluster: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetQueryInsightsArgs {
    #[serde(default)]
    pub opensearch_cluster: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetNodesHotThreadsArgs {
    #[serde(default)]
    pub opensearch_cluster: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetAllocationArgs {
    #[serde(default)]
    pub opensearch_cluster: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetLongRunningTasksArgs {
    #[serde(default = "default_task_limit")]
    pub limit: usize,
    #[serde(default)]
    pub opensearch_cluster: Option<String>,
}

fn default_task_limit() -> usize {
    10
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetNodesArgs {
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub opensearch_cluster: Option<String>,
}

fn cluster_property() -> Value {
    json!({
        "type": "string",
        "description": "The name of the OpenSearch cluster to run against (multi-cluster mode only)"
    })
}

impl ToolRegistry {
    /// Build the full catalogue.
    pub fn all() -> Self {
        let v1 = Version::new(1, 0, 0);
        let tools = vec![
            ToolDescriptor {
                name: "ListIndexTool",
                description: "Lists indices in the OpenSearch cluster. By default, returns a \
                              filtered list of index names only to minimize response size. Set \
                              include_detail=true to return full metadata from cat.indices \
                              (docs.count, store.size, etc.). If an index parameter is provided, \
                              returns detailed information for that specific index including \
                              mappings and settings.",
                categories: &["indices"],
                http_methods: &[Method::Get],
                min_version: Some(v1.clone()),
                max_version: None,
                resource_fields: &["index"],
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "index": {
                            "type": "string",
                            "description": "Optional index name to return detail for"
                        },
                        "include_detail": {
                            "type": "boolean",
                            "description": "Return full cat.indices metadata instead of names only"
                        },
                        "opensearch_cluster": cluster_property()
                    }
                }),
                validate: validate_as::<ListIndicesArgs>,
                handler: handlers::list_indices_tool,
            },
            ToolDescriptor {
                name: "IndexMappingTool",
                description: "Retrieves index mapping and setting information for an index in \
                              OpenSearch",
                categories: &["indices"],
                http_methods: &[Method::Get],
                min_version: None,
                max_version: None,
                resource_fields: &["index"],
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "index": {
                            "type": "string",
                            "description": "Name of the index to retrieve mappings for"
                        },
                        "opensearch_cluster": cluster_property()
                    },
                    "required": ["index"]
                }),
                validate: validate_as::<IndexMappingArgs>,
                handler: handlers::get_index_mapping_tool,
            },
            ToolDescriptor {
                name: "SearchIndexTool",
                description: "Searches an index using a query written in query domain-specific \
                              language (DSL) in OpenSearch",
                categories: &["search"],
                http_methods: &[Method::Get, Method::Post],
                min_version: None,
                max_version: None,
                resource_fields: &["index"],
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "index": {
                            "type": "string",
                            "description": "Name of the index to search"
                        },
                        "query": {
                            "type": "object",
                            "description": "Query DSL body"
                        },
                        "opensearch_cluster": cluster_property()
                    },
                    "required": ["index", "query"]
                }),
                validate: validate_as::<SearchIndexArgs>,
                handler: handlers::search_index_tool,
            },
            ToolDescriptor {
                name: "GetShardsTool",
                description: "Gets information about shards in OpenSearch",
                categories: &["indices"],
                http_methods: &[Method::Get],
                min_version: None,
                max_version: None,
                resource_fields: &["index"],
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "index": {
                            "type": "string",
                            "description": "Optional index name to restrict the listing to"
                        },
                        "opensearch_cluster": cluster_property()
                    }
                }),
                validate: validate_as::<GetShardsArgs>,
                handler: handlers::get_shards_tool,
            },
            ToolDescriptor {
                name: "GetClusterStateTool",
                description: "Gets the current state of the cluster including node information, \
                              index settings, and more. Can be filtered by specific metrics and \
                              indices.",
                categories: &["cluster"],
                http_methods: &[Method::Get],
                min_version: Some(v1.clone()),
                max_version: None,
                resource_fields: &["index"],
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "metric": {
                            "type": "string",
                            "description": "Cluster state metric to restrict the response to"
                        },
                        "index": {
                            "type": "string",
                            "description": "Optional index name to filter the state by"
                        },
                        "opensearch_cluster": cluster_property()
                    }
                }),
                validate: validate_as::<GetClusterStateArgs>,
                handler: handlers::get_cluster_state_tool,
            },
            ToolDescriptor {
                name: "GetSegmentsTool",
                description: "Gets information about Lucene segments in indices, including memory \
                              usage, document counts, and segment sizes. Can be filtered by \
                              specific indices.",
                categories: &["indices"],
                http_methods: &[Method::Get],
                min_version: Some(v1.clone()),
                max_version: None,
                resource_fields: &["index"],
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "index": {
                            "type": "string",
                            "description": "Optional index name to restrict the listing to"
                        },
                        "opensearch_cluster": cluster_property()
                    }
                }),
                validate: validate_as::<GetSegmentsArgs>,
                handler: handlers::get_segments_tool,
            },
            ToolDescriptor {
                name: "CatNodesTool",
                description: "Lists node-level information, including node roles and load \
                              metrics. Gets information about nodes metrics in the OpenSearch \
                              cluster, including system metrics pid, name, cluster_manager, ip, \
                              port, version, build, jdk, along with disk, heap, ram, and \
                              file_desc. Can be filtered to specific metrics.",
                categories: &["cluster"],
                http_methods: &[Method::Get],
                min_version: Some(v1.clone()),
                max_version: None,
                resource_fields: &[],
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "metrics": {
                            "type": "string",
                            "description": "Comma-separated list of cat.nodes columns to return"
                        },
                        "opensearch_cluster": cluster_property()
                    }
                }),
                validate: validate_as::<CatNodesArgs>,
                handler: handlers::cat_nodes_tool,
            },
            ToolDescriptor {
                name: "GetIndexInfoTool",
                description: "Gets detailed information about an index including mappings, \
                              settings, and aliases. Supports wildcards in index names.",
                categories: &["indices"],
                http_methods: &[Method::Get],
                min_version: Some(v1.clone()),
                max_version: None,
                resource_fields: &["index"],
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "index": {
                            "type": "string",
                            "description": "Name of the index (wildcards supported)"
                        },
                        "opensearch_cluster": cluster_property()
                    },
                    "required": ["index"]
                }),
                validate: validate_as::<GetIndexInfoArgs>,
                handler: handlers::get_index_info_tool,
            },
            ToolDescriptor {
                name: "GetIndexStatsTool",
                description: "Gets statistics about an index including document count, store \
                              size, indexing and search performance metrics. Can be filtered to \
                              specific metrics.",
                categories: &["indices"],
                http_methods: &[Method::Get],
                min_version: Some(v1.clone()),
                max_version: None,
                resource_fields: &["index"],
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "index": {
                            "type": "string",
                            "description": "Name of the index"
                        },
                        "metric": {
                            "type": "string",
                            "description": "Comma-separated list of stats metrics to return"
                        },
                        "opensearch_cluster": cluster_property()
                    },
                    "required": ["index"]
                }),
                validate: validate_as::<GetIndexStatsArgs>,
                handler: handlers::get_index_stats_tool,
            },
            ToolDescriptor {
                name: "GetQueryInsightsTool",
                description: "Gets query insights from the /_insights/top_queries endpoint, \
                              showing information about query patterns and performance.",
                categories: &["insights"],
                http_methods: &[Method::Get],
                // Query insights feature requires OpenSearch 2.12+
                min_version: Some(Version::new(2, 12, 0)),
                max_version: None,
                resource_fields: &[],
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "opensearch_cluster": cluster_property()
                    }
                }),
                validate: validate_as::<GetQueryInsightsArgs>,
                handler: handlers::get_query_insights_tool,
            },
            ToolDescriptor {
                name: "GetNodesHotThreadsTool",
                description: "Gets information about hot threads in the cluster nodes from the \
                              /_nodes/hot_threads endpoint.",
                categories: &["cluster"],
                http_methods: &[Method::Get],
                min_version: Some(v1.clone()),
                max_version: None,
                resource_fields: &[],
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "opensearch_cluster": cluster_property()
                    }
                }),
                validate: validate_as::<GetNodesHotThreadsArgs>,
                handler: handlers::get_nodes_hot_threads_tool,
            },
            ToolDescriptor {
                name: "GetAllocationTool",
                description: "Gets information about shard allocation across nodes in the \
                              cluster from the /_cat/allocation endpoint.",
                categories: &["cluster"],
                http_methods: &[Method::Get],
                min_version: Some(v1.clone()),
                max_version: None,
                resource_fields: &[],
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "opensearch_cluster": cluster_property()
                    }
                }),
                validate: validate_as::<GetAllocationArgs>,
                handler: handlers::get_allocation_tool,
            },
            ToolDescriptor {
                name: "GetLongRunningTasksTool",
                description: "Gets information about long-running tasks in the cluster, sorted \
                              by running time in descending order.",
                categories: &["cluster"],
                http_methods: &[Method::Get],
                min_version: Some(v1.clone()),
                max_version: None,
                resource_fields: &[],
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "limit": {
                            "type": "integer",
                            "description": "Maximum number of tasks to return (default 10)"
                        },
                        "opensearch_cluster": cluster_property()
                    }
                }),
                validate: validate_as::<GetLongRunningTasksArgs>,
                handler: handlers::get_long_running_tasks_tool,
            },
            ToolDescriptor {
                name: "GetNodesTool",
                description: "Gets detailed information about nodes in the OpenSearch cluster, \
                              including static information like host system details, JVM info, \
                              processor type, node settings, thread pools, installed plugins, \
                              and more. Can be filtered by specific nodes and metrics.",
                categories: &["cluster"],
                http_methods: &[Method::Get],
                min_version: Some(v1),
                max_version: None,
                resource_fields: &[],
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "node_id": {
                            "type": "string",
                            "description": "Comma-separated list of node identifiers"
                        },
                        "metric": {
                            "type": "string",
                            "description": "Comma-separated list of node info sections to return"
                        },
                        "opensearch_cluster": cluster_property()
                    }
                }),
                validate: validate_as::<GetNodesArgs>,
                handler: handlers::get_nodes_tool,
            },
        ];
        Self { tools }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_has_every_tool() {
        let registry = ToolRegistry::all();
        assert_eq!(registry.len(), 14);

        let names = registry.names();
        assert!(names.contains(&"ListIndexTool"));
        assert!(names.contains(&"SearchIndexTool"));
        assert!(names.contains(&"GetQueryInsightsTool"));
        assert!(names.contains(&"GetNodesTool"));
    }

    #[test]
    fn names_are_unique() {
        let registry = ToolRegistry::all();
        let mut names = registry.names();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), registry.len());
    }

    #[test]
    fn query_insights_requires_2_12() {
        let registry = ToolRegistry::all();
        let tool = registry.get("GetQueryInsightsTool").unwrap();
        assert_eq!(tool.min_version, Some(Version::new(2, 12, 0)));
    }

    #[test]
    fn search_index_is_not_read_only() {
        let registry = ToolRegistry::all();
        assert!(!registry.get("SearchIndexTool").unwrap().is_read_only());
        assert!(registry.get("ListIndexTool").unwrap().is_read_only());
    }

    #[test]
    fn schemas_accept_the_cluster_routing_field() {
        let registry = ToolRegistry::all();
        for tool in registry.iter() {
            let properties = tool.input_schema.get("properties").unwrap();
            assert!(
                properties.get("opensearch_cluster").is_some(),
                "{} schema lacks opensearch_cluster",
                tool.name
            );
        }
    }

    #[test]
    fn validation_rejects_missing_required_fields() {
        let registry = ToolRegistry::all();
        let tool = registry.get("SearchIndexTool").unwrap();

        let err = (tool.validate)(tool.name, &json!({"index": "logs"})).unwrap_err();
        assert!(matches!(err, Error::InvalidArguments { .. }));
        assert!(err.to_string().contains("SearchIndexTool"));

        let ok = (tool.validate)(
            tool.name,
            &json!({"index": "logs", "query": {"match_all": {}}}),
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn validation_rejects_unknown_fields() {
        let registry = ToolRegistry::all();
        let tool = registry.get("ListIndexTool").unwrap();
        let err = (tool.validate)(tool.name, &json!({"indx": "typo"})).unwrap_err();
        assert!(matches!(err, Error::InvalidArguments { .. }));
    }

    #[test]
    fn null_arguments_parse_as_empty() {
        let args: GetAllocationArgs = parse_args("GetAllocationTool", &Value::Null).unwrap();
        assert!(args.opensearch_cluster.is_none());

        let args: GetLongRunningTasksArgs =
            parse_args("GetLongRunningTasksTool", &Value::Null).unwrap();
        assert_eq!(args.limit, 10);
    }
}
