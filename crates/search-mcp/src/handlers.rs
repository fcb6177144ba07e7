//! Tool execution handlers
//!
//! One handler per catalogue entry. Handlers run after the dispatcher
//! has validated arguments, gated the version and checked index access;
//! they only compose backend helper calls and render the response text.

use std::sync::Arc;

use serde_json::{Value, json};

use search_backend::api;
use search_cluster::ClusterDescriptor;

use crate::error::Result;
use crate::tools::{
    CatNodesArgs, GetAllocationArgs, GetClusterStateArgs, GetIndexInfoArgs, GetIndexStatsArgs,
    GetLongRunningTasksArgs, GetNodesArgs, GetNodesHotThreadsArgs, GetQueryInsightsArgs,
    GetSegmentsArgs, GetShardsArgs, HandlerFuture, IndexMappingArgs, ListIndicesArgs,
    SearchIndexArgs, ToolResult, parse_args,
};

fn pretty(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn cell(row: &Value, column: &str) -> String {
    match row.get(column) {
        None | Some(Value::Null) => "N/A".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Render rows as a pipe-delimited table with a fixed column set.
fn pipe_table(rows: &Value, columns: &[&str]) -> String {
    let mut text = columns.join(" | ");
    text.push('\n');
    if let Some(rows) = rows.as_array() {
        for row in rows {
            let values: Vec<String> = columns.iter().map(|c| cell(row, c)).collect();
            text.push_str(&values.join(" | "));
            text.push('\n');
        }
    }
    text
}

/// Render rows as a pipe-delimited table, taking the columns from the
/// first row. Returns `None` when there are no rows.
fn pipe_table_from_rows(rows: &Value) -> Option<String> {
    let rows = rows.as_array()?;
    let first = rows.first()?.as_object()?;
    let columns: Vec<&str> = first.keys().map(String::as_str).collect();

    let mut text = columns.join(" | ");
    text.push('\n');
    for row in rows {
        let values: Vec<String> = columns.iter().map(|c| cell(row, c)).collect();
        text.push_str(&values.join(" | "));
        text.push('\n');
    }
    Some(text)
}

pub fn list_indices_tool(args: Value, cluster: Arc<ClusterDescriptor>) -> HandlerFuture {
    Box::pin(async move {
        let args: ListIndicesArgs = parse_args("ListIndexTool", &args)?;
        let executor = cluster.executor().as_ref();

        // A concrete index argument answers with full detail for it.
        if let Some(index) = &args.index {
            let info = api::get_index(executor, index).await?;
            return Ok(ToolResult::text(format!(
                "Index information for {index}:\n{}",
                pretty(&info)?
            )));
        }

        // With no index argument, forward the configured allow patterns
        // so the backend performs the filtering natively.
        let allowed: Vec<&str> = cluster.policy().allowed_patterns().sources().collect();
        let index_expr = (!allowed.is_empty()).then(|| allowed.join(","));
        let indices = api::list_indices(executor, index_expr.as_deref()).await?;

        if !args.include_detail {
            let names: Vec<&str> = indices
                .as_array()
                .map(|rows| {
                    rows.iter()
                        .filter_map(|row| row.get("index").and_then(Value::as_str))
                        .collect()
                })
                .unwrap_or_default();
            return Ok(ToolResult::text(format!(
                "Indices:\n{}",
                pretty(&json!(names))?
            )));
        }

        Ok(ToolResult::text(format!(
            "All indices information:\n{}",
            pretty(&indices)?
        )))
    })
}

pub fn get_index_mapping_tool(args: Value, cluster: Arc<ClusterDescriptor>) -> HandlerFuture {
    Box::pin(async move {
        let args: IndexMappingArgs = parse_args("IndexMappingTool", &args)?;
        let mapping = api::get_index_mapping(cluster.executor().as_ref(), &args.index).await?;
        Ok(ToolResult::text(format!(
            "Mapping for {}:\n{}",
            args.index,
            pretty(&mapping)?
        )))
    })
}

pub fn search_index_tool(args: Value, cluster: Arc<ClusterDescriptor>) -> HandlerFuture {
    Box::pin(async move {
        let args: SearchIndexArgs = parse_args("SearchIndexTool", &args)?;
        let result =
            api::search_index(cluster.executor().as_ref(), &args.index, args.query).await?;
        Ok(ToolResult::text(format!(
            "Search results from {}:\n{}",
            args.index,
            pretty(&result)?
        )))
    })
}

pub fn get_shards_tool(args: Value, cluster: Arc<ClusterDescriptor>) -> HandlerFuture {
    Box::pin(async move {
        let args: GetShardsArgs = parse_args("GetShardsTool", &args)?;
        let result = api::get_shards(cluster.executor().as_ref(), args.index.as_deref()).await?;
        let table = pipe_table(
            &result,
            &["index", "shard", "prirep", "state", "docs", "store", "ip", "node"],
        );
        Ok(ToolResult::text(table))
    })
}

pub fn get_cluster_state_tool(args: Value, cluster: Arc<ClusterDescriptor>) -> HandlerFuture {
    Box::pin(async move {
        let args: GetClusterStateArgs = parse_args("GetClusterStateTool", &args)?;
        let result = api::get_cluster_state(
            cluster.executor().as_ref(),
            args.metric.as_deref(),
            args.index.as_deref(),
        )
        .await?;

        let mut message = String::from("Cluster state information");
        if let Some(metric) = &args.metric {
            message.push_str(&format!(" for metric: {metric}"));
        }
        if let Some(index) = &args.index {
            message.push_str(&format!(", filtered by index: {index}"));
        }
        Ok(ToolResult::text(format!("{message}:\n{}", pretty(&result)?)))
    })
}

pub fn get_segments_tool(args: Value, cluster: Arc<ClusterDescriptor>) -> HandlerFuture {
    Box::pin(async move {
        let args: GetSegmentsArgs = parse_args("GetSegmentsTool", &args)?;
        let result = api::get_segments(cluster.executor().as_ref(), args.index.as_deref()).await?;
        let table = pipe_table(
            &result,
            &[
                "index",
                "shard",
                "prirep",
                "segment",
                "generation",
                "docs.count",
                "docs.deleted",
                "size",
                "memory.bookkeeping",
                "memory.vectors",
                "memory.docvalues",
                "memory.terms",
                "version",
            ],
        );

        let message = match &args.index {
            Some(index) => format!("Segment information for index: {index}"),
            None => "Segment information for all indices".to_string(),
        };
        Ok(ToolResult::text(format!("{message}:\n{table}")))
    })
}

pub fn cat_nodes_tool(args: Value, cluster: Arc<ClusterDescriptor>) -> HandlerFuture {
    Box::pin(async move {
        let args: CatNodesArgs = parse_args("CatNodesTool", &args)?;
        let result = api::get_cat_nodes(cluster.executor().as_ref(), args.metrics.as_deref()).await?;

        let Some(table) = pipe_table_from_rows(&result) else {
            return Ok(ToolResult::text("No nodes found in the cluster."));
        };

        let mut message = String::from("Node information for the cluster");
        if let Some(metrics) = &args.metrics {
            message.push_str(&format!(" (metrics: {metrics})"));
        }
        Ok(ToolResult::text(format!("{message}:\n{table}")))
    })
}

pub fn get_index_info_tool(args: Value, cluster: Arc<ClusterDescriptor>) -> HandlerFuture {
    Box::pin(async move {
        let args: GetIndexInfoArgs = parse_args("GetIndexInfoTool", &args)?;
        let result = api::get_index(cluster.executor().as_ref(), &args.index).await?;
        Ok(ToolResult::text(format!(
            "Detailed information for index: {}:\n{}",
            args.index,
            pretty(&result)?
        )))
    })
}

pub fn get_index_stats_tool(args: Value, cluster: Arc<ClusterDescriptor>) -> HandlerFuture {
    Box::pin(async move {
        let args: GetIndexStatsArgs = parse_args("GetIndexStatsTool", &args)?;
        let result = api::get_index_stats(
            cluster.executor().as_ref(),
            &args.index,
            args.metric.as_deref(),
        )
        .await?;

        let mut message = format!("Statistics for index: {}", args.index);
        if let Some(metric) = &args.metric {
            message.push_str(&format!(" (metrics: {metric})"));
        }
        Ok(ToolResult::text(format!("{message}:\n{}", pretty(&result)?)))
    })
}

pub fn get_query_insights_tool(args: Value, cluster: Arc<ClusterDescriptor>) -> HandlerFuture {
    Box::pin(async move {
        let _args: GetQueryInsightsArgs = parse_args("GetQueryInsightsTool", &args)?;
        let result = api::get_query_insights(cluster.executor().as_ref()).await?;
        Ok(ToolResult::text(format!(
            "Query insights from /_insights/top_queries endpoint:\n{}",
            pretty(&result)?
        )))
    })
}

pub fn get_nodes_hot_threads_tool(args: Value, cluster: Arc<ClusterDescriptor>) -> HandlerFuture {
    Box::pin(async move {
        let _args: GetNodesHotThreadsArgs = parse_args("GetNodesHotThreadsTool", &args)?;
        // Answers plain text, no JSON formatting needed
        let result = api::get_nodes_hot_threads(cluster.executor().as_ref()).await?;
        Ok(ToolResult::text(format!(
            "Hot threads information from /_nodes/hot_threads endpoint:\n{result}"
        )))
    })
}

pub fn get_allocation_tool(args: Value, cluster: Arc<ClusterDescriptor>) -> HandlerFuture {
    Box::pin(async move {
        let _args: GetAllocationArgs = parse_args("GetAllocationTool", &args)?;
        let result = api::get_allocation(cluster.executor().as_ref()).await?;

        let Some(table) = pipe_table_from_rows(&result) else {
            return Ok(ToolResult::text(
                "No allocation information found in the cluster.",
            ));
        };
        Ok(ToolResult::text(format!(
            "Allocation information from /_cat/allocation endpoint:\n{table}"
        )))
    })
}

pub fn get_long_running_tasks_tool(args: Value, cluster: Arc<ClusterDescriptor>) -> HandlerFuture {
    Box::pin(async move {
        let args: GetLongRunningTasksArgs = parse_args("GetLongRunningTasksTool", &args)?;
        let result =
            api::get_long_running_tasks(cluster.executor().as_ref(), Some(args.limit)).await?;

        let count = result.as_array().map(Vec::len).unwrap_or(0);
        let Some(table) = pipe_table_from_rows(&result) else {
            return Ok(ToolResult::text("No tasks found in the cluster."));
        };
        Ok(ToolResult::text(format!(
            "Top {count} long-running tasks sorted by running time:\n{table}"
        )))
    })
}

pub fn get_nodes_tool(args: Value, cluster: Arc<ClusterDescriptor>) -> HandlerFuture {
    Box::pin(async move {
        let args: GetNodesArgs = parse_args("GetNodesTool", &args)?;
        let result = api::get_nodes_info(
            cluster.executor().as_ref(),
            args.node_id.as_deref(),
            args.metric.as_deref(),
        )
        .await?;

        let mut message = String::from("Detailed node information");
        match &args.node_id {
            Some(node_id) => message.push_str(&format!(" for nodes: {node_id}")),
            None => message.push_str(" for all nodes"),
        }
        if let Some(metric) = &args.metric {
            message.push_str(&format!(" (metrics: {metric})"));
        }
        Ok(ToolResult::text(format!("{message}:\n{}", pretty(&result)?)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fixed_table_fills_missing_columns() {
        let rows = json!([
            {"index": "logs", "shard": 0, "prirep": "p", "state": "STARTED"},
        ]);
        let table = pipe_table(&rows, &["index", "shard", "prirep", "state", "docs"]);
        let mut lines = table.lines();
        assert_eq!(lines.next().unwrap(), "index | shard | prirep | state | docs");
        assert_eq!(lines.next().unwrap(), "logs | 0 | p | STARTED | N/A");
    }

    #[test]
    fn dynamic_table_takes_columns_from_first_row() {
        let rows = json!([
            {"ip": "10.0.0.1", "name": "node-1"},
            {"ip": "10.0.0.2", "name": "node-2"},
        ]);
        let table = pipe_table_from_rows(&rows).unwrap();
        assert!(table.starts_with("ip | name\n"));
        assert!(table.contains("10.0.0.1 | node-1"));
        assert!(table.contains("10.0.0.2 | node-2"));
    }

    #[test]
    fn dynamic_table_is_none_for_empty_rows() {
        assert!(pipe_table_from_rows(&json!([])).is_none());
        assert!(pipe_table_from_rows(&json!({"error": "oops"})).is_none());
    }

    #[test]
    fn string_cells_render_unquoted() {
        let rows = json!([{"store": "12mb", "docs": 42}]);
        let table = pipe_table(&rows, &["store", "docs"]);
        assert!(table.contains("12mb | 42"));
        assert!(!table.contains("\"12mb\""));
    }
}
