//! MCP server over stdio
//!
//! Reads JSON-RPC 2.0 messages line by line from stdin and writes
//! responses to stdout; logs go to stderr. Each message runs on its own
//! task, so a slow backend call never holds up the requests behind it
//! and a panicking handler cannot take the server down. Every dispatch
//! failure is rendered as a tool result with `is_error` set rather than
//! a protocol-level error.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::protocol::{
    InitializeResult, JsonRpcRequest, JsonRpcResponse, ServerCapabilities, ServerInfo,
    ToolCallParams, ToolsCapability,
};
use crate::tools::ToolResult;

/// MCP server for the OpenSearch bridge
#[derive(Clone)]
pub struct BridgeServer {
    dispatcher: Arc<Dispatcher>,
}

impl BridgeServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Run the stdio message loop until stdin closes.
    ///
    /// Messages are handled concurrently; responses are written in
    /// completion order, which JSON-RPC permits since every response
    /// carries its request id.
    pub async fn run(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        tracing::info!(
            tools = self.dispatcher.visible_tools().len(),
            mode = ?self.dispatcher.cluster_mode(),
            "MCP server ready, listening on stdio"
        );

        // Single writer task keeps response lines whole.
        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(response) = rx.recv().await {
                stdout.write_all(response.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
            Ok::<(), std::io::Error>(())
        });

        while let Some(line) = lines.next_line().await? {
            if line.is_empty() {
                continue;
            }

            tracing::debug!(request = %line, "received message");

            let server = self.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                match server.handle_message(&line).await {
                    Ok(response) if !response.is_empty() => {
                        let _ = tx.send(response);
                    }
                    Ok(_) => {} // notification, no response
                    Err(e) => {
                        let error_response =
                            JsonRpcResponse::error(None, -32700, format!("Parse error: {e}"));
                        if let Ok(text) = serde_json::to_string(&error_response) {
                            let _ = tx.send(text);
                        }
                    }
                }
            });
        }

        // In-flight tasks hold sender clones; the writer drains until
        // the last of them finishes.
        drop(tx);
        writer
            .await
            .map_err(|e| Error::Aborted(e.to_string()))??;

        Ok(())
    }

    /// Handle one JSON-RPC message; empty string means no response.
    pub async fn handle_message(&self, message: &str) -> Result<String> {
        let request: JsonRpcRequest = serde_json::from_str(message)?;

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id)?,
            "initialized" | "notifications/initialized" => return Ok(String::new()),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await?,
            _ => JsonRpcResponse::error(
                request.id,
                -32601,
                format!("Method not found: {}", request.method),
            ),
        };

        serde_json::to_string(&response).map_err(Error::from)
    }

    fn handle_initialize(&self, id: Option<Value>) -> Result<JsonRpcResponse> {
        let result = InitializeResult {
            protocol_version: "2024-11-05".to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
            },
            server_info: ServerInfo {
                name: "opensearch-mcp-bridge".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };
        Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let tools: Vec<Value> = self
            .dispatcher
            .visible_tools()
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect();
        JsonRpcResponse::success(id, json!({ "tools": tools }))
    }

    async fn handle_tools_call(
        &self,
        id: Option<Value>,
        params: Value,
    ) -> Result<JsonRpcResponse> {
        let params: ToolCallParams = serde_json::from_value(params)?;
        let tool_name = params.name.clone();

        let dispatcher = self.dispatcher.clone();
        let outcome = tokio::spawn(async move {
            dispatcher.dispatch(&params.name, params.arguments).await
        })
        .await;

        let tool_result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::warn!(tool = %tool_name, kind = e.kind(), error = %e, "tool call failed");
                ToolResult::error(e.to_string())
            }
            Err(join_error) => {
                let e = Error::Aborted(join_error.to_string());
                tracing::error!(tool = %tool_name, error = %e, "tool task did not complete");
                ToolResult::error(e.to_string())
            }
        };

        Ok(JsonRpcResponse::success(
            id,
            serde_json::to_value(tool_result)?,
        ))
    }
}
