//! OpenSearch MCP bridge
//!
//! A Model Context Protocol server exposing OpenSearch operations to
//! MCP clients.
//!
//! # Usage
//!
//! ```bash
//! opensearch-mcp-bridge [--config <path>] [--timeout-secs <n>]
//! ```
//!
//! Without a configuration file the connection is taken from the
//! environment (`OPENSEARCH_URL`, `OPENSEARCH_USERNAME` /
//! `OPENSEARCH_PASSWORD`, `OPENSEARCH_NO_AUTH`,
//! `OPENSEARCH_ALLOWED_INDEX_PATTERNS` /
//! `OPENSEARCH_DENIED_INDEX_PATTERNS`).
//!
//! # Protocol
//!
//! JSON-RPC 2.0 over stdio: requests and responses go through stdout,
//! logs go to stderr. `RUST_LOG` controls verbosity (default
//! `search_mcp=info`).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use search_cluster::{BridgeConfig, ClusterRegistry};
use search_mcp::{BridgeServer, Dispatcher};

/// MCP server for OpenSearch clusters
#[derive(Parser)]
#[command(name = "opensearch-mcp-bridge")]
#[command(about = "MCP server exposing OpenSearch operations")]
#[command(version)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Upper bound on a single tool call, in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs to stderr; stdout is reserved for the MCP protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("search_mcp=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = BridgeConfig::load(args.config.as_deref())?;
    let clusters = Arc::new(ClusterRegistry::from_config(&config).await?);

    let dispatcher = Dispatcher::new(
        clusters,
        config.tool_filter.as_ref(),
        Duration::from_secs(args.timeout_secs),
    )
    .await?;

    let server = BridgeServer::new(dispatcher);
    server.run().await?;

    Ok(())
}
