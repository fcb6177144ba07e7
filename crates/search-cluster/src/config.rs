//! Configuration surface
//!
//! A bridge runs in one of two modes, decided by the shape of its
//! configuration: a single unnamed `connection:` record, or a named
//! `clusters:` map. The YAML file wins over environment variables;
//! the environment only fills in what the file leaves absent, matching
//! the loader this replaces.
//!
//! ```yaml
//! clusters:
//!   prod:
//!     opensearch_url: https://search.example.com:9200
//!     opensearch_username: admin
//!     opensearch_password: secret
//!     index_security:
//!       denied_index_patterns: ["sensitive-*"]
//! index_security:
//!   allowed_index_patterns: ["logs-*", "metrics-*"]
//! tool_filter:
//!   tool_names: ["ListIndexTool", "SearchIndexTool"]
//!   allow_writes: false
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable names recognized by the fallback loader
const ENV_URL: &str = "OPENSEARCH_URL";
const ENV_USERNAME: &str = "OPENSEARCH_USERNAME";
const ENV_PASSWORD: &str = "OPENSEARCH_PASSWORD";
const ENV_NO_AUTH: &str = "OPENSEARCH_NO_AUTH";
const ENV_IAM_ARN: &str = "OPENSEARCH_IAM_ARN";
const ENV_REGION: &str = "AWS_REGION";
const ENV_ALLOWED: &str = "OPENSEARCH_ALLOWED_INDEX_PATTERNS";
const ENV_DENIED: &str = "OPENSEARCH_DENIED_INDEX_PATTERNS";

/// The raw configuration record for the whole bridge
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Named cluster map (multi-cluster mode)
    #[serde(default)]
    pub clusters: BTreeMap<String, ClusterConfig>,

    /// Single unnamed connection (single-cluster mode)
    #[serde(default)]
    pub connection: Option<ClusterConfig>,

    /// Global index security defaults, used by clusters without an
    /// override of their own
    #[serde(default)]
    pub index_security: Option<IndexSecurityConfig>,

    /// Tool exposure rules (single-cluster mode only)
    #[serde(default)]
    pub tool_filter: Option<ToolFilterConfig>,
}

/// One cluster's connection record
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    pub opensearch_url: Option<String>,

    #[serde(default)]
    pub opensearch_username: Option<String>,
    #[serde(default)]
    pub opensearch_password: Option<String>,

    /// IAM role to assume for SigV4 signing
    #[serde(default)]
    pub iam_arn: Option<String>,
    #[serde(default)]
    pub aws_region: Option<String>,

    /// Explicitly disable authentication
    #[serde(default)]
    pub opensearch_no_auth: bool,

    /// Per-cluster index security override
    #[serde(default)]
    pub index_security: Option<IndexSecurityConfig>,
}

/// Allow/deny pattern lists for index access
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexSecurityConfig {
    #[serde(default)]
    pub allowed_index_patterns: Vec<String>,
    #[serde(default)]
    pub denied_index_patterns: Vec<String>,
}

/// Tool exposure rules
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolFilterConfig {
    /// Exact tool names to expose
    #[serde(default)]
    pub tool_names: Vec<String>,

    /// Category tags to expose
    #[serde(default)]
    pub tool_categories: Vec<String>,

    /// Regex over tool names to expose
    #[serde(default)]
    pub tool_regex: Option<String>,

    /// When false, tools performing write operations are hidden
    #[serde(default = "default_allow_writes")]
    pub allow_writes: bool,
}

impl Default for ToolFilterConfig {
    fn default() -> Self {
        Self {
            tool_names: Vec::new(),
            tool_categories: Vec::new(),
            tool_regex: None,
            allow_writes: default_allow_writes(),
        }
    }
}

fn default_allow_writes() -> bool {
    true
}

impl BridgeConfig {
    /// Load configuration: YAML file if given, environment fallback for
    /// whatever the file leaves absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.fill_from_env();
        Ok(config)
    }

    /// Parse a YAML configuration file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_yaml::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Fill absent pieces from the environment. The file always wins.
    fn fill_from_env(&mut self) {
        if self.clusters.is_empty() && self.connection.is_none() {
            if let Ok(url) = std::env::var(ENV_URL) {
                self.connection = Some(ClusterConfig {
                    opensearch_url: Some(url),
                    opensearch_username: std::env::var(ENV_USERNAME).ok(),
                    opensearch_password: std::env::var(ENV_PASSWORD).ok(),
                    iam_arn: std::env::var(ENV_IAM_ARN).ok(),
                    aws_region: std::env::var(ENV_REGION).ok(),
                    opensearch_no_auth: env_flag(ENV_NO_AUTH),
                    index_security: None,
                });
                tracing::info!("using connection settings from environment");
            }
        }

        if self.index_security.is_none() {
            let allowed = std::env::var(ENV_ALLOWED).ok().map(|v| parse_pattern_list(&v));
            let denied = std::env::var(ENV_DENIED).ok().map(|v| parse_pattern_list(&v));
            if allowed.is_some() || denied.is_some() {
                self.index_security = Some(IndexSecurityConfig {
                    allowed_index_patterns: allowed.unwrap_or_default(),
                    denied_index_patterns: denied.unwrap_or_default(),
                });
                tracing::info!("loaded index security patterns from environment");
            }
        }
    }

    /// True when the configuration describes multi-cluster mode.
    pub fn is_multi_cluster(&self) -> bool {
        !self.clusters.is_empty()
    }
}

/// Parse a pattern list: a JSON array (`["logs-*"]`) or a
/// comma-separated list (`logs-*, metrics-*`).
fn parse_pattern_list(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    if trimmed.starts_with('[') {
        match serde_json::from_str::<Vec<String>>(trimmed) {
            Ok(patterns) => return patterns,
            Err(e) => {
                tracing::error!(error = %e, "invalid JSON pattern list, ignoring");
                return Vec::new();
            }
        }
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
