//! Tool exposure filtering
//!
//! Computes the visible subset of the catalogue from the configured
//! rules: `visible = all ∩ allow_rules − deny_rules`. Allow rules
//! target an exact name, a category tag or a regex over names; the
//! write toggle is the deny side, removing tools whose HTTP methods go
//! beyond GET/HEAD. Filtering applies in single-cluster mode only.

use regex::Regex;

use search_cluster::ToolFilterConfig;

use crate::error::{Error, Result};
use crate::tools::{ToolDescriptor, ToolRegistry};

/// Compiled tool exposure rules
#[derive(Debug)]
pub struct ToolFilter {
    names: Vec<String>,
    categories: Vec<String>,
    regex: Option<Regex>,
    allow_writes: bool,
}

impl ToolFilter {
    /// Compile a filter from its configuration record.
    pub fn from_config(config: &ToolFilterConfig) -> Result<Self> {
        let regex = match &config.tool_regex {
            Some(pattern) => {
                Some(
                    Regex::new(pattern).map_err(|source| Error::InvalidFilterRegex {
                        pattern: pattern.clone(),
                        source,
                    })?,
                )
            }
            None => None,
        };
        Ok(Self {
            names: config.tool_names.clone(),
            categories: config.tool_categories.clone(),
            regex,
            allow_writes: config.allow_writes,
        })
    }

    /// A filter that exposes everything.
    pub fn permissive() -> Self {
        Self {
            names: Vec::new(),
            categories: Vec::new(),
            regex: None,
            allow_writes: true,
        }
    }

    fn has_allow_rules(&self) -> bool {
        !self.names.is_empty() || !self.categories.is_empty() || self.regex.is_some()
    }

    /// Decide whether one tool is exposed.
    pub fn is_visible(&self, tool: &ToolDescriptor) -> bool {
        if !self.allow_writes && !tool.is_read_only() {
            return false;
        }
        if !self.has_allow_rules() {
            return true;
        }
        self.names.iter().any(|n| n == tool.name)
            || tool
                .categories
                .iter()
                .any(|c| self.categories.iter().any(|want| want == c))
            || self.regex.as_ref().is_some_and(|r| r.is_match(tool.name))
    }

    /// Reduce the registry to the visible set.
    pub fn apply(&self, registry: &mut ToolRegistry) {
        let before = registry.len();
        registry.retain(|tool| self.is_visible(tool));
        if registry.len() != before {
            tracing::info!(
                visible = registry.len(),
                hidden = before - registry.len(),
                "tool filter applied"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(f: impl FnOnce(&mut ToolFilterConfig)) -> ToolFilter {
        let mut config = ToolFilterConfig::default();
        f(&mut config);
        ToolFilter::from_config(&config).unwrap()
    }

    #[test]
    fn no_rules_exposes_everything() {
        let mut registry = ToolRegistry::all();
        let total = registry.len();
        filter(|_| {}).apply(&mut registry);
        assert_eq!(registry.len(), total);
    }

    #[test]
    fn name_rules_are_exact() {
        let mut registry = ToolRegistry::all();
        filter(|c| {
            c.tool_names = vec!["ListIndexTool".to_string(), "SearchIndexTool".to_string()];
        })
        .apply(&mut registry);

        let mut names = registry.names();
        names.sort_unstable();
        assert_eq!(names, vec!["ListIndexTool", "SearchIndexTool"]);
    }

    #[test]
    fn category_rules_select_whole_groups() {
        let mut registry = ToolRegistry::all();
        filter(|c| c.tool_categories = vec!["cluster".to_string()]).apply(&mut registry);

        assert!(registry.get("CatNodesTool").is_some());
        assert!(registry.get("GetAllocationTool").is_some());
        assert!(registry.get("SearchIndexTool").is_none());
    }

    #[test]
    fn regex_rules_match_names() {
        let mut registry = ToolRegistry::all();
        filter(|c| c.tool_regex = Some("^Get.*Tool$".to_string())).apply(&mut registry);

        assert!(registry.get("GetShardsTool").is_some());
        assert!(registry.get("ListIndexTool").is_none());
    }

    #[test]
    fn rules_combine_as_a_union() {
        let mut registry = ToolRegistry::all();
        filter(|c| {
            c.tool_names = vec!["ListIndexTool".to_string()];
            c.tool_categories = vec!["search".to_string()];
        })
        .apply(&mut registry);

        assert!(registry.get("ListIndexTool").is_some());
        assert!(registry.get("SearchIndexTool").is_some());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn write_toggle_removes_mutating_tools() {
        let mut registry = ToolRegistry::all();
        let total = registry.len();
        filter(|c| c.allow_writes = false).apply(&mut registry);

        // SearchIndexTool issues POST, everything else is read-only
        assert!(registry.get("SearchIndexTool").is_none());
        assert_eq!(registry.len(), total - 1);
    }

    #[test]
    fn write_toggle_applies_on_top_of_allow_rules() {
        let mut registry = ToolRegistry::all();
        filter(|c| {
            c.tool_names = vec!["SearchIndexTool".to_string(), "ListIndexTool".to_string()];
            c.allow_writes = false;
        })
        .apply(&mut registry);

        assert_eq!(registry.names(), vec!["ListIndexTool"]);
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let mut config = ToolFilterConfig::default();
        config.tool_regex = Some("[unclosed".to_string());
        let err = ToolFilter::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::InvalidFilterRegex { .. }));
    }

    #[test]
    fn permissive_filter_hides_nothing() {
        let registry = ToolRegistry::all();
        let f = ToolFilter::permissive();
        assert!(registry.iter().all(|t| f.is_visible(t)));
    }
}
