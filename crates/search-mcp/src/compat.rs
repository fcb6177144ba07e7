//! Version compatibility gate
//!
//! Compares the target cluster's version against a tool's declared
//! bounds. Bounds are inclusive; an absent bound is unbounded on that
//! side. In single-cluster mode the gate runs once at startup to prune
//! the exposed tool set; in multi-cluster mode it runs per request,
//! since different clusters may run different versions.

use semver::Version;

use crate::error::{Error, Result};
use crate::tools::ToolDescriptor;

/// Check a tool against a cluster version.
pub fn check(tool: &ToolDescriptor, current: &Version) -> Result<()> {
    let below = tool.min_version.as_ref().is_some_and(|min| current < min);
    let above = tool.max_version.as_ref().is_some_and(|max| current > max);
    if below || above {
        return Err(Error::IncompatibleVersion {
            tool: tool.name.to_string(),
            current: current.clone(),
            supported: supported_range(tool.min_version.as_ref(), tool.max_version.as_ref()),
        });
    }
    Ok(())
}

/// Human-readable supported range, `None` when fully unbounded.
fn supported_range(min: Option<&Version>, max: Option<&Version>) -> Option<String> {
    match (min, max) {
        (Some(min), Some(max)) => Some(format!("{min} to {max}")),
        (Some(min), None) => Some(format!("{min} or later")),
        (None, Some(max)) => Some(format!("up to {max}")),
        (None, None) => None,
    }
}
