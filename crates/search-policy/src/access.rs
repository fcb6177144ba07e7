//! Index access decisions
//!
//! [`IndexSecurityPolicy`] holds an allowed and a denied pattern set
//! and answers whether a concrete index name may be touched. The
//! precedence is fixed and must not be reordered:
//!
//! 1. Names containing a wildcard (`*` or `?`) are allowed through
//!    unconditionally - the backend expands them and applies its own
//!    authorization. This is a deliberate bypass.
//! 2. A non-empty denied set that matches the name rejects it, even if
//!    an allowed pattern also matches.
//! 3. A non-empty allowed set that does not match the name rejects it.
//! 4. Otherwise the name is allowed (no policy configured, or the name
//!    passed both checks).
//!
//! Callers may pass comma-joined lists (`"logs-a,logs-b"`); each name
//! is checked individually and the first violation is reported.

use crate::pattern::PatternSet;

/// A policy violation, naming the resource and the rule that fired
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessViolation {
    /// The index matched an entry of the denied set
    #[error("index \"{index}\" matches denied pattern: {pattern}")]
    Denied { index: String, pattern: String },

    /// A non-empty allowed set was configured and nothing matched
    #[error("index \"{index}\" does not match any allowed patterns")]
    NotAllowed { index: String },
}

impl AccessViolation {
    /// The offending index name.
    pub fn index(&self) -> &str {
        match self {
            AccessViolation::Denied { index, .. } | AccessViolation::NotAllowed { index } => index,
        }
    }
}

/// Allow/deny pattern sets for one cluster (or the global default)
///
/// Resolved once at registry construction; requests only read it.
#[derive(Debug, Clone, Default)]
pub struct IndexSecurityPolicy {
    allowed: PatternSet,
    denied: PatternSet,
}

impl IndexSecurityPolicy {
    pub fn new(allowed: PatternSet, denied: PatternSet) -> Self {
        Self { allowed, denied }
    }

    /// Build a policy from raw configured pattern strings.
    pub fn from_patterns<S: AsRef<str>>(allowed: &[S], denied: &[S]) -> crate::Result<Self> {
        Ok(Self {
            allowed: PatternSet::parse(allowed)?,
            denied: PatternSet::parse(denied)?,
        })
    }

    /// A policy with no restrictions.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// True if neither an allowed nor a denied set is configured.
    pub fn is_unrestricted(&self) -> bool {
        self.allowed.is_empty() && self.denied.is_empty()
    }

    /// The allow patterns as configured, for forwarding to the backend
    /// as native index patterns.
    pub fn allowed_patterns(&self) -> &PatternSet {
        &self.allowed
    }

    /// Check a (possibly comma-joined) index name expression.
    pub fn check(&self, name: &str) -> Result<(), AccessViolation> {
        if name.is_empty() {
            return Ok(());
        }
        for single in name.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            self.check_single(single)?;
        }
        Ok(())
    }

    /// Convenience boolean form of [`check`](Self::check).
    pub fn is_allowed(&self, name: &str) -> bool {
        self.check(name).is_ok()
    }

    fn check_single(&self, index: &str) -> Result<(), AccessViolation> {
        // Wildcard names cannot be validated here; the backend expands
        // them under its own authorization.
        if index.contains('*') || index.contains('?') {
            tracing::debug!(index, "index expression contains wildcards, allowing through");
            return Ok(());
        }

        if !self.denied.is_empty() {
            if let Some(pattern) = self.denied.first_match(index) {
                tracing::warn!(index, pattern, "index matches denied pattern");
                return Err(AccessViolation::Denied {
                    index: index.to_string(),
                    pattern: pattern.to_string(),
                });
            }
        }

        if !self.allowed.is_empty() && !self.allowed.matches(index) {
            tracing::warn!(index, "index does not match any allowed patterns");
            return Err(AccessViolation::NotAllowed {
                index: index.to_string(),
            });
        }

        Ok(())
    }
}
