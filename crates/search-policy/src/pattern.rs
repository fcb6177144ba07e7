//! Pattern sets for index name matching
//!
//! A pattern entry is either a shell-style wildcard (`*` matches any
//! run of characters, `?` matches a single character) or an explicit
//! regular expression marked with the `regex:` prefix.
//!
//! Regex semantics: a regex pattern matches when it matches at the
//! start of the name; the tail is unanchored unless the pattern itself
//! ends with `$`. This mirrors the behavior of existing deployed
//! configurations, so `regex:^logs-\d{4}-\d{2}$` accepts `logs-2024-01`
//! and rejects `logs-2024-1`.

use regex::Regex;

use crate::error::{Error, Result};

/// Prefix marking a pattern entry as a regular expression
const REGEX_MARKER: &str = "regex:";

/// A single compiled pattern entry
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Shell-style wildcard, fully anchored
    Wildcard { source: String, compiled: Regex },
    /// Explicit regex, anchored at the start of the name
    Regex { source: String, compiled: Regex },
}

impl Pattern {
    /// Parse and compile a single pattern entry.
    pub fn parse(text: &str) -> Result<Self> {
        if let Some(body) = text.strip_prefix(REGEX_MARKER) {
            let compiled =
                Regex::new(&format!("^(?:{body})")).map_err(|source| Error::InvalidPattern {
                    pattern: text.to_string(),
                    source,
                })?;
            Ok(Pattern::Regex {
                source: text.to_string(),
                compiled,
            })
        } else {
            let compiled = Regex::new(&wildcard_to_regex(text)).map_err(|source| {
                Error::InvalidPattern {
                    pattern: text.to_string(),
                    source,
                }
            })?;
            Ok(Pattern::Wildcard {
                source: text.to_string(),
                compiled,
            })
        }
    }

    /// The pattern text as configured, including any `regex:` marker.
    pub fn source(&self) -> &str {
        match self {
            Pattern::Wildcard { source, .. } | Pattern::Regex { source, .. } => source,
        }
    }

    /// Check whether `name` matches this pattern.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Pattern::Wildcard { compiled, .. } | Pattern::Regex { compiled, .. } => {
                compiled.is_match(name)
            }
        }
    }
}

/// An ordered set of patterns with any-match semantics
///
/// Compiled once at configuration load and immutable afterwards.
/// Matching short-circuits on the first hit; correctness does not
/// depend on entry order within a set.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    entries: Vec<Pattern>,
}

impl PatternSet {
    /// Compile a pattern set from configured entries.
    ///
    /// Fails on the first invalid entry so a broken security policy is
    /// caught at startup rather than silently never matching.
    pub fn parse<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let entries = patterns
            .iter()
            .map(|p| Pattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// An empty set, matching nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if any entry matches `name`.
    pub fn matches(&self, name: &str) -> bool {
        self.first_match(name).is_some()
    }

    /// The configured pattern strings, in order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Pattern::source)
    }

    /// The source text of the first entry matching `name`, if any.
    pub fn first_match(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|p| p.matches(name))
            .map(|p| p.source())
    }
}

/// Translate a shell-style wildcard to an anchored regex.
fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '.' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '^' | '$' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('$');
    out
}
