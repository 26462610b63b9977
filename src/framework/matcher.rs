//! Name matching.
//!
//! Patterns are compiled once, up front. A bad pattern is a [`ConfigError`]
//! surfaced before the first page is requested.

use crate::framework::ConfigError;
use regex::{Regex, RegexBuilder};

/// A compiled name pattern.
///
/// Matching is an unanchored search: `TestProject` matches `MyTestProject2`.
/// Anchor explicitly (`^TestProject$`) for exact names.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        Self::build(pattern, false)
    }

    pub fn case_insensitive(pattern: &str) -> Result<Self, ConfigError> {
        Self::build(pattern, true)
    }

    fn build(pattern: &str, ignore_case: bool) -> Result<Self, ConfigError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self { regex })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Returns whether `name` satisfies `pattern`.
pub fn matches(name: &str, pattern: &Pattern) -> bool {
    pattern.matches(name)
}
