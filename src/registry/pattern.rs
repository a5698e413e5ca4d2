//! Name patterns for registry lookups and bulk operations.

use regex::Regex;
use std::fmt;

use crate::error::{Error, Result};

/// Pattern matched against qualified store names.
///
/// Plain text matches anywhere in the name, so `"cache"` selects
/// `[/]cache` and `[/admin]image-cache` alike. Use [`NamePattern::regex`]
/// for anchored or structured matches.
#[derive(Clone)]
pub enum NamePattern {
    /// Substring match.
    Text(String),
    /// Regular expression match.
    Regex(Regex),
}

impl NamePattern {
    /// Compiles a regular expression pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if the expression does not compile.
    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|err| Error::invalid_pattern(pattern, err.to_string()))
    }

    /// Returns true if `name` matches.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Text(text) => name.contains(text.as_str()),
            Self::Regex(re) => re.is_match(name),
        }
    }
}

impl From<&str> for NamePattern {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for NamePattern {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Regex> for NamePattern {
    fn from(re: Regex) -> Self {
        Self::Regex(re)
    }
}

impl fmt::Debug for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text:?}"),
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// Selects which stores [`Registry::clear_all`](super::Registry::clear_all) clears.
///
/// A store is cleared when it matches any `only` pattern (or `only` is
/// empty) and matches no `not` pattern.
#[derive(Debug, Clone, Default)]
pub struct ClearFilter {
    pub only: Vec<NamePattern>,
    pub not: Vec<NamePattern>,
}

impl ClearFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn only(mut self, pattern: impl Into<NamePattern>) -> Self {
        self.only.push(pattern.into());
        self
    }

    #[must_use]
    pub fn not(mut self, pattern: impl Into<NamePattern>) -> Self {
        self.not.push(pattern.into());
        self
    }

    /// Returns true if a store named `name` should be cleared.
    pub fn selects(&self, name: &str) -> bool {
        let included = self.only.is_empty() || self.only.iter().any(|p| p.matches(name));
        let excluded = self.not.iter().any(|p| p.matches(name));
        included && !excluded
    }
}
