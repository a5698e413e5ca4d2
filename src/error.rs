//! Error types for store and registry operations.
//!
//! Backend failures never reach application code through `save()`; these
//! variants surface from construction, configuration and the fallible
//! `try_*` entry points.

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Store errors with structured context.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Store name was empty.
    #[error("store name cannot be empty")]
    EmptyName,

    /// Name pattern failed to compile.
    #[error("invalid name pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Store data could not be serialized to JSON.
    #[error("failed to serialize store '{name}': {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Backend rejected a read or write.
    #[error("backend error for key '{key}': {reason}")]
    Backend { key: String, reason: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a backend error from the backend's `anyhow` chain.
    pub fn backend(key: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::Backend {
            key: key.into(),
            reason: format!("{err:#}"),
        }
    }

    /// Create an invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_keeps_context_chain() {
        let err = anyhow::anyhow!("quota exceeded").context("Failed to insert key 'k'");
        let err = Error::backend("k", &err);

        assert_eq!(
            err.to_string(),
            "backend error for key 'k': Failed to insert key 'k': quota exceeded"
        );
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(Error::EmptyName.to_string(), "store name cannot be empty");
        assert_eq!(
            Error::invalid_pattern("(", "unclosed group").to_string(),
            "invalid name pattern '(': unclosed group"
        );
    }
}
