//! Error types for the grounding pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
///
/// An empty corpus is not an error: retrieval over an
/// empty index yields an empty result, which the pipeline turns into a refusal.
#[derive(Debug, Error)]
pub enum Error {
    /// Retrieval attempted before any successful index build
    #[error("Corpus index has not been built")]
    IndexNotBuilt,

    /// A passage or query could not be encoded
    #[error("Vectorization failed: {0}")]
    Vectorization(String),

    /// The generator failed, timed out, or returned an unusable response
    #[error("Generator unavailable: {0}")]
    GeneratorUnavailable(String),

    /// A passage supplied for indexing is malformed
    #[error("Invalid passage {id}: {message}")]
    InvalidPassage { id: u64, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a vectorization error
    pub fn vectorization(message: impl Into<String>) -> Self {
        Self::Vectorization(message.into())
    }

    /// Create a generator error
    pub fn generator(message: impl Into<String>) -> Self {
        Self::GeneratorUnavailable(message.into())
    }

    /// Create an invalid passage error
    pub fn invalid_passage(id: u64, message: impl Into<String>) -> Self {
        Self::InvalidPassage {
            id,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the error affects only the query that raised it
    pub fn is_query_scoped(&self) -> bool {
        matches!(
            self,
            Self::IndexNotBuilt | Self::Vectorization(_) | Self::GeneratorUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_passage(7, "text is empty");
        assert_eq!(err.to_string(), "Invalid passage 7: text is empty");

        let err = Error::generator("HTTP 503");
        assert_eq!(err.to_string(), "Generator unavailable: HTTP 503");
    }

    #[test]
    fn test_query_scoped() {
        assert!(Error::IndexNotBuilt.is_query_scoped());
        assert!(Error::generator("timeout").is_query_scoped());
        assert!(!Error::config("bad").is_query_scoped());
    }
}
