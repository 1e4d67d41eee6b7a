//! Retrieval error types with containment classification.
//!
//! # Error Handling Philosophy
//!
//! The pipeline must always hand a usable ranking back to the caller, so
//! errors are classified by *where they are allowed to stop*:
//!
//! 1. **Unavailable dependency**: a model or service that never loaded.
//!    The owning component enters a permanently degraded state and all of
//!    its operations become no-ops. Never propagated past the component.
//! 2. **Transient failure**: a timeout or network error during one query.
//!    Caught at the call site, logged, treated as "this signal contributed
//!    nothing for this query".
//! 3. **Invalid input**: empty query or candidate set. Short-circuits to an
//!    empty result before any scorer runs.
//!
//! | Error | Typical cause | Contained at |
//! |-------|---------------|--------------|
//! | `Unavailable` | missing weights, dead endpoint | component boundary |
//! | `Network` / `Timeout` | stalled backend | single query |
//! | `Api` | non-2xx from a rerank backend | single query |
//! | `Serialization` | malformed backend response | single query |
//! | `InvalidInput` | empty query/candidates | entry point |
//! | `Config` | bad weights, bad strategy name | construction |

use thiserror::Error;

/// Result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur in the retrieval and reranking pipeline.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// A dependency (model, index, service) is not available.
    ///
    /// Components holding this state stay degraded for their lifetime;
    /// callers branch on availability instead of catching this.
    #[error("Dependency unavailable: {0}")]
    Unavailable(String),

    /// Error returned by an external scoring or storage API.
    #[error("API error: {0}")]
    Api(String),

    /// Network error reaching an external backend.
    #[error("Network error: {0}")]
    Network(String),

    /// A single call exceeded its deadline.
    #[error("Request timed out")]
    Timeout,

    /// Malformed response payload from a backend.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Input the pipeline cannot rank (empty query, empty candidate set).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration (weights, strategy name, endpoint).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RetrievalError::Timeout
        } else if err.is_connect() {
            RetrievalError::Network(format!("Connection failed: {}", err))
        } else {
            RetrievalError::Network(err.to_string())
        }
    }
}

impl RetrievalError {
    /// Whether this error is a per-query transient that the orchestrator
    /// should absorb as "no contribution from this signal".
    ///
    /// Non-transient errors indicate a construction or input problem the
    /// caller should surface instead.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout | Self::Api(_) | Self::Serialization(_)
        )
    }

    /// Whether this error marks a permanently degraded dependency.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = RetrievalError::Unavailable("flashrank backend".to_string());
        assert_eq!(
            error.to_string(),
            "Dependency unavailable: flashrank backend"
        );

        let error = RetrievalError::Api("500 internal".to_string());
        assert_eq!(error.to_string(), "API error: 500 internal");

        let error = RetrievalError::InvalidInput("empty query".to_string());
        assert_eq!(error.to_string(), "Invalid input: empty query");
    }

    #[test]
    fn test_timeout_display() {
        assert_eq!(RetrievalError::Timeout.to_string(), "Request timed out");
    }

    #[test]
    fn test_transient_classification() {
        assert!(RetrievalError::Timeout.is_transient());
        assert!(RetrievalError::Network("refused".to_string()).is_transient());
        assert!(RetrievalError::Api("502".to_string()).is_transient());

        assert!(!RetrievalError::Unavailable("model".to_string()).is_transient());
        assert!(!RetrievalError::Config("bad weights".to_string()).is_transient());
        assert!(!RetrievalError::InvalidInput("empty".to_string()).is_transient());
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(RetrievalError::Unavailable("colbert".to_string()).is_unavailable());
        assert!(!RetrievalError::Timeout.is_unavailable());
    }

    #[test]
    fn test_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: RetrievalError = json_err.into();
        assert!(matches!(err, RetrievalError::Serialization(_)));
        assert!(err.is_transient());
    }
}
