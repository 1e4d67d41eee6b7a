//! Reranker configuration types.
//!
//! # Architecture
//!
//! ```ascii
//! ┌─────────────────────────────────────────────────────────┐
//! │                RelevanceModelConfig                      │
//! ├─────────────────────────────────────────────────────────┤
//! │ model: String        ─────► Which model to use          │
//! │ base_url: String     ─────► Scoring endpoint            │
//! │ api_key: Option      ─────► Authentication              │
//! │ timeout: Duration    ─────► Request deadline            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The three factory constructors describe latency/accuracy profiles,
//! not different contracts: every profile speaks the same scoring API.

use std::str::FromStr;
use std::time::Duration;

use crate::error::RetrievalError;

/// Configuration for a remote relevance model.
///
/// # Profiles
///
/// | Constructor | Model | Target latency |
/// |-------------|-------|----------------|
/// | [`fast`](Self::fast) | `ms-marco-MiniLM-L-12-v2` | ≤20ms/query |
/// | [`accurate`](Self::accurate) | `mxbai-rerank-base-v1` | ≤150ms/query |
/// | [`cross_encoder`](Self::cross_encoder) | `ms-marco-MiniLM-L-6-v2` | moderate |
#[derive(Debug, Clone)]
pub struct RelevanceModelConfig {
    /// Model name sent with every scoring request.
    pub model: String,
    /// Scoring endpoint URL.
    pub base_url: String,
    /// Bearer token, if the endpoint requires one.
    pub api_key: Option<String>,
    /// Request deadline.
    pub timeout: Duration,
}

impl Default for RelevanceModelConfig {
    fn default() -> Self {
        Self::cross_encoder()
    }
}

impl RelevanceModelConfig {
    /// Low-latency scoring profile.
    pub fn fast() -> Self {
        Self {
            model: "ms-marco-MiniLM-L-12-v2".to_string(),
            base_url: "http://127.0.0.1:8601/rerank".to_string(),
            api_key: None,
            timeout: Duration::from_millis(500),
        }
    }

    /// High-accuracy scoring profile.
    pub fn accurate() -> Self {
        Self {
            model: "mxbai-rerank-base-v1".to_string(),
            base_url: "http://127.0.0.1:8602/rerank".to_string(),
            api_key: None,
            timeout: Duration::from_secs(5),
        }
    }

    /// General cross-encoder fallback profile.
    pub fn cross_encoder() -> Self {
        Self {
            model: "ms-marco-MiniLM-L-6-v2".to_string(),
            base_url: "http://127.0.0.1:8603/rerank".to_string(),
            api_key: None,
            timeout: Duration::from_secs(3),
        }
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the scoring endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Named latency/accuracy trade-off selecting which scorers run and how
/// their outputs combine.
///
/// | Strategy | Active scorers |
/// |----------|----------------|
/// | `Speed` | fast model + keyword boost |
/// | `Balanced` | fast first pass, cross-encoder second pass, keyword |
/// | `Accurate` | accurate model (cross-encoder fallback) + keyword boost |
/// | `Ensemble` | all three models + keyword, weighted average |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RerankStrategy {
    /// Fast model only, keyword-boosted.
    Speed,
    /// Two-pass fast + cross-encoder combination.
    #[default]
    Balanced,
    /// Accurate model with cross-encoder fallback.
    Accurate,
    /// All signals, weighted and renormalized.
    Ensemble,
}

impl RerankStrategy {
    /// Canonical configuration string for this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Speed => "speed",
            Self::Balanced => "balanced",
            Self::Accurate => "accurate",
            Self::Ensemble => "ensemble",
        }
    }
}

impl FromStr for RerankStrategy {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "speed" | "fast" => Ok(Self::Speed),
            "balanced" => Ok(Self::Balanced),
            "accurate" => Ok(Self::Accurate),
            "ensemble" => Ok(Self::Ensemble),
            other => Err(RetrievalError::Config(format!(
                "unknown rerank strategy: {other:?} (expected speed, balanced, accurate, or ensemble)"
            ))),
        }
    }
}

impl std::fmt::Display for RerankStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_differ() {
        let fast = RelevanceModelConfig::fast();
        let accurate = RelevanceModelConfig::accurate();
        assert_ne!(fast.model, accurate.model);
        assert!(fast.timeout < accurate.timeout);
    }

    #[test]
    fn test_config_builders() {
        let config = RelevanceModelConfig::fast()
            .with_base_url("http://scorer.internal/rerank")
            .with_api_key("secret")
            .with_timeout(Duration::from_secs(1));
        assert_eq!(config.base_url, "http://scorer.internal/rerank");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("speed".parse::<RerankStrategy>().unwrap(), RerankStrategy::Speed);
        assert_eq!("Fast".parse::<RerankStrategy>().unwrap(), RerankStrategy::Speed);
        assert_eq!(" BALANCED ".parse::<RerankStrategy>().unwrap(), RerankStrategy::Balanced);
        assert_eq!("accurate".parse::<RerankStrategy>().unwrap(), RerankStrategy::Accurate);
        assert_eq!("ensemble".parse::<RerankStrategy>().unwrap(), RerankStrategy::Ensemble);
        assert!("turbo".parse::<RerankStrategy>().is_err());
    }

    #[test]
    fn test_strategy_default_and_round_trip() {
        assert_eq!(RerankStrategy::default(), RerankStrategy::Balanced);
        for strategy in [
            RerankStrategy::Speed,
            RerankStrategy::Balanced,
            RerankStrategy::Accurate,
            RerankStrategy::Ensemble,
        ] {
            assert_eq!(strategy.as_str().parse::<RerankStrategy>().unwrap(), strategy);
        }
    }
}
