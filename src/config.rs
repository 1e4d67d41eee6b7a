//! Pipeline configuration.
//!
//! # Environment Variables
//!
//! [`RetrievalConfig::from_env`] reads overrides with the `HEALTHSECURE_`
//! prefix; anything unset keeps its default.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `HEALTHSECURE_COLLECTION` | `healthsecure_medical_docs` | vector store collection |
//! | `HEALTHSECURE_RRF_K` | `60` | RRF damping constant |
//! | `HEALTHSECURE_DENSE_WEIGHT` | `0.4` | dense fusion emphasis |
//! | `HEALTHSECURE_BM25_WEIGHT` | `0.3` | BM25 fusion emphasis |
//! | `HEALTHSECURE_COLBERT_WEIGHT` | `0.3` | late-interaction emphasis |
//! | `HEALTHSECURE_RETRIEVER_TIMEOUT_MS` | `2000` | per-retriever deadline |

use std::time::Duration;

use crate::error::{Result, RetrievalError};

/// Per-retriever emphasis applied to reciprocal-rank contributions.
///
/// Weights act as emphasis, not probabilities: they must be non-negative
/// and sum to at most 1.0, but are not required to sum to exactly 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    /// Weight for the dense (embedding similarity) retriever.
    pub dense: f64,
    /// Weight for the BM25 lexical retriever.
    pub bm25: f64,
    /// Weight for the late-interaction retriever.
    pub colbert: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            dense: 0.4,
            bm25: 0.3,
            colbert: 0.3,
        }
    }
}

impl FusionWeights {
    /// Validate the emphasis constraints.
    pub fn validate(&self) -> Result<()> {
        if self.dense < 0.0 || self.bm25 < 0.0 || self.colbert < 0.0 {
            return Err(RetrievalError::Config(
                "fusion weights must be non-negative".to_string(),
            ));
        }
        let sum = self.dense + self.bm25 + self.colbert;
        if sum > 1.0 + 1e-9 {
            return Err(RetrievalError::Config(format!(
                "fusion weights must sum to at most 1.0, got {:.3}",
                sum
            )));
        }
        Ok(())
    }
}

/// Configuration for the hybrid retrieval orchestrator.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Vector store collection holding the dense index.
    pub collection: String,
    /// RRF damping constant. Larger values flatten the influence of rank
    /// differences between retrievers.
    pub rrf_k: u32,
    /// Fusion emphasis per retriever.
    pub weights: FusionWeights,
    /// How many candidates to request from each retriever, as a multiple
    /// of the final `top_k`. Gives the fusion step enough material to
    /// promote chunks ranked well by only one signal.
    pub candidate_multiplier: usize,
    /// Deadline for each individual retriever call. A retriever that
    /// exceeds it contributes an empty list for that query only.
    pub retriever_timeout: Duration,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            collection: "healthsecure_medical_docs".to_string(),
            rrf_k: 60,
            weights: FusionWeights::default(),
            candidate_multiplier: 3,
            retriever_timeout: Duration::from_millis(2000),
        }
    }
}

impl RetrievalConfig {
    /// Build a config from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(collection) = std::env::var("HEALTHSECURE_COLLECTION") {
            if !collection.is_empty() {
                config.collection = collection;
            }
        }
        if let Some(k) = env_parse::<u32>("HEALTHSECURE_RRF_K") {
            config.rrf_k = k.max(1);
        }
        if let Some(w) = env_parse::<f64>("HEALTHSECURE_DENSE_WEIGHT") {
            config.weights.dense = w;
        }
        if let Some(w) = env_parse::<f64>("HEALTHSECURE_BM25_WEIGHT") {
            config.weights.bm25 = w;
        }
        if let Some(w) = env_parse::<f64>("HEALTHSECURE_COLBERT_WEIGHT") {
            config.weights.colbert = w;
        }
        if let Some(ms) = env_parse::<u64>("HEALTHSECURE_RETRIEVER_TIMEOUT_MS") {
            config.retriever_timeout = Duration::from_millis(ms);
        }

        config
    }

    /// Set the vector store collection.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Set the RRF damping constant (clamped to at least 1).
    pub fn with_rrf_k(mut self, k: u32) -> Self {
        self.rrf_k = k.max(1);
        self
    }

    /// Set the fusion weights.
    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set the per-retriever candidate multiplier (clamped to at least 1).
    pub fn with_candidate_multiplier(mut self, multiplier: usize) -> Self {
        self.candidate_multiplier = multiplier.max(1);
        self
    }

    /// Set the per-retriever deadline.
    pub fn with_retriever_timeout(mut self, timeout: Duration) -> Self {
        self.retriever_timeout = timeout;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if self.candidate_multiplier == 0 {
            return Err(RetrievalError::Config(
                "candidate multiplier must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
