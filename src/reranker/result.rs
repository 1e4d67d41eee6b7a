//! Reranking result record.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::types::RankedCandidate;

/// Final output record per candidate after reranking.
///
/// `rerank_score` is always populated and drives the final ordering; it
/// falls back to `original_score` when no scorer produced output. The
/// optional per-signal scores record which models actually contributed,
/// so callers can tell a genuine ranking from a degraded pass-through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankResult {
    /// Identity of the underlying chunk.
    pub chunk_id: String,
    /// Text body of the chunk.
    pub content: String,
    /// Relevance the candidate entered reranking with (similarity or
    /// fused score).
    pub original_score: f64,
    /// Final combined score; used for ordering.
    pub rerank_score: f64,
    /// Low-latency model score, if that model ran.
    pub fast_score: Option<f64>,
    /// High-accuracy model score, if that model ran.
    pub accurate_score: Option<f64>,
    /// General cross-encoder score, if that model ran.
    pub cross_encoder_score: Option<f64>,
    /// Lexical keyword score, if computed. Always in [0, 1].
    pub keyword_score: Option<f64>,
    /// Provenance metadata carried through from the candidate.
    #[serde(default)]
    pub metadata: HashMap<String, JsonValue>,
}

impl RerankResult {
    /// Build a degraded record that preserves the candidate's incoming
    /// score, with no per-signal scores populated.
    pub fn pass_through(candidate: &RankedCandidate) -> Self {
        Self {
            chunk_id: candidate.candidate.chunk_id.clone(),
            content: candidate.candidate.content.clone(),
            original_score: candidate.score,
            rerank_score: candidate.score,
            fast_score: None,
            accurate_score: None,
            cross_encoder_score: None,
            keyword_score: None,
            metadata: candidate.candidate.metadata.clone(),
        }
    }

    /// Whether any model or keyword signal contributed to this record.
    pub fn was_rescored(&self) -> bool {
        self.fast_score.is_some()
            || self.accurate_score.is_some()
            || self.cross_encoder_score.is_some()
            || self.keyword_score.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Candidate;

    #[test]
    fn test_pass_through_preserves_score() {
        let candidate = RankedCandidate::new(
            Candidate::with_id("doc1", "Heart rate 88 bpm").with_metadata("page", serde_json::json!(3)),
            0.7,
        );
        let result = RerankResult::pass_through(&candidate);
        assert_eq!(result.chunk_id, "doc1");
        assert!((result.rerank_score - 0.7).abs() < 1e-12);
        assert!((result.original_score - 0.7).abs() < 1e-12);
        assert!(!result.was_rescored());
        assert_eq!(result.metadata.get("page"), Some(&serde_json::json!(3)));
    }
}
