//! Core value objects for the retrieval pipeline.
//!
//! All types here are immutable value objects: created once at ingestion or
//! during a pipeline pass, read-only afterward. Reranking produces new
//! [`crate::reranker::RerankResult`] records instead of mutating candidates,
//! so concurrent queries never share mutable state.
//!
//! # Flow
//!
//! ```ascii
//! Candidate ──► per-retriever hit ──► FusedResult ──► RankedCandidate
//! (ingestion)   (dense/bm25/colbert)  (RRF merge)     (reranker input)
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// A retrievable unit of text produced by the ingestion pipeline.
///
/// The `chunk_id` is stable across retrieval calls and is the identity
/// used when merging results from independent retrievers. Metadata carries
/// provenance (source file, page, chunk index) as open JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Opaque unique identifier, stable across retrieval calls.
    pub chunk_id: String,
    /// Text body, immutable once created.
    pub content: String,
    /// Open provenance metadata (source file, page, chunk index).
    #[serde(default)]
    pub metadata: HashMap<String, JsonValue>,
}

impl Candidate {
    /// Create a candidate with a freshly generated id.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            chunk_id: Uuid::new_v4().to_string(),
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    /// Create a candidate with a stable id supplied by the ingestion
    /// pipeline.
    pub fn with_id(chunk_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// One record per unique `chunk_id` seen by any retriever, produced by
/// reciprocal rank fusion.
///
/// Per-retriever score and rank fields are populated only by the retriever
/// that surfaced the id; the rest stay at their defaults (0.0 / `None`).
/// `rrf_score` depends only on rank positions and fusion weights, never on
/// raw score magnitudes, so retrievers with incomparable score scales fuse
/// cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedResult {
    /// Identity of the underlying chunk.
    pub chunk_id: String,
    /// Text body of the chunk.
    pub content: String,
    /// Provenance metadata carried through from the candidate.
    #[serde(default)]
    pub metadata: HashMap<String, JsonValue>,
    /// Cumulative weighted reciprocal-rank score. Non-negative.
    pub rrf_score: f64,
    /// Cosine similarity from dense retrieval, if surfaced there.
    pub dense_score: f64,
    /// BM25 relevance, if surfaced by the lexical index.
    pub bm25_score: f64,
    /// MaxSim relevance, if surfaced by the late-interaction index.
    pub colbert_score: f64,
    /// 1-indexed rank in the dense result list.
    pub dense_rank: Option<usize>,
    /// 1-indexed rank in the BM25 result list.
    pub bm25_rank: Option<usize>,
    /// 1-indexed rank in the late-interaction result list.
    pub colbert_rank: Option<usize>,
}

impl FusedResult {
    /// Number of retrievers that surfaced this chunk.
    pub fn signal_count(&self) -> usize {
        [self.dense_rank, self.bm25_rank, self.colbert_rank]
            .iter()
            .filter(|r| r.is_some())
            .count()
    }
}

/// A candidate paired with the relevance score it entered the reranking
/// stage with.
///
/// This is the reranker's input unit: the score becomes `original_score`
/// on the output record and is the pass-through value when every scorer
/// is degraded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// The underlying chunk.
    pub candidate: Candidate,
    /// Pre-rerank relevance (dense similarity or fused score).
    pub score: f64,
}

impl RankedCandidate {
    /// Pair a candidate with its pre-rerank score.
    pub fn new(candidate: Candidate, score: f64) -> Self {
        Self { candidate, score }
    }
}

impl From<FusedResult> for RankedCandidate {
    fn from(fused: FusedResult) -> Self {
        Self {
            candidate: Candidate {
                chunk_id: fused.chunk_id,
                content: fused.content,
                metadata: fused.metadata,
            },
            score: fused.rrf_score,
        }
    }
}

/// A single hit from one retriever, before fusion.
///
/// `score` is in that retriever's own scale; fusion only uses the list
/// position, so scales never need to be comparable across retrievers.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    /// The underlying chunk.
    pub candidate: Candidate,
    /// Retriever-specific relevance score.
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_generated_id_unique() {
        let a = Candidate::new("alpha");
        let b = Candidate::new("alpha");
        assert_ne!(a.chunk_id, b.chunk_id);
    }

    #[test]
    fn test_candidate_with_id() {
        let c = Candidate::with_id("doc1", "Patient blood pressure is 145/92 mmHg");
        assert_eq!(c.chunk_id, "doc1");
        assert!(c.metadata.is_empty());
    }

    #[test]
    fn test_candidate_metadata_builder() {
        let c = Candidate::with_id("doc1", "text")
            .with_metadata("page", serde_json::json!(4))
            .with_metadata("source", serde_json::json!("report.pdf"));
        assert_eq!(c.metadata.get("page"), Some(&serde_json::json!(4)));
        assert_eq!(c.metadata.len(), 2);
    }

    #[test]
    fn test_fused_result_signal_count() {
        let fused = FusedResult {
            chunk_id: "doc1".to_string(),
            content: "text".to_string(),
            metadata: HashMap::new(),
            rrf_score: 0.01,
            dense_score: 0.8,
            bm25_score: 0.0,
            colbert_score: 1.2,
            dense_rank: Some(1),
            bm25_rank: None,
            colbert_rank: Some(3),
        };
        assert_eq!(fused.signal_count(), 2);
    }

    #[test]
    fn test_ranked_candidate_from_fused() {
        let fused = FusedResult {
            chunk_id: "doc2".to_string(),
            content: "Heart rate 88 bpm".to_string(),
            metadata: HashMap::new(),
            rrf_score: 0.0123,
            dense_score: 0.7,
            bm25_score: 2.1,
            colbert_score: 0.0,
            dense_rank: Some(2),
            bm25_rank: Some(1),
            colbert_rank: None,
        };
        let ranked: RankedCandidate = fused.into();
        assert_eq!(ranked.candidate.chunk_id, "doc2");
        assert!((ranked.score - 0.0123).abs() < 1e-12);
    }

    #[test]
    fn test_candidate_serde_round_trip() {
        let c = Candidate::with_id("doc1", "text").with_metadata("page", serde_json::json!(1));
        let json = serde_json::to_string(&c).unwrap();
        let back: Candidate = serde_json::from_str(&json).unwrap();
        assert_eq!(back.chunk_id, "doc1");
        assert_eq!(back.metadata.get("page"), Some(&serde_json::json!(1)));
    }
}
