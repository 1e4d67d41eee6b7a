//! Reciprocal Rank Fusion of the three retriever signals.
//!
//! Combines ranked lists without any score normalization: each retriever
//! contributes `weight / (k + rank)` per document, so only positions and
//! configured emphasis matter, never the retrievers' raw score scales.
//!
//! ```ascii
//! rrf_score(d) = Σ_r  w_r / (k + rank_r(d))     rank is 1-indexed
//! ```
//!
//! # Merge semantics
//!
//! Results are merged by `chunk_id`: the first retriever to surface an id
//! creates the record; later retrievers populate their own score/rank
//! fields on the same record. A chunk never appears twice, and the output
//! id set is exactly the union of the input id sets.
//!
//! # Ordering
//!
//! Descending `rrf_score`; exact ties keep first-sighting order (dense
//! before BM25 before late-interaction), which makes fusion fully
//! deterministic for reproducible tests.

use std::collections::HashMap;

use tracing::debug;

use crate::config::FusionWeights;
use crate::types::{FusedResult, RetrievedChunk};

/// Which retriever a ranked list came from; selects the weight and the
/// score/rank fields to populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Dense,
    Bm25,
    Colbert,
}

/// Weighted reciprocal rank fusion.
#[derive(Debug, Clone)]
pub struct RrfFusion {
    k: u32,
    weights: FusionWeights,
}

impl RrfFusion {
    /// Create a fuser with the standard damping constant k = 60.
    pub fn new(weights: FusionWeights) -> Self {
        Self::with_k(60, weights)
    }

    /// Create a fuser with a custom damping constant (clamped to >= 1).
    /// Larger k flattens the influence of rank differences.
    pub fn with_k(k: u32, weights: FusionWeights) -> Self {
        Self {
            k: k.max(1),
            weights,
        }
    }

    /// Fuse the three retriever result lists into one ranking.
    ///
    /// Empty inputs are fine: an absent signal contributes nothing, and
    /// three empty lists fuse to an empty list.
    pub fn fuse(
        &self,
        dense: &[RetrievedChunk],
        bm25: &[RetrievedChunk],
        colbert: &[RetrievedChunk],
    ) -> Vec<FusedResult> {
        // Insertion order doubles as the deterministic tie-break.
        let mut order: Vec<String> = Vec::new();
        let mut merged: HashMap<String, FusedResult> = HashMap::new();

        self.absorb(&mut merged, &mut order, dense, Source::Dense);
        self.absorb(&mut merged, &mut order, bm25, Source::Bm25);
        self.absorb(&mut merged, &mut order, colbert, Source::Colbert);

        let mut fused: Vec<FusedResult> = order
            .into_iter()
            .filter_map(|chunk_id| merged.remove(&chunk_id))
            .collect();
        fused.sort_by(|a, b| {
            b.rrf_score
                .partial_cmp(&a.rrf_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!(unique_documents = fused.len(), "RRF fusion complete");
        fused
    }

    fn absorb(
        &self,
        merged: &mut HashMap<String, FusedResult>,
        order: &mut Vec<String>,
        results: &[RetrievedChunk],
        source: Source,
    ) {
        let weight = match source {
            Source::Dense => self.weights.dense,
            Source::Bm25 => self.weights.bm25,
            Source::Colbert => self.weights.colbert,
        };

        for (position, chunk) in results.iter().enumerate() {
            let rank = position + 1;
            let entry = merged
                .entry(chunk.candidate.chunk_id.clone())
                .or_insert_with(|| {
                    order.push(chunk.candidate.chunk_id.clone());
                    FusedResult {
                        chunk_id: chunk.candidate.chunk_id.clone(),
                        content: chunk.candidate.content.clone(),
                        metadata: chunk.candidate.metadata.clone(),
                        rrf_score: 0.0,
                        dense_score: 0.0,
                        bm25_score: 0.0,
                        colbert_score: 0.0,
                        dense_rank: None,
                        bm25_rank: None,
                        colbert_rank: None,
                    }
                });

            match source {
                Source::Dense => {
                    entry.dense_score = chunk.score;
                    entry.dense_rank = Some(rank);
                }
                Source::Bm25 => {
                    entry.bm25_score = chunk.score;
                    entry.bm25_rank = Some(rank);
                }
                Source::Colbert => {
                    entry.colbert_score = chunk.score;
                    entry.colbert_rank = Some(rank);
                }
            }
            entry.rrf_score += weight * (1.0 / (self.k as f64 + rank as f64));
        }
    }
}

impl Default for RrfFusion {
    fn default() -> Self {
        Self::new(FusionWeights::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Candidate;

    fn chunk(id: &str, score: f64) -> RetrievedChunk {
        RetrievedChunk {
            candidate: Candidate::with_id(id, format!("content of {}", id)),
            score,
        }
    }

    #[test]
    fn test_all_empty_inputs_fuse_to_empty() {
        let fusion = RrfFusion::default();
        assert!(fusion.fuse(&[], &[], &[]).is_empty());
    }

    #[test]
    fn test_union_of_ids_no_duplicates() {
        let fusion = RrfFusion::default();
        let dense = vec![chunk("d1", 0.9), chunk("d2", 0.8)];
        let bm25 = vec![chunk("d2", 5.0), chunk("d3", 4.0)];
        let colbert = vec![chunk("d3", 1.5), chunk("d4", 1.0)];

        let fused = fusion.fuse(&dense, &bm25, &colbert);

        let mut ids: Vec<&str> = fused.iter().map(|f| f.chunk_id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["d1", "d2", "d3", "d4"]);
    }

    #[test]
    fn test_exact_arithmetic_default_weights() {
        // dense = [d1, d2, d3], bm25 = [d3, d1], colbert unavailable.
        let fusion = RrfFusion::default();
        let dense = vec![chunk("d1", 0.9), chunk("d2", 0.8), chunk("d3", 0.7)];
        let bm25 = vec![chunk("d3", 6.0), chunk("d1", 5.0)];

        let fused = fusion.fuse(&dense, &bm25, &[]);

        let d1 = fused.iter().find(|f| f.chunk_id == "d1").unwrap();
        let d3 = fused.iter().find(|f| f.chunk_id == "d3").unwrap();

        let expected_d1 = 0.4 / 61.0 + 0.3 / 62.0;
        let expected_d3 = 0.4 / 63.0 + 0.3 / 61.0;
        assert!((d1.rrf_score - expected_d1).abs() < 1e-12);
        assert!((d3.rrf_score - expected_d3).abs() < 1e-12);
        // d1 edges out d3.
        assert_eq!(fused[0].chunk_id, "d1");
        assert_eq!(fused[1].chunk_id, "d3");
    }

    #[test]
    fn test_per_source_fields_populated_only_by_that_source() {
        let fusion = RrfFusion::default();
        let dense = vec![chunk("d1", 0.9)];
        let bm25 = vec![chunk("d1", 7.5)];

        let fused = fusion.fuse(&dense, &bm25, &[]);
        let d1 = &fused[0];

        assert!((d1.dense_score - 0.9).abs() < 1e-12);
        assert!((d1.bm25_score - 7.5).abs() < 1e-12);
        assert_eq!(d1.dense_rank, Some(1));
        assert_eq!(d1.bm25_rank, Some(1));
        assert_eq!(d1.colbert_rank, None);
        assert!((d1.colbert_score - 0.0).abs() < 1e-12);
        assert_eq!(d1.signal_count(), 2);
    }

    #[test]
    fn test_rank_improvement_raises_score() {
        let fusion = RrfFusion::default();

        let low = fusion.fuse(&[chunk("a", 0.9), chunk("b", 0.8)], &[], &[]);
        let high = fusion.fuse(&[chunk("b", 0.9), chunk("a", 0.8)], &[], &[]);

        let b_low = low.iter().find(|f| f.chunk_id == "b").unwrap().rrf_score;
        let b_high = high.iter().find(|f| f.chunk_id == "b").unwrap().rrf_score;
        assert!(b_high > b_low);
    }

    #[test]
    fn test_score_ignores_raw_magnitudes() {
        let fusion = RrfFusion::default();
        let small = fusion.fuse(&[chunk("a", 0.0001)], &[], &[]);
        let large = fusion.fuse(&[chunk("a", 9000.0)], &[], &[]);
        assert!((small[0].rrf_score - large[0].rrf_score).abs() < 1e-12);
    }

    #[test]
    fn test_deterministic_tie_break_first_sighting() {
        // Same single-source rank in bm25 and colbert with equal weights
        // would tie; first-sighting order must hold across runs.
        let weights = FusionWeights {
            dense: 0.0,
            bm25: 0.3,
            colbert: 0.3,
        };
        let fusion = RrfFusion::new(weights);
        let fused = fusion.fuse(&[], &[chunk("from_bm25", 1.0)], &[chunk("from_colbert", 1.0)]);

        assert_eq!(fused[0].chunk_id, "from_bm25");
        assert_eq!(fused[1].chunk_id, "from_colbert");
    }

    #[test]
    fn test_custom_k_flattens_rank_differences() {
        let weights = FusionWeights::default();
        let sharp = RrfFusion::with_k(1, weights);
        let flat = RrfFusion::with_k(1000, weights);

        let dense = vec![chunk("a", 0.9), chunk("b", 0.8)];
        let sharp_results = sharp.fuse(&dense, &[], &[]);
        let flat_results = flat.fuse(&dense, &[], &[]);

        let sharp_gap = sharp_results[0].rrf_score - sharp_results[1].rrf_score;
        let flat_gap = flat_results[0].rrf_score - flat_results[1].rrf_score;
        assert!(sharp_gap > flat_gap);
    }

    #[test]
    fn test_scores_non_negative() {
        let fusion = RrfFusion::default();
        let fused = fusion.fuse(
            &[chunk("a", -5.0)],
            &[chunk("b", 0.0)],
            &[chunk("c", 2.0)],
        );
        assert!(fused.iter().all(|f| f.rrf_score > 0.0));
    }
}
