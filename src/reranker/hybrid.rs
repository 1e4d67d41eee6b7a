//! Multi-strategy reranking orchestrator.
//!
//! # Architecture
//!
//! ```ascii
//! ┌──────────────┐    ┌─────────────────────────────────────┐
//! │ query +      │    │           HybridReranker            │
//! │ candidates   │───►│  strategy (fixed at construction)   │
//! └──────────────┘    ├─────────────────────────────────────┤
//!                     │ fast      ─► ScorerHandle           │
//!                     │ accurate  ─► ScorerHandle           │
//!                     │ cross     ─► ScorerHandle           │
//!                     │ keyword   ─► KeywordScorer (local)  │
//!                     └──────────────────┬──────────────────┘
//!                                        ▼
//!                        sorted, truncated RerankResult list
//! ```
//!
//! # Strategies
//!
//! | Strategy | Scorers | Combination |
//! |----------|---------|-------------|
//! | speed | fast | `fast * (1 + 0.1*keyword)` |
//! | balanced | fast (widen to 2k), cross | weighted 0.4/0.4/0.2, renormalized |
//! | accurate | accurate (cross fallback) | `base * (1 + 0.15*keyword)` |
//! | ensemble | all three + keyword | weighted 0.25/0.40/0.25/0.10, renormalized |
//!
//! Both weighted strategies renormalize by the sum of weights of the
//! signals actually present for a candidate, so a missing model shifts
//! emphasis to the remaining signals instead of deflating every score.
//!
//! # Degradation
//!
//! When every model a strategy needs is unavailable, the orchestrator
//! preserves input order with `rerank_score = original_score` and no
//! per-signal scores populated. A scoring failure mid-query is absorbed
//! the same way a degraded handle is: that signal contributes nothing.
//! Callers always receive a valid ranked list.

use std::cmp::Ordering;

use tracing::{debug, warn};

use super::config::RerankStrategy;
use super::keyword::KeywordScorer;
use super::result::RerankResult;
use super::traits::ScorerHandle;
use crate::types::RankedCandidate;

/// Strategy-driven reranker over optional relevance models.
pub struct HybridReranker {
    strategy: RerankStrategy,
    fast: ScorerHandle,
    accurate: ScorerHandle,
    cross_encoder: ScorerHandle,
    keyword: KeywordScorer,
}

impl HybridReranker {
    /// Create an orchestrator with every model degraded.
    ///
    /// Useful as a builder seed and as the worst-case configuration:
    /// reranking still succeeds, as a pass-through.
    pub fn new(strategy: RerankStrategy) -> Self {
        Self {
            strategy,
            fast: ScorerHandle::unavailable("not configured"),
            accurate: ScorerHandle::unavailable("not configured"),
            cross_encoder: ScorerHandle::unavailable("not configured"),
            keyword: KeywordScorer::new(),
        }
    }

    /// Attach the low-latency model.
    pub fn with_fast(mut self, handle: ScorerHandle) -> Self {
        self.fast = handle;
        self
    }

    /// Attach the high-accuracy model.
    pub fn with_accurate(mut self, handle: ScorerHandle) -> Self {
        self.accurate = handle;
        self
    }

    /// Attach the general cross-encoder.
    pub fn with_cross_encoder(mut self, handle: ScorerHandle) -> Self {
        self.cross_encoder = handle;
        self
    }

    /// Replace the keyword scorer (for a custom vocabulary).
    pub fn with_keyword(mut self, keyword: KeywordScorer) -> Self {
        self.keyword = keyword;
        self
    }

    /// The strategy this orchestrator was built with.
    pub fn strategy(&self) -> RerankStrategy {
        self.strategy
    }

    /// Which models are live, as (fast, accurate, cross-encoder).
    pub fn availability(&self) -> (bool, bool, bool) {
        (
            self.fast.is_available(),
            self.accurate.is_available(),
            self.cross_encoder.is_available(),
        )
    }

    /// Rerank candidates, returning at most `top_k` results sorted by
    /// descending `rerank_score`.
    ///
    /// Never fails: empty input short-circuits to an empty list, and a
    /// fully degraded scorer set preserves the input ordering.
    pub async fn rerank(
        &self,
        query: &str,
        candidates: &[RankedCandidate],
        top_k: usize,
    ) -> Vec<RerankResult> {
        if query.trim().is_empty() || candidates.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let strategy_usable = match self.strategy {
            RerankStrategy::Speed => self.fast.is_available(),
            RerankStrategy::Balanced => {
                self.fast.is_available() || self.cross_encoder.is_available()
            }
            RerankStrategy::Accurate => {
                self.accurate.is_available() || self.cross_encoder.is_available()
            }
            RerankStrategy::Ensemble => {
                self.fast.is_available()
                    || self.accurate.is_available()
                    || self.cross_encoder.is_available()
            }
        };
        if !strategy_usable {
            return self.pass_through(candidates, top_k);
        }

        match self.strategy {
            RerankStrategy::Speed => self.rerank_speed(query, candidates, top_k).await,
            RerankStrategy::Balanced => self.rerank_balanced(query, candidates, top_k).await,
            RerankStrategy::Accurate => self.rerank_accurate(query, candidates, top_k).await,
            RerankStrategy::Ensemble => self.rerank_ensemble(query, candidates, top_k).await,
        }
    }

    /// Degraded path: input order, incoming scores, no boost applied.
    fn pass_through(&self, candidates: &[RankedCandidate], top_k: usize) -> Vec<RerankResult> {
        warn!(
            strategy = %self.strategy,
            "no usable scorer, preserving input order"
        );
        candidates
            .iter()
            .take(top_k)
            .map(RerankResult::pass_through)
            .collect()
    }

    async fn rerank_speed(
        &self,
        query: &str,
        candidates: &[RankedCandidate],
        top_k: usize,
    ) -> Vec<RerankResult> {
        let contents = contents_of(candidates);
        let Some(fast_scores) = self.fast.score_batch(query, &contents).await else {
            return self.pass_through(candidates, top_k);
        };

        let mut results: Vec<RerankResult> = candidates
            .iter()
            .zip(&fast_scores)
            .map(|(candidate, &fast)| {
                let keyword = self.keyword.score(query, &candidate.candidate.content);
                let mut result = RerankResult::pass_through(candidate);
                result.fast_score = Some(fast);
                result.keyword_score = Some(keyword);
                result.rerank_score = fast * (1.0 + 0.1 * keyword);
                result
            })
            .collect();

        sort_and_truncate(&mut results, top_k);
        debug!(strategy = "speed", results = results.len(), "rerank complete");
        results
    }

    async fn rerank_balanced(
        &self,
        query: &str,
        candidates: &[RankedCandidate],
        top_k: usize,
    ) -> Vec<RerankResult> {
        let contents = contents_of(candidates);
        let fast_scores = self.fast.score_batch(query, &contents).await;

        // First pass: keep 2*top_k survivors so the cross-encoder sees a
        // wider field than the final cut.
        let widen = top_k.saturating_mul(2).max(1);
        let survivors: Vec<usize> = match &fast_scores {
            Some(scores) => {
                let mut indices: Vec<usize> = (0..candidates.len()).collect();
                indices.sort_by(|&a, &b| {
                    scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal)
                });
                indices.truncate(widen);
                indices
            }
            None => (0..candidates.len().min(widen)).collect(),
        };

        let survivor_contents: Vec<String> =
            survivors.iter().map(|&i| contents[i].clone()).collect();
        let cross_scores = self.cross_encoder.score_batch(query, &survivor_contents).await;

        let mut results: Vec<RerankResult> = survivors
            .iter()
            .enumerate()
            .map(|(pos, &i)| {
                let candidate = &candidates[i];
                let keyword = self.keyword.score(query, &candidate.candidate.content);
                let fast = fast_scores.as_ref().map(|s| s[i]);
                let cross = cross_scores.as_ref().map(|s| s[pos]);

                let mut total = 0.2 * keyword;
                let mut weight_sum = 0.2;
                if let Some(fast) = fast {
                    total += 0.4 * fast;
                    weight_sum += 0.4;
                }
                if let Some(cross) = cross {
                    total += 0.4 * cross;
                    weight_sum += 0.4;
                }

                let mut result = RerankResult::pass_through(candidate);
                result.fast_score = fast;
                result.cross_encoder_score = cross;
                result.keyword_score = Some(keyword);
                result.rerank_score = total / weight_sum;
                result
            })
            .collect();

        sort_and_truncate(&mut results, top_k);
        debug!(strategy = "balanced", results = results.len(), "rerank complete");
        results
    }

    async fn rerank_accurate(
        &self,
        query: &str,
        candidates: &[RankedCandidate],
        top_k: usize,
    ) -> Vec<RerankResult> {
        let use_accurate = self.accurate.is_available();
        let base = if use_accurate {
            &self.accurate
        } else {
            debug!("accurate model unavailable, falling back to cross-encoder");
            &self.cross_encoder
        };

        let contents = contents_of(candidates);
        let Some(base_scores) = base.score_batch(query, &contents).await else {
            return self.pass_through(candidates, top_k);
        };

        // Boost only a 2*top_k head of the base ranking.
        let widen = top_k.saturating_mul(2).max(1);
        let mut survivors: Vec<usize> = (0..candidates.len()).collect();
        survivors.sort_by(|&a, &b| {
            base_scores[b]
                .partial_cmp(&base_scores[a])
                .unwrap_or(Ordering::Equal)
        });
        survivors.truncate(widen);

        let mut results: Vec<RerankResult> = survivors
            .into_iter()
            .map(|i| {
                let candidate = &candidates[i];
                let keyword = self.keyword.score(query, &candidate.candidate.content);
                let mut result = RerankResult::pass_through(candidate);
                if use_accurate {
                    result.accurate_score = Some(base_scores[i]);
                } else {
                    result.cross_encoder_score = Some(base_scores[i]);
                }
                result.keyword_score = Some(keyword);
                result.rerank_score = base_scores[i] * (1.0 + 0.15 * keyword);
                result
            })
            .collect();

        sort_and_truncate(&mut results, top_k);
        debug!(strategy = "accurate", results = results.len(), "rerank complete");
        results
    }

    async fn rerank_ensemble(
        &self,
        query: &str,
        candidates: &[RankedCandidate],
        top_k: usize,
    ) -> Vec<RerankResult> {
        let contents = contents_of(candidates);
        let (fast_scores, accurate_scores, cross_scores) = futures::join!(
            self.fast.score_batch(query, &contents),
            self.accurate.score_batch(query, &contents),
            self.cross_encoder.score_batch(query, &contents),
        );

        let mut results: Vec<RerankResult> = candidates
            .iter()
            .enumerate()
            .map(|(i, candidate)| {
                let keyword = self.keyword.score(query, &candidate.candidate.content);
                let fast = fast_scores.as_ref().map(|s| s[i]);
                let accurate = accurate_scores.as_ref().map(|s| s[i]);
                let cross = cross_scores.as_ref().map(|s| s[i]);

                let mut total = 0.10 * keyword;
                let mut weight_sum = 0.10;
                if let Some(fast) = fast {
                    total += 0.25 * fast;
                    weight_sum += 0.25;
                }
                if let Some(accurate) = accurate {
                    total += 0.40 * accurate;
                    weight_sum += 0.40;
                }
                if let Some(cross) = cross {
                    total += 0.25 * cross;
                    weight_sum += 0.25;
                }

                let mut result = RerankResult::pass_through(candidate);
                result.fast_score = fast;
                result.accurate_score = accurate;
                result.cross_encoder_score = cross;
                result.keyword_score = Some(keyword);
                result.rerank_score = total / weight_sum;
                result
            })
            .collect();

        sort_and_truncate(&mut results, top_k);
        debug!(strategy = "ensemble", results = results.len(), "rerank complete");
        results
    }
}

fn contents_of(candidates: &[RankedCandidate]) -> Vec<String> {
    candidates
        .iter()
        .map(|c| c.candidate.content.clone())
        .collect()
}

/// Stable descending sort: ties keep the order of the prior pass.
fn sort_and_truncate(results: &mut Vec<RerankResult>, top_k: usize) {
    results.sort_by(|a, b| {
        b.rerank_score
            .partial_cmp(&a.rerank_score)
            .unwrap_or(Ordering::Equal)
    });
    results.truncate(top_k);
}
