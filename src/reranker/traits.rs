//! Relevance model trait and availability handle.
//!
//! # Architecture
//!
//! ```ascii
//!                  ┌──────────────────────┐
//!                  │ RelevanceModel trait │
//!                  └──────────┬───────────┘
//!                             │
//!            ┌────────────────┼────────────────┐
//!            ▼                ▼                ▼
//!   ┌────────────────┐ ┌─────────────┐ ┌──────────────────┐
//!   │HttpRelevance-  │ │MockRelevance│ │  (custom impls)  │
//!   │Model (remote)  │ │Model (tests)│ │                  │
//!   └────────────────┘ └─────────────┘ └──────────────────┘
//! ```
//!
//! Models are wrapped in a [`ScorerHandle`] before the orchestrator sees
//! them. The handle makes degradation explicit: construction failures
//! become [`ScorerHandle::Unavailable`] instead of an error, and scoring
//! failures become `None` instead of a propagated error. The orchestrator
//! branches on availability rather than catching anything.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Result;

/// A scorer over (query, passage) pairs.
///
/// Implementations differ only in latency/accuracy profile, not in
/// contract: `score_batch` returns one score per passage, in input order.
#[async_trait]
pub trait RelevanceModel: Send + Sync {
    /// Identifier for this scorer.
    fn name(&self) -> &str;

    /// Model or algorithm being used.
    fn model(&self) -> &str;

    /// Score every passage against the query.
    ///
    /// The returned vector has exactly one entry per input passage, in
    /// the same order. Higher is more relevant.
    async fn score_batch(&self, query: &str, passages: &[String]) -> Result<Vec<f64>>;
}

/// Capability handle for an optional relevance model.
///
/// Pretrained models routinely fail to load in constrained environments;
/// that is the dominant failure mode this pipeline defends against. A
/// handle is therefore either a live model or a recorded reason why the
/// model is absent, and it never raises from a scoring call.
#[derive(Clone)]
pub enum ScorerHandle {
    /// Model loaded and ready to score.
    Available(Arc<dyn RelevanceModel>),
    /// Model could not be constructed; the reason is kept for logs.
    Unavailable {
        /// Why the model is absent.
        reason: String,
    },
}

impl ScorerHandle {
    /// Wrap a live model.
    pub fn available(model: Arc<dyn RelevanceModel>) -> Self {
        Self::Available(model)
    }

    /// Record a permanently degraded scorer.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Whether a live model is behind this handle.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Scorer name, or `"unavailable"` for a degraded handle.
    pub fn name(&self) -> &str {
        match self {
            Self::Available(model) => model.name(),
            Self::Unavailable { .. } => "unavailable",
        }
    }

    /// Score passages, containing every failure.
    ///
    /// Returns `None` when the handle is degraded, the call fails, or
    /// the model returns the wrong number of scores. An unavailable
    /// handle never issues a call.
    pub async fn score_batch(&self, query: &str, passages: &[String]) -> Option<Vec<f64>> {
        let model = match self {
            Self::Available(model) => model,
            Self::Unavailable { reason } => {
                debug!(reason = %reason, "scorer unavailable, skipping");
                return None;
            }
        };

        match model.score_batch(query, passages).await {
            Ok(scores) if scores.len() == passages.len() => Some(scores),
            Ok(scores) => {
                warn!(
                    scorer = model.name(),
                    expected = passages.len(),
                    got = scores.len(),
                    "scorer returned wrong number of scores, dropping signal"
                );
                None
            }
            Err(err) => {
                warn!(scorer = model.name(), error = %err, "scoring failed, dropping signal");
                None
            }
        }
    }
}

impl std::fmt::Debug for ScorerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available(model) => f
                .debug_struct("ScorerHandle::Available")
                .field("name", &model.name())
                .field("model", &model.model())
                .finish(),
            Self::Unavailable { reason } => f
                .debug_struct("ScorerHandle::Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}
