//! Multi-signal retrieval: three independent retrievers fused by RRF.
//!
//! | Module | Signal | Scale |
//! |--------|--------|-------|
//! | [`dense`] | embedding cosine similarity | `[-1, 1]` |
//! | [`bm25`] | BM25+ lexical relevance | `[0, ∞)` |
//! | [`late_interaction`] | token-level MaxSim | `[0, ∞)` |
//! | [`rrf`] | fused reciprocal-rank score | `(0, ∞)` |
//!
//! The scales are never compared directly; [`rrf`] fuses on rank
//! positions only. [`hybrid`] owns the fan-out, deadlines, and
//! truncation.

pub mod bm25;
pub mod dense;
pub mod hybrid;
pub mod late_interaction;
pub mod rrf;

pub use bm25::{Bm25Index, Bm25Params, TokenizerConfig};
pub use dense::DenseRetriever;
pub use hybrid::{HybridRetriever, SearchOptions};
pub use late_interaction::LateInteractionIndex;
pub use rrf::RrfFusion;
