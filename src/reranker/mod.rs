//! Multi-strategy reranking over optional relevance models.
//!
//! Second-pass relevance scoring for retrieval candidates: one or more
//! learned models plus a lexical keyword scorer, combined according to a
//! named strategy, with every model allowed to be absent.
//!
//! # Architecture
//!
//! ```ascii
//!                    ┌─────────────────────────────┐
//!                    │     Query + Candidates      │
//!                    └──────────────┬──────────────┘
//!                                   │
//!                                   ▼
//!     ┌─────────────────────────────────────────────────────┐
//!     │                 HybridReranker                       │
//!     │  rerank(query, candidates, top_k) → RerankResult    │
//!     └──────────────────────────┬──────────────────────────┘
//!                                │
//!        ┌──────────────┬────────┴──────┬──────────────────┐
//!        ▼              ▼               ▼                  ▼
//! ┌─────────────┐ ┌─────────────┐ ┌─────────────┐ ┌───────────────┐
//! │ fast model  │ │ accurate    │ │ cross-      │ │ KeywordScorer │
//! │ (handle)    │ │ model       │ │ encoder     │ │ (local, pure) │
//! └─────────────┘ └─────────────┘ └─────────────┘ └───────────────┘
//! ```
//!
//! # Module Structure
//!
//! ```ascii
//! reranker/
//! ├── mod.rs      ─► This file (re-exports)
//! ├── config.rs   ─► RelevanceModelConfig, RerankStrategy
//! ├── result.rs   ─► RerankResult
//! ├── traits.rs   ─► RelevanceModel trait, ScorerHandle
//! ├── http.rs     ─► HttpRelevanceModel (remote scoring services)
//! ├── keyword.rs  ─► KeywordScorer (clinical vocabulary)
//! └── hybrid.rs   ─► HybridReranker (strategy orchestration)
//! ```
//!
//! # Strategies
//!
//! | Strategy | Latency | Scorers |
//! |----------|---------|---------|
//! | speed | lowest | fast model + keyword boost |
//! | balanced | medium | fast first pass, cross-encoder second pass |
//! | accurate | highest | accurate model (cross-encoder fallback) |
//! | ensemble | highest | every model + keyword, weighted average |
//!
//! # Example
//!
//! ```ignore
//! use healthsecure_retrieval::reranker::{
//!     HttpRelevanceModel, HybridReranker, RelevanceModelConfig, RerankStrategy,
//! };
//!
//! let reranker = HybridReranker::new(RerankStrategy::Balanced)
//!     .with_fast(HttpRelevanceModel::handle("fast", RelevanceModelConfig::fast()))
//!     .with_cross_encoder(HttpRelevanceModel::handle(
//!         "cross-encoder",
//!         RelevanceModelConfig::cross_encoder(),
//!     ));
//!
//! let results = reranker.rerank(query, &candidates, 10).await;
//! ```

mod config;
mod http;
mod hybrid;
mod keyword;
mod result;
mod traits;

pub use config::{RelevanceModelConfig, RerankStrategy};
pub use http::HttpRelevanceModel;
pub use hybrid::HybridReranker;
pub use keyword::KeywordScorer;
pub use result::RerankResult;
pub use traits::{RelevanceModel, ScorerHandle};
