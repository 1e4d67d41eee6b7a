//! # HealthSecure Retrieval
//!
//! Multi-signal retrieval fusion and reranking for a medical RAG backend.
//!
//! Three independent retrievers (dense embeddings, BM25 lexical,
//! late-interaction token matching) run concurrently over one query and
//! are fused by reciprocal rank fusion; the fused candidates can then be
//! rescored by a strategy-driven reranker combining learned models with a
//! clinical keyword signal.
//!
//! ```ascii
//!           ┌──► DenseRetriever ───────┐
//!  query ───┼──► Bm25Index           ──┼──► RrfFusion ──► HybridReranker ──► results
//!           └──► LateInteractionIndex ─┘      (rank-based)   (strategy-based)
//! ```
//!
//! Every external dependency (embedding provider, vector store,
//! pretrained scoring models) is allowed to be absent or to fail: each
//! signal degrades independently to "no contribution", and the pipeline
//! always returns a valid ranking, down to a pass-through of the input
//! order when everything is degraded.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use healthsecure_retrieval::config::RetrievalConfig;
//! use healthsecure_retrieval::retrieval::{HybridRetriever, SearchOptions};
//! use healthsecure_retrieval::reranker::{HybridReranker, RerankStrategy};
//! use healthsecure_retrieval::types::RankedCandidate;
//!
//! # async fn run() -> healthsecure_retrieval::error::Result<()> {
//! let retriever = HybridRetriever::new(RetrievalConfig::from_env());
//! retriever.index_documents(&documents).await?;
//!
//! let fused = retriever
//!     .search("What is the patient's blood pressure?", 20, SearchOptions::all())
//!     .await;
//!
//! let candidates: Vec<RankedCandidate> =
//!     fused.into_iter().map(Into::into).collect();
//! let reranker = HybridReranker::new(RerankStrategy::Balanced);
//! let results = reranker
//!     .rerank("What is the patient's blood pressure?", &candidates, 5)
//!     .await;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`types`] | Candidate, fused, and ranked value objects |
//! | [`config`] | Pipeline configuration and fusion weights |
//! | [`error`] | Error taxonomy with containment classification |
//! | [`traits`] | External collaborator seams (embedder, store, encoder) |
//! | [`retrieval`] | Dense, BM25, late-interaction retrievers + RRF |
//! | [`reranker`] | Strategy-driven second-pass scoring |
//! | [`cache`] | Content-addressed analysis cache |
//! | [`mock`] | Deterministic in-process collaborators |

pub mod cache;
pub mod config;
pub mod error;
pub mod mock;
pub mod reranker;
pub mod retrieval;
pub mod traits;
pub mod types;

pub use config::{FusionWeights, RetrievalConfig};
pub use error::{Result, RetrievalError};
pub use reranker::{HybridReranker, RerankResult, RerankStrategy, ScorerHandle};
pub use retrieval::{HybridRetriever, RrfFusion, SearchOptions};
pub use types::{Candidate, FusedResult, RankedCandidate, RetrievedChunk};
