//! External collaborator interfaces.
//!
//! # WHY: Trait-Based Collaborator Abstraction
//!
//! The pipeline never talks to a concrete embedding model, vector store,
//! or token encoder. Using traits at these seams enables:
//!
//! - **Testing**: deterministic in-process fakes ([`crate::mock`]), no
//!   network and no model weights in unit tests
//! - **Degradation**: a collaborator that fails to construct is replaced
//!   by an unavailable handle instead of poisoning the pipeline
//! - **Deployment flexibility**: Qdrant, pgvector, or an in-memory store
//!   behind the same [`VectorStore`] trait
//!
//! # Key Traits
//!
//! - [`EmbeddingProvider`]: text → single dense vector
//! - [`VectorStore`]: idempotent upsert + nearest-neighbor search
//! - [`LateInteractionModel`]: text → per-token vectors for MaxSim scoring

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;

/// Generates dense embeddings for queries and passages.
///
/// Failures return an error, never a partial vector; the dense retriever
/// contains them as "no dense signal for this query".
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Name of this provider.
    fn name(&self) -> &str;

    /// Dimension of the produced vectors.
    fn dimension(&self) -> usize;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts. Default implementation embeds serially;
    /// providers with batch endpoints should override.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// A point to upsert into the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorPoint {
    /// Stable identity; upserting the same id twice replaces the point.
    pub id: String,
    /// Dense vector.
    pub vector: Vec<f32>,
    /// Open payload stored alongside the vector (content, provenance).
    pub payload: HashMap<String, JsonValue>,
}

/// A scored nearest-neighbor hit from the vector store.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Point id (the candidate's `chunk_id`).
    pub id: String,
    /// Similarity score in the store's scale (cosine assumed).
    pub score: f64,
    /// Payload stored with the point.
    pub payload: HashMap<String, JsonValue>,
}

/// Health of a vector store collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// Collection exists and is queryable.
    Ready,
    /// Collection exists but is still indexing.
    Optimizing,
    /// Collection is missing or unusable.
    Unavailable,
}

/// Metadata about a vector store collection.
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    /// Collection health.
    pub status: CollectionStatus,
    /// Number of stored points.
    pub point_count: usize,
}

/// External nearest-neighbor store (Qdrant in production).
///
/// The store provides its own concurrency safety; the pipeline only ever
/// issues reads during a query.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Idempotently upsert points into a collection.
    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<()>;

    /// Nearest-neighbor search, best first.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>>;

    /// Collection health and size.
    async fn collection_info(&self, collection: &str) -> Result<CollectionInfo>;
}

/// Pretrained token-level encoder backing the late-interaction index.
///
/// Loading such a model is expected to fail in constrained environments
/// (missing weights, missing accelerator); construction sites must map
/// that failure to an unavailable index, never a panic.
#[async_trait]
pub trait LateInteractionModel: Send + Sync {
    /// Model identifier (e.g. `colbert-ir/colbertv2.0`).
    fn model(&self) -> &str;

    /// Encode a text into one vector per token.
    async fn encode(&self, text: &str) -> Result<Vec<Vec<f32>>>;
}
