//! Dense (embedding similarity) retrieval.
//!
//! Thin orchestration over two external collaborators: the embedding
//! provider turns the query into a vector, the vector store answers the
//! nearest-neighbor question. Both calls can fail; this retriever
//! contains every failure as "no dense signal for this query" and never
//! raises to its caller.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::traits::{CollectionStatus, EmbeddingProvider, SearchHit, VectorPoint, VectorStore};
use crate::types::{Candidate, RetrievedChunk};

/// Dense retriever over an external vector store.
pub struct DenseRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl DenseRetriever {
    /// Create a retriever over the given collection.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            store,
            collection: collection.into(),
        }
    }

    /// The collection this retriever queries.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Embed and upsert candidates into the vector store.
    ///
    /// Upsert is idempotent by `chunk_id`, so re-ingesting a corpus
    /// version replaces points in place. Errors propagate: ingestion is
    /// an offline path where the caller wants to know about failure.
    pub async fn index(&self, documents: &[Candidate]) -> crate::error::Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;

        let points: Vec<VectorPoint> = documents
            .iter()
            .zip(vectors)
            .map(|(doc, vector)| {
                let mut payload: HashMap<String, JsonValue> = HashMap::new();
                payload.insert("content".to_string(), JsonValue::String(doc.content.clone()));
                payload.insert(
                    "metadata".to_string(),
                    serde_json::to_value(&doc.metadata).unwrap_or(JsonValue::Null),
                );
                VectorPoint {
                    id: doc.chunk_id.clone(),
                    vector,
                    payload,
                }
            })
            .collect();

        self.store.upsert(&self.collection, points).await
    }

    /// Whether the collection is ready to answer queries.
    pub async fn is_ready(&self) -> bool {
        match self.store.collection_info(&self.collection).await {
            Ok(info) => info.status == CollectionStatus::Ready && info.point_count > 0,
            Err(err) => {
                warn!(error = %err, collection = %self.collection, "collection probe failed");
                false
            }
        }
    }

    /// Nearest-neighbor search for a query.
    ///
    /// Any failure (embedding error, store unreachable) logs and returns
    /// an empty list.
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<RetrievedChunk> {
        if top_k == 0 {
            return Vec::new();
        }

        let vector = match self.embedder.embed(query).await {
            Ok(vector) => vector,
            Err(err) => {
                warn!(error = %err, "query embedding failed, dropping dense signal");
                return Vec::new();
            }
        };

        let hits = match self.store.search(&self.collection, &vector, top_k).await {
            Ok(hits) => hits,
            Err(err) => {
                warn!(error = %err, collection = %self.collection, "vector search failed");
                return Vec::new();
            }
        };

        debug!(results = hits.len(), "dense search complete");
        hits.into_iter().map(hit_to_chunk).collect()
    }
}

fn hit_to_chunk(hit: SearchHit) -> RetrievedChunk {
    let content = hit
        .payload
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let metadata: HashMap<String, JsonValue> = hit
        .payload
        .get("metadata")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();

    RetrievedChunk {
        candidate: Candidate {
            chunk_id: hit.id,
            content,
            metadata,
        },
        score: hit.score,
    }
}
