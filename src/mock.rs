//! Deterministic in-process collaborators for testing and development.
//!
//! No network, no model weights: embeddings are hashed bag-of-words
//! projections, the vector store is an in-memory cosine index, and the
//! relevance model scores by term overlap. Deterministic by construction,
//! so tests can assert exact orderings.
//!
//! # Example
//!
//! ```ignore
//! use healthsecure_retrieval::mock::{MemoryVectorStore, MockEmbedder};
//!
//! let embedder = MockEmbedder::new(64);
//! let store = MemoryVectorStore::new();
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Result, RetrievalError};
use crate::reranker::RelevanceModel;
use crate::traits::{
    CollectionInfo, CollectionStatus, EmbeddingProvider, LateInteractionModel, SearchHit,
    VectorPoint, VectorStore,
};

fn hash_token(token: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    hasher.finish()
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Deterministic embedder projecting lowercased tokens into a hashed
/// bag-of-words vector.
///
/// Texts sharing tokens get similar vectors, so cosine ranking behaves
/// like a (crude) semantic signal in tests.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    /// Create an embedder with the given output dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(128)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text.to_lowercase().split_whitespace() {
            let slot = (hash_token(token) as usize) % self.dimension;
            vector[slot] += 1.0;
        }
        Ok(vector)
    }
}

/// Embedder that always fails; exercises dense-retrieval degradation.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn name(&self) -> &str {
        "failing-embedder"
    }

    fn dimension(&self) -> usize {
        0
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RetrievalError::Network("embedder offline".to_string()))
    }
}

/// In-memory cosine-similarity vector store.
///
/// Supports idempotent upsert by id and exhaustive nearest-neighbor
/// search; good for tests and small corpora.
#[derive(Default)]
pub struct MemoryVectorStore {
    collections: RwLock<HashMap<String, HashMap<String, VectorPoint>>>,
}

impl MemoryVectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<()> {
        let mut collections = self.collections.write().await;
        let entry = collections.entry(collection.to_string()).or_default();
        for point in points {
            entry.insert(point.id.clone(), point);
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        let collections = self.collections.read().await;
        let Some(points) = collections.get(collection) else {
            return Err(RetrievalError::Api(format!(
                "collection not found: {}",
                collection
            )));
        };

        let mut hits: Vec<SearchHit> = points
            .values()
            .map(|p| SearchHit {
                id: p.id.clone(),
                score: cosine(vector, &p.vector),
                payload: p.payload.clone(),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn collection_info(&self, collection: &str) -> Result<CollectionInfo> {
        let collections = self.collections.read().await;
        match collections.get(collection) {
            Some(points) => Ok(CollectionInfo {
                status: CollectionStatus::Ready,
                point_count: points.len(),
            }),
            None => Ok(CollectionInfo {
                status: CollectionStatus::Unavailable,
                point_count: 0,
            }),
        }
    }
}

/// Token encoder producing one hashed one-hot-style vector per token.
///
/// MaxSim over these vectors reduces to token overlap, which is exactly
/// the behavior late-interaction tests want to observe.
pub struct MockTokenEncoder {
    dimension: usize,
}

impl MockTokenEncoder {
    /// Create an encoder with the given per-token dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Default for MockTokenEncoder {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl LateInteractionModel for MockTokenEncoder {
    fn model(&self) -> &str {
        "mock-token-encoder"
    }

    async fn encode(&self, text: &str) -> Result<Vec<Vec<f32>>> {
        let vectors: Vec<Vec<f32>> = text
            .to_lowercase()
            .split_whitespace()
            .map(|token| {
                let mut v = vec![0.0f32; self.dimension];
                v[(hash_token(token) as usize) % self.dimension] = 1.0;
                v
            })
            .collect();
        Ok(vectors)
    }
}

/// Relevance model scoring by query-term overlap.
///
/// Stands in for a real cross-encoder in tests: passages sharing more
/// query terms score higher, deterministically.
pub struct MockRelevanceModel {
    name: String,
}

impl MockRelevanceModel {
    /// Create a mock model with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for MockRelevanceModel {
    fn default() -> Self {
        Self::new("mock-relevance")
    }
}

#[async_trait]
impl RelevanceModel for MockRelevanceModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "term-overlap"
    }

    async fn score_batch(&self, query: &str, passages: &[String]) -> Result<Vec<f64>> {
        let query_lower = query.to_lowercase();
        let query_terms: std::collections::HashSet<&str> =
            query_lower.split_whitespace().collect();
        let scores = passages
            .iter()
            .map(|passage| {
                let passage_lower = passage.to_lowercase();
                let passage_terms: std::collections::HashSet<&str> =
                    passage_lower.split_whitespace().collect();
                let overlap = query_terms.intersection(&passage_terms).count();
                overlap as f64 / query_terms.len().max(1) as f64
            })
            .collect();
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embedder_deterministic() {
        let embedder = MockEmbedder::new(32);
        let a = embedder.embed("blood pressure reading").await.unwrap();
        let b = embedder.embed("blood pressure reading").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[tokio::test]
    async fn test_mock_embedder_similarity_orders_by_overlap() {
        let embedder = MockEmbedder::new(64);
        let query = embedder.embed("blood pressure").await.unwrap();
        let close = embedder.embed("blood pressure reading").await.unwrap();
        let far = embedder.embed("sunny weather forecast").await.unwrap();
        assert!(cosine(&query, &close) > cosine(&query, &far));
    }

    #[tokio::test]
    async fn test_memory_store_upsert_idempotent() {
        let store = MemoryVectorStore::new();
        let point = VectorPoint {
            id: "doc1".to_string(),
            vector: vec![1.0, 0.0],
            payload: HashMap::new(),
        };
        store.upsert("c", vec![point.clone()]).await.unwrap();
        store.upsert("c", vec![point]).await.unwrap();

        let info = store.collection_info("c").await.unwrap();
        assert_eq!(info.point_count, 1);
        assert_eq!(info.status, CollectionStatus::Ready);
    }

    #[tokio::test]
    async fn test_memory_store_search_orders_by_cosine() {
        let store = MemoryVectorStore::new();
        store
            .upsert(
                "c",
                vec![
                    VectorPoint {
                        id: "aligned".to_string(),
                        vector: vec![1.0, 0.0],
                        payload: HashMap::new(),
                    },
                    VectorPoint {
                        id: "orthogonal".to_string(),
                        vector: vec![0.0, 1.0],
                        payload: HashMap::new(),
                    },
                ],
            )
            .await
            .unwrap();

        let hits = store.search("c", &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits[0].id, "aligned");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_memory_store_missing_collection() {
        let store = MemoryVectorStore::new();
        assert!(store.search("missing", &[1.0], 5).await.is_err());
        let info = store.collection_info("missing").await.unwrap();
        assert_eq!(info.status, CollectionStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_mock_relevance_model_scores_overlap() {
        let model = MockRelevanceModel::default();
        let scores = model
            .score_batch(
                "blood pressure",
                &[
                    "blood pressure is elevated".to_string(),
                    "clear skies today".to_string(),
                ],
            )
            .await
            .unwrap();
        assert!(scores[0] > scores[1]);
        assert_eq!(scores.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_token_encoder_one_vector_per_token() {
        let encoder = MockTokenEncoder::new(16);
        let vectors = encoder.encode("heart rate 88").await.unwrap();
        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v.len() == 16));
    }
}
