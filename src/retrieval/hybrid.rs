//! Hybrid retrieval orchestrator.
//!
//! Runs the three retrievers concurrently over one query, fuses their
//! ranked lists with RRF, and returns the top of the fused ranking.
//!
//! ```ascii
//!                    ┌─► dense (embeddings) ──┐
//!  query ── fan-out ─┼─► BM25 (lexical)     ──┼─► RRF fuse ─► top-k
//!                    └─► late-interaction   ──┘
//! ```
//!
//! Each retriever call runs under its own deadline; a timeout or failure
//! removes that signal for this query only. The pipeline answers from
//! whatever signals remain, down to none (empty result, never an error).

use std::sync::Arc;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::RetrievalConfig;
use crate::retrieval::bm25::Bm25Index;
use crate::retrieval::dense::DenseRetriever;
use crate::retrieval::late_interaction::LateInteractionIndex;
use crate::retrieval::rrf::RrfFusion;
use crate::types::{Candidate, FusedResult, RetrievedChunk};

/// Per-query retriever toggles. All enabled by default.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Query the dense (embedding) retriever.
    pub use_dense: bool,
    /// Query the BM25 lexical index.
    pub use_bm25: bool,
    /// Query the late-interaction index.
    pub use_colbert: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            use_dense: true,
            use_bm25: true,
            use_colbert: true,
        }
    }
}

impl SearchOptions {
    /// Enable every retriever.
    pub fn all() -> Self {
        Self::default()
    }

    /// Lexical-only search (no embedding or encoder calls).
    pub fn lexical_only() -> Self {
        Self {
            use_dense: false,
            use_bm25: true,
            use_colbert: false,
        }
    }
}

/// Multi-signal retriever: dense + BM25 + late-interaction, RRF-fused.
///
/// The dense retriever is optional at construction (its embedding
/// provider or vector store may not be reachable); the late-interaction
/// index carries its own availability. BM25 is local and always present.
pub struct HybridRetriever {
    config: RetrievalConfig,
    dense: Option<Arc<DenseRetriever>>,
    bm25: Arc<Bm25Index>,
    colbert: Arc<LateInteractionIndex>,
    fusion: RrfFusion,
}

impl HybridRetriever {
    /// Create a retriever with only the local BM25 signal wired up.
    pub fn new(config: RetrievalConfig) -> Self {
        let fusion = RrfFusion::with_k(config.rrf_k, config.weights);
        Self {
            config,
            dense: None,
            bm25: Arc::new(Bm25Index::new()),
            colbert: Arc::new(LateInteractionIndex::unavailable()),
            fusion,
        }
    }

    /// Attach a dense retriever.
    pub fn with_dense(mut self, dense: Arc<DenseRetriever>) -> Self {
        self.dense = Some(dense);
        self
    }

    /// Replace the BM25 index (for custom tokenizer or parameters).
    pub fn with_bm25(mut self, bm25: Arc<Bm25Index>) -> Self {
        self.bm25 = bm25;
        self
    }

    /// Attach a late-interaction index.
    pub fn with_late_interaction(mut self, colbert: Arc<LateInteractionIndex>) -> Self {
        self.colbert = colbert;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Index a corpus version across every available retriever.
    ///
    /// BM25 and late-interaction indexing are local and cannot fail the
    /// call; dense indexing talks to external services and propagates
    /// its errors, since ingestion callers need to know.
    pub async fn index_documents(&self, documents: &[Candidate]) -> crate::error::Result<()> {
        self.bm25.index(documents).await;
        self.colbert.index(documents).await;
        if let Some(dense) = &self.dense {
            dense.index(documents).await?;
        }
        info!(documents = documents.len(), "corpus indexed");
        Ok(())
    }

    /// Retrieve the fused top `top_k` chunks for a query.
    ///
    /// A blank query or `top_k == 0` short-circuits to an empty result
    /// without touching any retriever.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        options: SearchOptions,
    ) -> Vec<FusedResult> {
        let query = query.trim();
        if query.is_empty() || top_k == 0 {
            return Vec::new();
        }

        // Over-fetch per retriever so fusion can promote chunks ranked
        // well by only one signal.
        let fetch = top_k.saturating_mul(self.config.candidate_multiplier).max(top_k);
        let deadline = self.config.retriever_timeout;

        let dense_fut = async {
            match (&self.dense, options.use_dense) {
                (Some(dense), true) => {
                    bounded(deadline, "dense", dense.search(query, fetch)).await
                }
                _ => Vec::new(),
            }
        };
        let bm25_fut = async {
            if options.use_bm25 {
                bounded(deadline, "bm25", self.bm25.search(query, fetch)).await
            } else {
                Vec::new()
            }
        };
        let colbert_fut = async {
            if options.use_colbert {
                bounded(deadline, "late-interaction", self.colbert.search(query, fetch)).await
            } else {
                Vec::new()
            }
        };

        let (dense, bm25, colbert) = futures::join!(dense_fut, bm25_fut, colbert_fut);
        debug!(
            dense = dense.len(),
            bm25 = bm25.len(),
            colbert = colbert.len(),
            "retriever fan-out complete"
        );

        let mut fused = self.fusion.fuse(&dense, &bm25, &colbert);
        fused.truncate(top_k);
        fused
    }
}

async fn bounded<F>(deadline: std::time::Duration, name: &str, fut: F) -> Vec<RetrievedChunk>
where
    F: std::future::Future<Output = Vec<RetrievedChunk>>,
{
    match timeout(deadline, fut).await {
        Ok(results) => results,
        Err(_) => {
            warn!(retriever = name, timeout_ms = deadline.as_millis() as u64, "retriever deadline exceeded, dropping signal");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::mock::{MemoryVectorStore, MockEmbedder, MockTokenEncoder};
    use crate::traits::LateInteractionModel;
    use async_trait::async_trait;
    use std::time::Duration;

    struct SlowEncoder;

    #[async_trait]
    impl LateInteractionModel for SlowEncoder {
        fn model(&self) -> &str {
            "slow"
        }

        async fn encode(&self, text: &str) -> Result<Vec<Vec<f32>>> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            MockTokenEncoder::new(32).encode(text).await
        }
    }

    fn corpus() -> Vec<Candidate> {
        vec![
            Candidate::with_id("doc1", "patient blood pressure elevated hypertension"),
            Candidate::with_id("doc2", "heart rate 88 bpm within normal range"),
            Candidate::with_id("doc3", "glucose level 142 after fasting"),
            Candidate::with_id("doc4", "sunny weather clear skies forecast"),
        ]
    }

    fn full_retriever() -> HybridRetriever {
        HybridRetriever::new(RetrievalConfig::default())
            .with_dense(Arc::new(DenseRetriever::new(
                Arc::new(MockEmbedder::new(128)),
                Arc::new(MemoryVectorStore::new()),
                "test_docs",
            )))
            .with_late_interaction(Arc::new(LateInteractionIndex::with_model(Arc::new(
                MockTokenEncoder::new(64),
            ))))
    }

    #[tokio::test]
    async fn test_all_signals_fuse() {
        let retriever = full_retriever();
        retriever.index_documents(&corpus()).await.unwrap();

        let results = retriever
            .search("patient blood pressure", 3, SearchOptions::all())
            .await;
        assert!(!results.is_empty());
        assert_eq!(results[0].chunk_id, "doc1");
        // doc1 is surfaced by every retriever.
        assert_eq!(results[0].signal_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_query_short_circuits() {
        let retriever = full_retriever();
        retriever.index_documents(&corpus()).await.unwrap();

        assert!(retriever.search("   ", 5, SearchOptions::all()).await.is_empty());
        assert!(retriever.search("blood", 0, SearchOptions::all()).await.is_empty());
    }

    #[tokio::test]
    async fn test_top_k_bounds_output() {
        let retriever = full_retriever();
        retriever.index_documents(&corpus()).await.unwrap();

        let results = retriever
            .search("patient heart glucose weather", 2, SearchOptions::all())
            .await;
        assert!(results.len() <= 2);
    }

    #[tokio::test]
    async fn test_bm25_only_when_others_absent() {
        // No dense retriever, no late-interaction model.
        let retriever = HybridRetriever::new(RetrievalConfig::default());
        retriever.index_documents(&corpus()).await.unwrap();

        let results = retriever
            .search("blood pressure", 3, SearchOptions::all())
            .await;
        assert!(!results.is_empty());
        assert_eq!(results[0].chunk_id, "doc1");
        assert_eq!(results[0].signal_count(), 1);
        assert!(results[0].bm25_rank.is_some());
    }

    #[tokio::test]
    async fn test_options_disable_signals() {
        let retriever = full_retriever();
        retriever.index_documents(&corpus()).await.unwrap();

        let results = retriever
            .search("blood pressure", 3, SearchOptions::lexical_only())
            .await;
        assert!(!results.is_empty());
        for fused in &results {
            assert!(fused.dense_rank.is_none());
            assert!(fused.colbert_rank.is_none());
        }
    }

    #[tokio::test]
    async fn test_slow_retriever_times_out() {
        let config = RetrievalConfig::default()
            .with_retriever_timeout(Duration::from_millis(20));
        let retriever = HybridRetriever::new(config).with_late_interaction(Arc::new(
            LateInteractionIndex::with_model(Arc::new(SlowEncoder)),
        ));
        // BM25 indexes instantly; the slow encoder would block indexing,
        // so index BM25 directly.
        retriever.bm25.index(&corpus()).await;

        let results = retriever
            .search("blood pressure", 3, SearchOptions::all())
            .await;
        // BM25 answered within the deadline; the slow signal was dropped.
        assert!(!results.is_empty());
        assert!(results.iter().all(|f| f.colbert_rank.is_none()));
    }

    #[tokio::test]
    async fn test_nothing_indexed_returns_empty() {
        let retriever = full_retriever();
        let results = retriever
            .search("blood pressure", 3, SearchOptions::all())
            .await;
        assert!(results.is_empty());
    }
}
