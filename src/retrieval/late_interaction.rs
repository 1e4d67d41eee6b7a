//! Late-interaction (token-level) index.
//!
//! ColBERT-style retrieval: the external model encodes every document
//! into one vector per token; at query time the query is encoded the same
//! way and scored against each document with MaxSim.
//!
//! ```ascii
//! MaxSim(Q, D) = Σ_{q ∈ Q} max_{d ∈ D} (q · d)
//! ```
//!
//! This signal is strictly optional: if the model never loaded, or the
//! index build failed, search returns an empty list and the fusion step
//! simply has one signal fewer. Nothing here ever raises past the index.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::traits::LateInteractionModel;
use crate::types::{Candidate, RetrievedChunk};

/// Immutable token-level index over one corpus version.
struct BuiltTokenIndex {
    candidates: Vec<Candidate>,
    /// One entry per document: one normalized vector per token.
    doc_tokens: Vec<Vec<Vec<f32>>>,
}

fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum()
}

/// Token-level retriever backed by an external pretrained encoder.
///
/// Constructed [`unavailable`](Self::unavailable) when the model could
/// not be loaded; every operation then degrades to a no-op.
pub struct LateInteractionIndex {
    model: Option<Arc<dyn LateInteractionModel>>,
    inner: RwLock<Option<Arc<BuiltTokenIndex>>>,
}

impl LateInteractionIndex {
    /// Create an index backed by a loaded token encoder.
    pub fn with_model(model: Arc<dyn LateInteractionModel>) -> Self {
        Self {
            model: Some(model),
            inner: RwLock::new(None),
        }
    }

    /// Create a permanently degraded index (model failed to load).
    pub fn unavailable() -> Self {
        Self {
            model: None,
            inner: RwLock::new(None),
        }
    }

    /// Whether the underlying encoder is available.
    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    /// Whether a corpus has been successfully indexed.
    pub async fn is_indexed(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Encode and index a corpus version.
    ///
    /// On any encoding failure the previous index is kept and this
    /// corpus version is marked not indexed for this retriever; callers
    /// see that only as an absent signal.
    pub async fn index(&self, documents: &[Candidate]) {
        let Some(model) = &self.model else {
            warn!("late-interaction model unavailable, skipping indexing");
            return;
        };

        let mut doc_tokens = Vec::with_capacity(documents.len());
        for doc in documents {
            match model.encode(&doc.content).await {
                Ok(mut tokens) => {
                    for token in tokens.iter_mut() {
                        normalize(token);
                    }
                    doc_tokens.push(tokens);
                }
                Err(err) => {
                    warn!(
                        chunk_id = %doc.chunk_id,
                        error = %err,
                        "late-interaction encoding failed, keeping previous index"
                    );
                    return;
                }
            }
        }

        let built = BuiltTokenIndex {
            candidates: documents.to_vec(),
            doc_tokens,
        };
        info!(
            documents = documents.len(),
            model = model.model(),
            "late-interaction index built"
        );
        *self.inner.write().await = Some(Arc::new(built));
    }

    /// MaxSim search over the indexed corpus.
    ///
    /// Empty when the model is unavailable, the corpus is not indexed,
    /// or query encoding fails.
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<RetrievedChunk> {
        let Some(model) = &self.model else {
            return Vec::new();
        };
        let Some(index) = self.inner.read().await.clone() else {
            debug!("late-interaction index not built, returning no results");
            return Vec::new();
        };
        if top_k == 0 {
            return Vec::new();
        }

        let mut query_tokens = match model.encode(query).await {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!(error = %err, "query encoding failed, dropping late-interaction signal");
                return Vec::new();
            }
        };
        if query_tokens.is_empty() {
            return Vec::new();
        }
        for token in query_tokens.iter_mut() {
            normalize(token);
        }

        let mut scored: Vec<(usize, f64)> = index
            .doc_tokens
            .iter()
            .enumerate()
            .map(|(doc_idx, tokens)| {
                let maxsim: f64 = query_tokens
                    .iter()
                    .map(|q| {
                        tokens
                            .iter()
                            .map(|d| dot(q, d))
                            .fold(f64::MIN, f64::max)
                            .max(0.0)
                    })
                    .sum();
                (doc_idx, maxsim)
            })
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(top_k);

        debug!(results = scored.len(), "late-interaction search complete");
        scored
            .into_iter()
            .map(|(doc_idx, score)| RetrievedChunk {
                candidate: index.candidates[doc_idx].clone(),
                score,
            })
            .collect()
    }
}
