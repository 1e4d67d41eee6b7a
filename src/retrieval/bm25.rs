//! BM25 lexical index.
//!
//! Industry-standard BM25 ranking with the BM25+ extension, built as an
//! in-memory inverted index over the corpus.
//!
//! # Why BM25?
//!
//! BM25 is the ranking function behind Elasticsearch and Lucene. In this
//! pipeline it is the exact-match counterweight to dense retrieval:
//!
//! - **IDF weighting**: rare clinical terms ("mmHg") outrank common ones
//! - **Term frequency saturation**: diminishing returns for repeats
//! - **Length normalization**: long notes don't drown short focused ones
//!
//! # Algorithm
//!
//! ```ascii
//! score = Σ IDF(q) × (f(q,D)×(k1+1) / (f(q,D) + k1×(1-b+b×|D|/avgdl)) + delta)
//!
//! IDF(q) = ln((N - df(q) + 0.5) / (df(q) + 0.5) + 1)
//! ```
//!
//! # Concurrency
//!
//! The built index is immutable; rebuilds construct a fresh index off to
//! the side and swap it in under a write lock, so concurrent queries see
//! either the old or the new corpus, never a partially built one.
//!
//! # References
//!
//! - Robertson, S., Zaragoza, H. (2009). The Probabilistic Relevance Framework
//! - Lv, Y., Zhai, C. (2011). Lower-Bounding Term Frequency Normalization (BM25+)

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rust_stemmers::{Algorithm, Stemmer};
use tokio::sync::RwLock;
use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;

use crate::types::{Candidate, RetrievedChunk};

/// BM25 scoring parameters.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    /// Term frequency saturation. Higher = more TF weight.
    pub k1: f64,
    /// Length normalization. 0 = none, 1 = full.
    pub b: f64,
    /// BM25+ lower bound for long document handling.
    pub delta: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            delta: 0.0,
        }
    }
}

impl Bm25Params {
    /// Parameters tuned for RAG over chunked medical notes.
    pub fn for_rag() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            delta: 0.5,
        }
    }

    /// Custom parameters, clamped to sane ranges.
    pub fn new(k1: f64, b: f64, delta: f64) -> Self {
        Self {
            k1: k1.clamp(0.0, 3.0),
            b: b.clamp(0.0, 1.0),
            delta: delta.max(0.0),
        }
    }
}

/// Tokenizer configuration for the lexical index.
#[derive(Debug, Clone)]
pub struct TokenizerConfig {
    /// Enable Porter2 stemming.
    pub enable_stemming: bool,
    /// Stemmer algorithm.
    pub stemmer_algorithm: Algorithm,
    /// Filter common stop words.
    pub enable_stop_words: bool,
    /// Fold accents and split on non-alphanumeric characters instead of
    /// plain whitespace.
    pub fold_unicode: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self::minimal()
    }
}

impl TokenizerConfig {
    /// Lowercased whitespace tokens, nothing else. Keeps compound values
    /// such as `145/92` intact, which matters for clinical text.
    pub fn minimal() -> Self {
        Self {
            enable_stemming: false,
            stemmer_algorithm: Algorithm::English,
            enable_stop_words: false,
            fold_unicode: false,
        }
    }

    /// Accent folding, stop-word removal and Porter2 stemming.
    pub fn enhanced() -> Self {
        Self {
            enable_stemming: true,
            stemmer_algorithm: Algorithm::English,
            enable_stop_words: true,
            fold_unicode: true,
        }
    }
}

/// Common English stop words. Sorted for binary search.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "all", "also", "an", "and", "are", "as", "at", "be", "been", "but", "by", "can", "could",
    "did", "do", "does", "for", "from", "had", "has", "have", "he", "if", "in", "is", "it", "its",
    "just", "may", "might", "must", "no", "not", "of", "on", "or", "our", "out", "should", "so",
    "than", "that", "the", "their", "then", "there", "they", "this", "to", "too", "up", "very",
    "was", "we", "were", "what", "when", "where", "which", "who", "will", "with", "would", "you",
    "your",
];

fn is_stop_word(word: &str) -> bool {
    ENGLISH_STOP_WORDS.binary_search(&word).is_ok()
}

/// Posting list entry: (document index, term frequency).
type Posting = (usize, usize);

/// Immutable, fully built index over one corpus version.
struct BuiltIndex {
    candidates: Vec<Candidate>,
    doc_lengths: Vec<usize>,
    postings: HashMap<String, Vec<Posting>>,
    avgdl: f64,
}

/// In-memory BM25 index over the corpus.
///
/// `search` on an index that has never been built returns an empty list,
/// not an error; callers treat empty as "lexical signal unavailable".
pub struct Bm25Index {
    params: Bm25Params,
    tokenizer: TokenizerConfig,
    inner: RwLock<Option<Arc<BuiltIndex>>>,
}

impl Bm25Index {
    /// Create an empty index with default parameters.
    pub fn new() -> Self {
        Self::with_params(Bm25Params::default(), TokenizerConfig::minimal())
    }

    /// Create an empty index with explicit parameters.
    pub fn with_params(params: Bm25Params, tokenizer: TokenizerConfig) -> Self {
        Self {
            params,
            tokenizer,
            inner: RwLock::new(None),
        }
    }

    /// Tokenize according to the configured settings.
    fn tokenize(&self, text: &str) -> Vec<String> {
        let tokens: Vec<String> = if self.tokenizer.fold_unicode {
            let normalized: String = text
                .to_lowercase()
                .nfkd()
                .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
                .collect();
            normalized
                .split(|c: char| !c.is_alphanumeric())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect()
        } else {
            text.to_lowercase()
                .split_whitespace()
                .map(|s| s.to_string())
                .collect()
        };

        let filtered: Vec<String> = if self.tokenizer.enable_stop_words {
            tokens.into_iter().filter(|t| !is_stop_word(t)).collect()
        } else {
            tokens
        };

        if self.tokenizer.enable_stemming {
            let stemmer = Stemmer::create(self.tokenizer.stemmer_algorithm);
            filtered
                .into_iter()
                .map(|t| stemmer.stem(&t).to_string())
                .collect()
        } else {
            filtered
        }
    }

    /// Build the index over a corpus version, replacing any previous one.
    ///
    /// Queries running concurrently keep reading the old index until the
    /// swap completes.
    pub async fn index(&self, documents: &[Candidate]) {
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut doc_lengths = Vec::with_capacity(documents.len());

        for (doc_idx, doc) in documents.iter().enumerate() {
            let terms = self.tokenize(&doc.content);
            doc_lengths.push(terms.len());

            let mut tf: HashMap<&str, usize> = HashMap::new();
            for term in &terms {
                *tf.entry(term.as_str()).or_insert(0) += 1;
            }
            for (term, count) in tf {
                postings
                    .entry(term.to_string())
                    .or_default()
                    .push((doc_idx, count));
            }
        }

        let avgdl = (doc_lengths.iter().sum::<usize>() as f64
            / doc_lengths.len().max(1) as f64)
            .max(1.0);

        let built = BuiltIndex {
            candidates: documents.to_vec(),
            doc_lengths,
            postings,
            avgdl,
        };

        info!(documents = documents.len(), "BM25 index built");
        *self.inner.write().await = Some(Arc::new(built));
    }

    /// Whether a corpus has been indexed.
    pub async fn is_indexed(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Search the index.
    ///
    /// Returns only documents with strictly positive scores, best first;
    /// ties keep original corpus order. Empty if the index has not been
    /// built.
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<RetrievedChunk> {
        let Some(index) = self.inner.read().await.clone() else {
            debug!("BM25 index not built, returning no lexical results");
            return Vec::new();
        };

        let query_terms = self.tokenize(query);
        if query_terms.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let n = index.candidates.len() as f64;
        let mut scores: HashMap<usize, f64> = HashMap::new();

        // Dedup query terms so a repeated term is not double counted.
        let unique_terms: HashSet<&String> = query_terms.iter().collect();
        for term in unique_terms {
            let Some(posting_list) = index.postings.get(term.as_str()) else {
                continue;
            };
            let df = posting_list.len() as f64;
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

            for &(doc_idx, tf) in posting_list {
                let doc_len = index.doc_lengths[doc_idx] as f64;
                let length_norm =
                    1.0 - self.params.b + self.params.b * (doc_len / index.avgdl);
                let tf = tf as f64;
                let tf_component =
                    (tf * (self.params.k1 + 1.0)) / (tf + self.params.k1 * length_norm);
                *scores.entry(doc_idx).or_insert(0.0) +=
                    idf * (tf_component + self.params.delta);
            }
        }

        let mut ranked: Vec<(usize, f64)> = scores
            .into_iter()
            .filter(|(_, score)| *score > 0.0)
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(top_k);

        debug!(results = ranked.len(), "BM25 search complete");
        ranked
            .into_iter()
            .map(|(doc_idx, score)| RetrievedChunk {
                candidate: index.candidates[doc_idx].clone(),
                score,
            })
            .collect()
    }
}

impl Default for Bm25Index {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Candidate> {
        vec![
            Candidate::with_id("doc1", "Patient blood pressure BP is 145/92 mmHg, elevated."),
            Candidate::with_id("doc2", "Heart rate measured at 88 beats per minute bpm."),
            Candidate::with_id("doc3", "Blood pressure reading shows systolic 145 diastolic 92."),
            Candidate::with_id("doc4", "The weather is sunny today with clear skies."),
        ]
    }

    #[tokio::test]
    async fn test_unindexed_returns_empty() {
        let index = Bm25Index::new();
        assert!(!index.is_indexed().await);
        assert!(index.search("blood pressure", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_keyword_match_ranks_first() {
        let index = Bm25Index::new();
        index.index(&corpus()).await;

        let results = index.search("blood pressure reading", 4).await;
        assert!(!results.is_empty());
        assert_eq!(results[0].candidate.chunk_id, "doc3");
        assert!(results
            .iter()
            .all(|r| r.candidate.chunk_id != "doc4" || r.score > 0.0));
    }

    #[tokio::test]
    async fn test_only_positive_scores_returned() {
        let index = Bm25Index::new();
        index.index(&corpus()).await;

        let results = index.search("glucose", 10).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_rare_term_idf_dominates() {
        let index = Bm25Index::new();
        index.index(&corpus()).await;

        // "mmhg" appears in exactly one document.
        let results = index.search("mmhg", 4).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].candidate.chunk_id, "doc1");
    }

    #[tokio::test]
    async fn test_compound_token_preserved_by_minimal_tokenizer() {
        let index = Bm25Index::new();
        index.index(&corpus()).await;

        let results = index.search("145/92", 4).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].candidate.chunk_id, "doc1");
    }

    #[tokio::test]
    async fn test_top_k_truncation() {
        let index = Bm25Index::new();
        index.index(&corpus()).await;

        let results = index.search("blood pressure is", 1).await;
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_query_returns_empty() {
        let index = Bm25Index::new();
        index.index(&corpus()).await;
        assert!(index.search("", 5).await.is_empty());
        assert!(index.search("   ", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_reindex_replaces_corpus() {
        let index = Bm25Index::new();
        index.index(&corpus()).await;
        assert!(!index.search("blood", 5).await.is_empty());

        index
            .index(&[Candidate::with_id("only", "glucose level 142 mg/dL")])
            .await;
        assert!(index.search("blood", 5).await.is_empty());
        assert_eq!(index.search("glucose", 5).await.len(), 1);
    }

    #[tokio::test]
    async fn test_enhanced_tokenizer_stems_and_folds() {
        let index = Bm25Index::with_params(Bm25Params::default(), TokenizerConfig::enhanced());
        index
            .index(&[
                Candidate::with_id("fr", "Le véhicule électrique est l'avenir."),
                Candidate::with_id("en", "Classic cars run on petrol."),
            ])
            .await;

        let results = index.search("vehicule electrique", 2).await;
        assert_eq!(results[0].candidate.chunk_id, "fr");
    }

    #[tokio::test]
    async fn test_bm25_plus_delta_raises_scores() {
        let plain = Bm25Index::new();
        let plus = Bm25Index::with_params(
            Bm25Params::new(1.5, 0.75, 1.0),
            TokenizerConfig::minimal(),
        );
        let docs = corpus();
        plain.index(&docs).await;
        plus.index(&docs).await;

        let base = plain.search("blood pressure", 1).await[0].score;
        let boosted = plus.search("blood pressure", 1).await[0].score;
        assert!(boosted > base);
    }

    #[tokio::test]
    async fn test_tie_break_keeps_corpus_order() {
        let index = Bm25Index::new();
        index
            .index(&[
                Candidate::with_id("a", "alpha beta"),
                Candidate::with_id("b", "alpha beta"),
            ])
            .await;

        let results = index.search("alpha", 2).await;
        assert_eq!(results[0].candidate.chunk_id, "a");
        assert_eq!(results[1].candidate.chunk_id, "b");
    }

    #[test]
    fn test_stop_words_sorted_for_binary_search() {
        let mut sorted = ENGLISH_STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, ENGLISH_STOP_WORDS);
        assert!(is_stop_word("the"));
        assert!(!is_stop_word("glucose"));
    }
}
