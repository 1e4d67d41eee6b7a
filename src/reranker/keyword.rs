//! Lexical keyword scorer.
//!
//! Pure, deterministic, and always available: the lexical signal of last
//! resort when every learned model is degraded, and the boost term that
//! corrects learned models misranking irrelevant-but-similar text above
//! relevant-but-dissimilar text.
//!
//! ```ascii
//! score = min( 0.1 * |matched vocabulary phrases|
//!            + 0.5 * |query ∩ content| / max(|query|, 1),  1.0 )
//! ```

use std::collections::HashSet;

/// Clinical vocabulary rewarded when a phrase appears in both the query
/// and the passage.
const MEDICAL_PHRASES: [&str; 16] = [
    "blood pressure",
    "heart rate",
    "temperature",
    "oxygen saturation",
    "glucose",
    "hemoglobin",
    "cholesterol",
    "triglycerides",
    "diagnosis",
    "treatment",
    "medication",
    "prescription",
    "patient",
    "vital signs",
    "lab results",
    "symptoms",
];

/// Phrase-plus-overlap lexical scorer, bounded to [0, 1].
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    phrases: Vec<String>,
}

impl KeywordScorer {
    /// Scorer over the built-in clinical vocabulary.
    pub fn new() -> Self {
        Self::with_vocabulary(MEDICAL_PHRASES.iter().copied())
    }

    /// Scorer over a custom phrase vocabulary.
    pub fn with_vocabulary<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Number of phrases in the vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.phrases.len()
    }

    /// Lexical relevance of `content` to `query`, in [0, 1].
    ///
    /// Each vocabulary phrase present in both strings adds 0.1; the
    /// whitespace-token overlap ratio contributes at weight 0.5; the sum
    /// is capped at 1.0.
    pub fn score(&self, query: &str, content: &str) -> f64 {
        let query_lower = query.to_lowercase();
        let content_lower = content.to_lowercase();

        let phrase_score = self
            .phrases
            .iter()
            .filter(|p| query_lower.contains(p.as_str()) && content_lower.contains(p.as_str()))
            .count() as f64
            * 0.1;

        let query_tokens: HashSet<&str> = query_lower.split_whitespace().collect();
        let content_tokens: HashSet<&str> = content_lower.split_whitespace().collect();
        let overlap = query_tokens.intersection(&content_tokens).count() as f64
            / query_tokens.len().max(1) as f64;

        (phrase_score + 0.5 * overlap).min(1.0)
    }
}

impl Default for KeywordScorer {
    fn default() -> Self {
        Self::new()
    }
}
