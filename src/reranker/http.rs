//! HTTP-backed relevance model.
//!
//! The three model profiles (fast, accurate, cross-encoder) all run
//! behind scoring services speaking the standard rerank wire format, so
//! one client covers every profile.
//!
//! # Wire format
//!
//! ```ascii
//! ┌────────────────────┐    POST     ┌──────────────────┐
//! │ HttpRelevanceModel │ ──────────► │ Scoring service  │
//! └─────────┬──────────┘             └────────┬─────────┘
//!           │ {"model", "query",              │ {"results": [
//!           │  "documents": [...]}           │   {"index": 0,
//!           │                                │    "relevance_score": 0.93}]}
//!           └────────────────────────────────┘
//! ```
//!
//! Responses index into the request's document list; scores are mapped
//! back into input order before returning, per the
//! [`RelevanceModel`] contract.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::RelevanceModelConfig;
use super::traits::{RelevanceModel, ScorerHandle};
use crate::error::{Result, RetrievalError};

#[derive(Serialize)]
struct ScoreRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
}

#[derive(Deserialize)]
struct ScoreResponse {
    #[serde(default)]
    results: Vec<ScoredEntry>,
}

#[derive(Deserialize)]
struct ScoredEntry {
    index: usize,
    relevance_score: f64,
}

/// Relevance model delegating to a remote scoring service.
pub struct HttpRelevanceModel {
    client: Client,
    config: RelevanceModelConfig,
    name: String,
}

impl HttpRelevanceModel {
    /// Build a client for the given endpoint.
    pub fn new(name: impl Into<String>, config: RelevanceModelConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            config,
            name: name.into(),
        })
    }

    /// Build a [`ScorerHandle`] for the given endpoint.
    ///
    /// Construction failure becomes [`ScorerHandle::Unavailable`] instead
    /// of an error, so callers wire up a pipeline unconditionally and the
    /// degradation surfaces only in the handle's state.
    pub fn handle(name: impl Into<String>, config: RelevanceModelConfig) -> ScorerHandle {
        let name = name.into();
        match Self::new(name.clone(), config) {
            Ok(model) => ScorerHandle::available(std::sync::Arc::new(model)),
            Err(err) => {
                warn!(scorer = %name, error = %err, "scoring client construction failed");
                ScorerHandle::unavailable(format!("{name}: {err}"))
            }
        }
    }
}

#[async_trait]
impl RelevanceModel for HttpRelevanceModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn score_batch(&self, query: &str, passages: &[String]) -> Result<Vec<f64>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let payload = ScoreRequest {
            model: &self.config.model,
            query,
            documents: passages,
        };
        debug!(
            scorer = %self.name,
            model = %self.config.model,
            passages = passages.len(),
            "scoring request"
        );

        let mut request = self
            .client
            .post(&self.config.base_url)
            .header("Content-Type", "application/json");
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request.json(&payload).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Api(format!(
                "scoring backend returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: ScoreResponse = response.json().await?;
        if parsed.results.is_empty() {
            return Err(RetrievalError::Api(
                "scoring backend returned no results".to_string(),
            ));
        }

        // Responses may arrive sorted by relevance; map back to input order.
        let mut scores = vec![0.0; passages.len()];
        for entry in parsed.results {
            if entry.index >= passages.len() {
                return Err(RetrievalError::Api(format!(
                    "scoring backend returned out-of-range index {}",
                    entry.index
                )));
            }
            scores[entry.index] = entry.relevance_score;
        }
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_handle_construction_is_infallible() {
        let handle = HttpRelevanceModel::handle("fast", RelevanceModelConfig::fast());
        assert!(handle.is_available());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transient() {
        // Nothing listens here; the failure must classify as transient so
        // the orchestrator absorbs it per query.
        let config = RelevanceModelConfig::fast()
            .with_base_url("http://127.0.0.1:1/rerank")
            .with_timeout(Duration::from_millis(100));
        let model = HttpRelevanceModel::new("fast", config).unwrap();

        let err = model
            .score_batch("blood pressure", &["passage".to_string()])
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_empty_passages_skip_network() {
        let config = RelevanceModelConfig::fast().with_base_url("http://127.0.0.1:1/rerank");
        let model = HttpRelevanceModel::new("fast", config).unwrap();
        let scores = model.score_batch("query", &[]).await.unwrap();
        assert!(scores.is_empty());
    }

    #[test]
    fn test_response_parsing_shape() {
        let parsed: ScoreResponse = serde_json::from_str(
            r#"{"results": [{"index": 1, "relevance_score": 0.93}, {"index": 0, "relevance_score": 0.41}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].index, 1);
        assert!((parsed.results[0].relevance_score - 0.93).abs() < 1e-12);
    }
}
