//! Knowledge retrieval against an external vector-search collaborator.
//!
//! Distances are assumed to be L2 over **L2-normalized** embedding vectors;
//! the closed-form cosine conversion below is only valid under that
//! precondition. Any substitute embedding backend must preserve it.

use std::{sync::Arc, time::Duration};

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

pub mod http;

/// One raw hit from the vector-search backend, in ascending-distance order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub distance: f32,
}

/// Abstraction over the vector store so backends can be swapped (HTTP
/// service, in-memory stub in tests).
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Return the `top_k` closest knowledge chunks for the query.
    async fn search(&self, query: &str, top_k: usize) -> AnyResult<Vec<SearchHit>>;
}

/// A ranked, confidence-annotated knowledge snippet ready for prompting.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedSnippet {
    pub content: String,
    pub title: String,
    pub source: String,
    pub url: Option<String>,
    pub distance: f32,
    pub confidence_pct: f32,
}

const DEFAULT_TITLE: &str = "reference";
const DEFAULT_SOURCE: &str = "knowledge base";

/// Convert an L2 distance over normalized embeddings into a display
/// confidence percentage. Monotonically non-increasing in distance and
/// always within `[0, 100]`.
pub fn confidence_pct(distance: f32) -> f32 {
    let cosine = 1.0 - (distance * distance) / 2.0;
    cosine.clamp(0.0, 1.0) * 100.0
}

fn score_hit(hit: SearchHit) -> RetrievedSnippet {
    RetrievedSnippet {
        confidence_pct: confidence_pct(hit.distance),
        content: hit.content,
        title: hit.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        source: hit.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
        url: hit.url,
        distance: hit.distance,
    }
}

/// Snippet substituted when the knowledge base cannot be reached, so the
/// rest of the pipeline keeps working with degraded grounding.
pub fn fallback_snippet() -> RetrievedSnippet {
    RetrievedSnippet {
        content: "The dental knowledge base is currently unavailable; this report relies on \
                  the screening data alone. General oral-health guidance still applies: brush \
                  twice daily, floss, and see a dentist for persistent symptoms."
            .to_string(),
        title: "knowledge base notice".to_string(),
        source: "system".to_string(),
        url: None,
        distance: f32::MAX,
        confidence_pct: 0.0,
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub timeout: Duration,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Retrieval front end owning the timeout and degradation policy.
///
/// Backend ranking order is preserved as-is; hits are never re-sorted.
pub struct Retriever<S: VectorSearch + ?Sized> {
    backend: Arc<S>,
    config: RetrievalConfig,
}

impl<S: VectorSearch + ?Sized> Retriever<S> {
    pub fn new(backend: Arc<S>, config: RetrievalConfig) -> Self {
        Self { backend, config }
    }

    /// Fetch and score snippets for the query. Infallible by contract:
    /// backend errors, timeouts, and empty collections all degrade to the
    /// single fallback snippet.
    #[instrument(name = "retrieve_knowledge", skip(self), fields(top_k = self.config.top_k))]
    pub async fn retrieve(&self, query: &str) -> Vec<RetrievedSnippet> {
        let search = self.backend.search(query, self.config.top_k);
        match tokio::time::timeout(self.config.timeout, search).await {
            Ok(Ok(hits)) if !hits.is_empty() => hits.into_iter().map(score_hit).collect(),
            Ok(Ok(_)) => {
                warn!(%query, "knowledge search returned no hits");
                vec![fallback_snippet()]
            }
            Ok(Err(err)) => {
                warn!(%query, error = %err, "knowledge search failed");
                vec![fallback_snippet()]
            }
            Err(_) => {
                warn!(%query, timeout = ?self.config.timeout, "knowledge search timed out");
                vec![fallback_snippet()]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    struct StaticSearch {
        hits: Vec<SearchHit>,
    }

    #[async_trait]
    impl VectorSearch for StaticSearch {
        async fn search(&self, _query: &str, _top_k: usize) -> AnyResult<Vec<SearchHit>> {
            Ok(self.hits.clone())
        }
    }

    struct FailingSearch;

    #[async_trait]
    impl VectorSearch for FailingSearch {
        async fn search(&self, _query: &str, _top_k: usize) -> AnyResult<Vec<SearchHit>> {
            bail!("collection not loaded")
        }
    }

    struct SlowSearch;

    #[async_trait]
    impl VectorSearch for SlowSearch {
        async fn search(&self, _query: &str, _top_k: usize) -> AnyResult<Vec<SearchHit>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
    }

    fn hit(content: &str, distance: f32) -> SearchHit {
        SearchHit {
            content: content.to_string(),
            title: Some(format!("{content} title")),
            source: Some("unit".to_string()),
            url: None,
            distance,
        }
    }

    #[test]
    fn confidence_is_bounded_and_monotonic() {
        assert!((confidence_pct(0.0) - 100.0).abs() < f32::EPSILON);
        let mut last = 100.0_f32;
        for step in 0..40 {
            let pct = confidence_pct(step as f32 * 0.1);
            assert!((0.0..=100.0).contains(&pct));
            assert!(pct <= last);
            last = pct;
        }
        assert!(confidence_pct(2.0).abs() < f32::EPSILON);
        assert!(confidence_pct(10.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn preserves_backend_ranking_order() {
        let backend = Arc::new(StaticSearch {
            hits: vec![hit("first", 0.2), hit("second", 0.6), hit("third", 1.1)],
        });
        let retriever = Retriever::new(backend, RetrievalConfig::default());
        let snippets = retriever.retrieve("tartar").await;
        let contents: Vec<_> = snippets.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert!(snippets[0].confidence_pct > snippets[2].confidence_pct);
    }

    #[tokio::test]
    async fn missing_metadata_gets_placeholders() {
        let backend = Arc::new(StaticSearch {
            hits: vec![SearchHit {
                content: "bare chunk".to_string(),
                title: None,
                source: None,
                url: None,
                distance: 0.4,
            }],
        });
        let retriever = Retriever::new(backend, RetrievalConfig::default());
        let snippets = retriever.retrieve("caries").await;
        assert_eq!(snippets[0].title, DEFAULT_TITLE);
        assert_eq!(snippets[0].source, DEFAULT_SOURCE);
    }

    #[tokio::test]
    async fn backend_error_degrades_to_fallback() {
        let retriever = Retriever::new(Arc::new(FailingSearch), RetrievalConfig::default());
        let snippets = retriever.retrieve("lesion").await;
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].source, "system");
        assert!(snippets[0].content.contains("unavailable"));
    }

    #[tokio::test]
    async fn empty_result_set_degrades_to_fallback() {
        let retriever = Retriever::new(
            Arc::new(StaticSearch { hits: Vec::new() }),
            RetrievalConfig::default(),
        );
        let snippets = retriever.retrieve("caries").await;
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].confidence_pct, 0.0);
    }

    #[tokio::test]
    async fn slow_backend_hits_the_timeout() {
        let config = RetrievalConfig {
            top_k: 3,
            timeout: Duration::from_millis(20),
        };
        let retriever = Retriever::new(Arc::new(SlowSearch), config);
        let snippets = retriever.retrieve("caries").await;
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].source, "system");
    }
}
