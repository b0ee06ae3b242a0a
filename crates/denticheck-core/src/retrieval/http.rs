use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{SearchHit, VectorSearch};

/// HTTP adapter for the knowledge-search service (embedding model and vector
/// index live behind it).
#[derive(Debug, Clone)]
pub struct HttpVectorSearch {
    http: Client,
    url: String,
}

impl HttpVectorSearch {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let url = format!(
            "{}/v1/knowledge/search",
            endpoint.trim_end_matches('/')
        );
        let http = Client::builder()
            .user_agent("denticheck/0.3")
            .timeout(timeout)
            .build()
            .context("failed to build knowledge-search HTTP client")?;
        Ok(Self { http, url })
    }
}

#[async_trait]
impl VectorSearch for HttpVectorSearch {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let response = self
            .http
            .post(&self.url)
            .json(&SearchRequest { query, top_k })
            .send()
            .await
            .context("failed to call knowledge-search service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("knowledge-search service error ({}): {}", status, body);
        }

        let payload: SearchResponse = response
            .json()
            .await
            .context("failed to parse knowledge-search response")?;
        Ok(payload.hits)
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: Vec<SearchHit>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn parses_hits_from_search_service() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/knowledge/search")
                    .json_body(json!({"query": "tartar", "top_k": 2}));
                then.status(200).json_body(json!({
                    "hits": [
                        {
                            "content": "Tartar forms when plaque mineralizes.",
                            "title": "Dental calculus",
                            "source": "snudh",
                            "url": "https://example.org/calculus",
                            "distance": 0.31
                        },
                        {
                            "content": "Scaling removes hardened deposits.",
                            "distance": 0.58
                        }
                    ]
                }));
            })
            .await;

        let client = HttpVectorSearch::new(&server.base_url(), Duration::from_secs(5)).unwrap();
        let hits = client.search("tartar", 2).await.unwrap();
        mock.assert_async().await;

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title.as_deref(), Some("Dental calculus"));
        assert!(hits[1].title.is_none());
        assert!((hits[1].distance - 0.58).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/knowledge/search");
                then.status(503).body("collection loading");
            })
            .await;

        let client = HttpVectorSearch::new(&server.base_url(), Duration::from_secs(5)).unwrap();
        let err = client.search("caries", 3).await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
