//! Tavily web search client.
//!
//! Calls the Tavily `/search` endpoint with advanced depth and raw page
//! content enabled, and maps the results onto [`SearchHit`]s.

use async_trait::async_trait;
use llmdesk_config::SearchConfig;
use llmdesk_core::enrich::{SearchHit, SearchProvider};
use llmdesk_core::error::EnrichmentError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub struct TavilySearch {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl TavilySearch {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(&config.api_url, config.api_key.clone().unwrap_or_default())
    }

    fn request_body<'a>(&'a self, query: &'a str, max_results: usize) -> TavilyRequest<'a> {
        TavilyRequest {
            api_key: &self.api_key,
            query,
            max_results,
            search_depth: "advanced",
            include_answer: true,
            include_raw_content: true,
            include_images: false,
        }
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, EnrichmentError> {
        if self.api_key.is_empty() {
            return Err(EnrichmentError::Search(
                "no Tavily API key configured (set TAVILY_API_KEY)".into(),
            ));
        }

        debug!(max_results, "Sending search request");

        let response = self
            .client
            .post(format!("{}/search", self.api_url))
            .json(&self.request_body(query, max_results))
            .send()
            .await
            .map_err(|e| EnrichmentError::Search(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Search provider returned error");
            return Err(EnrichmentError::Search(format!(
                "HTTP {}: {body}",
                status.as_u16()
            )));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| EnrichmentError::Search(format!("failed to parse response: {e}")))?;

        Ok(parsed.into_hits(max_results))
    }
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
    include_answer: bool,
    include_raw_content: bool,
    include_images: bool,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

impl TavilyResponse {
    fn into_hits(self, max_results: usize) -> Vec<SearchHit> {
        self.results
            .into_iter()
            .take(max_results)
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                content: r.content,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_advanced_depth() {
        let search = TavilySearch::new("https://api.tavily.com/", "tvly-key");
        let body = serde_json::to_value(search.request_body("rust news", 5)).unwrap();
        assert_eq!(body["search_depth"], "advanced");
        assert_eq!(body["include_answer"], true);
        assert_eq!(body["include_raw_content"], true);
        assert_eq!(body["include_images"], false);
        assert_eq!(body["max_results"], 5);
        assert_eq!(search.api_url, "https://api.tavily.com");
    }

    #[test]
    fn response_maps_to_hits() {
        let raw = serde_json::json!({
            "answer": "ignored",
            "results": [
                {"title": "A", "url": "https://a.example", "content": "alpha", "raw_content": "long"},
                {"title": "B", "url": "https://b.example", "content": "beta"},
                {"title": "C", "url": "https://c.example", "content": "gamma"}
            ]
        });
        let response: TavilyResponse = serde_json::from_value(raw).unwrap();
        let hits = response.into_hits(2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "A");
        assert_eq!(hits[1].content, "beta");
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let search = TavilySearch::from_config(&SearchConfig::default());
        let err = search.search("anything", 3).await.unwrap_err();
        assert!(err.to_string().contains("TAVILY_API_KEY"));
    }
}
