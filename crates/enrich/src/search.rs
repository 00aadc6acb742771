//! Search-results enricher.

use async_trait::async_trait;
use llmdesk_core::enrich::{Enricher, SearchHit, SearchProvider};
use llmdesk_core::error::EnrichmentError;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const MAX_RESULTS_LIMIT: usize = 10;

/// Runs the user's question through a [`SearchProvider`] and formats the
/// hits as a numbered list.
pub struct SearchEnricher {
    provider: Arc<dyn SearchProvider>,
    max_results: usize,
}

impl SearchEnricher {
    /// `max_results` is clamped to `1..=10`.
    pub fn new(provider: Arc<dyn SearchProvider>, max_results: usize) -> Self {
        Self {
            provider,
            max_results: max_results.clamp(1, MAX_RESULTS_LIMIT),
        }
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }
}

#[async_trait]
impl Enricher for SearchEnricher {
    fn name(&self) -> &str {
        "search"
    }

    async fn enrich(&self, input: &str) -> Result<Option<String>, EnrichmentError> {
        let query = input.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let hits = self.provider.search(query, self.max_results).await?;
        debug!(provider = self.provider.name(), hits = hits.len(), "Search complete");

        if hits.is_empty() {
            return Ok(None);
        }
        Ok(Some(format_hits(&hits)))
    }
}

fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| format!("{}. {}\nURL: {}\n{}", i + 1, hit.title, hit.url, hit.content.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
