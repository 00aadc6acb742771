//! Enrichment traits for external context spliced into a prompt.
//!
//! An [`Enricher`] turns one input string (a search query or a URL) into an
//! optional text blob. The two external collaborators it is built on,
//! [`SearchProvider`] and [`ContentLoader`], are traits too so the pipeline
//! can be exercised without network access.

use crate::error::EnrichmentError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single search result snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// A web search backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Run `query`, returning at most `max_results` hits.
    async fn search(&self, query: &str, max_results: usize)
    -> Result<Vec<SearchHit>, EnrichmentError>;
}

/// Fetches a URL and extracts its text.
#[async_trait]
pub trait ContentLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<String, EnrichmentError>;
}

/// Produces prompt context from a single input.
///
/// `Ok(None)` means there is nothing to add. Callers treat `Err` as
/// "no enrichment" plus a display-only notice; it never aborts a turn.
#[async_trait]
pub trait Enricher: Send + Sync {
    fn name(&self) -> &str;

    async fn enrich(&self, input: &str) -> Result<Option<String>, EnrichmentError>;
}
