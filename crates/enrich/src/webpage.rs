//! Webpage enricher.
//!
//! The input is a URL chosen by the user, not the question. The page is
//! loaded, split into overlapping chunks, and the chunks are joined with
//! newlines into a single context blob.

use crate::splitter::RecursiveTextSplitter;
use async_trait::async_trait;
use llmdesk_core::enrich::{ContentLoader, Enricher};
use llmdesk_core::error::EnrichmentError;
use std::sync::Arc;
use tracing::debug;
use url::Url;

pub struct UrlEnricher {
    loader: Arc<dyn ContentLoader>,
    splitter: RecursiveTextSplitter,
}

impl UrlEnricher {
    pub fn new(loader: Arc<dyn ContentLoader>, splitter: RecursiveTextSplitter) -> Self {
        Self { loader, splitter }
    }
}

/// Parse `input` and require an http(s) scheme.
fn validate_url(input: &str) -> Result<Url, EnrichmentError> {
    let parsed = Url::parse(input)
        .map_err(|e| EnrichmentError::InvalidInput(format!("invalid URL '{input}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(EnrichmentError::InvalidInput(format!(
            "unsupported URL scheme '{other}', expected http or https"
        ))),
    }
}

#[async_trait]
impl Enricher for UrlEnricher {
    fn name(&self) -> &str {
        "url"
    }

    async fn enrich(&self, input: &str) -> Result<Option<String>, EnrichmentError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }

        let url = validate_url(input)?;
        let text = self.loader.load(url.as_str()).await?;
        let chunks = self.splitter.split_text(&text);
        debug!(url = %url, chunks = chunks.len(), "Split page into chunks");

        if chunks.is_empty() {
            return Ok(None);
        }
        Ok(Some(chunks.join("\n")))
    }
}
