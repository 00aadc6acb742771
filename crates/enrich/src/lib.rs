//! Context enrichment for llmdesk pages.
//!
//! Enrichers implement `llmdesk_core::Enricher` and turn a single input into
//! an optional context blob for the prompt:
//! - [`SearchEnricher`]: web search results for the user's question
//! - [`UrlEnricher`]: text of a configured webpage, split into chunks
//!
//! The network backends ([`TavilySearch`], [`HttpPageLoader`]) sit behind
//! the core `SearchProvider` / `ContentLoader` traits.

pub mod loader;
pub mod search;
pub mod splitter;
pub mod tavily;
pub mod webpage;

pub use loader::{HttpPageLoader, html_to_text};
pub use search::{DEFAULT_MAX_RESULTS, MAX_RESULTS_LIMIT, SearchEnricher};
pub use splitter::RecursiveTextSplitter;
pub use tavily::TavilySearch;
pub use webpage::UrlEnricher;
