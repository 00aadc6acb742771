//! Error types for the llmdesk domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for llmdesk operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Enrichment errors ---
    #[error("Enrichment error: {0}")]
    Enrichment(#[from] EnrichmentError),

    // --- Authentication errors ---
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures at the enrichment boundary. Never fatal to a turn.
#[derive(Debug, Clone, Error)]
pub enum EnrichmentError {
    #[error("Search failed: {0}")]
    Search(String),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Failed to extract text from {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("Invalid enrichment input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Malformed session token")]
    MalformedToken,

    #[error("Session token signature mismatch")]
    BadSignature,

    #[error("Session expired")]
    Expired,

    #[error("Unknown user: {0}")]
    UnknownUser(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn fetch_error_names_the_url() {
        let err = Error::Enrichment(EnrichmentError::Fetch {
            url: "https://example.com".into(),
            reason: "connection refused".into(),
        });
        assert!(err.to_string().contains("https://example.com"));
        assert!(err.to_string().contains("connection refused"));
    }
}
