//! # llmdesk Core
//!
//! Domain types, traits, and error definitions shared by every llmdesk crate.
//! This crate has **zero framework dependencies**; it defines the domain model
//! that the other crates implement against.
//!
//! ## Layout
//!
//! Every external collaborator (model provider, search provider, URL loader,
//! context enricher) is a trait here. Implementations live in their own
//! crates, which keeps the chat pipeline testable with scripted stubs.

pub mod auth;
pub mod enrich;
pub mod error;
pub mod message;
pub mod provider;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use auth::{AuthStatus, AuthenticatedUser};
pub use enrich::{ContentLoader, Enricher, SearchHit, SearchProvider};
pub use error::{EnrichmentError, Error, ProviderError, Result};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use turn::{Exchange, Turn, TurnRole};
