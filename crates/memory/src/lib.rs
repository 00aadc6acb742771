//! Conversation memory for llmdesk pages.
//!
//! Two stores with different lifetimes:
//! - [`TurnStore`]: the displayed transcript, append-only and unbounded.
//! - [`SummaryBuffer`]: the exchanges replayed into the next prompt,
//!   trimmed oldest-first to a token budget.

pub mod summary_buffer;
pub mod token;
pub mod turn_store;

pub use summary_buffer::{SummaryBuffer, TokenBudget};
pub use token::{CharHeuristicEstimator, TokenEstimator, estimate_tokens};
pub use turn_store::TurnStore;
