//! Token-bounded conversation memory.
//!
//! A [`SummaryBuffer`] holds the most recent exchanges whose combined
//! estimated size fits the page's budget. Buffers are never persisted:
//! each submit rebuilds one with [`SummaryBuffer::replay`] from the
//! session's full exchange history, so the retained window is always a
//! pure function of (history, budget, estimator).

use crate::token::TokenEstimator;
use llmdesk_core::turn::Exchange;
use std::sync::Arc;
use tracing::debug;

/// Upper bound on the estimated size of the retained history.
///
/// A zero limit means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenBudget(usize);

impl TokenBudget {
    pub const UNBOUNDED: Self = Self(0);

    pub fn new(limit: usize) -> Self {
        Self(limit)
    }

    pub fn is_unbounded(&self) -> bool {
        self.0 == 0
    }

    pub fn limit(&self) -> Option<usize> {
        (!self.is_unbounded()).then_some(self.0)
    }

    fn allows(&self, tokens: usize) -> bool {
        self.limit().is_none_or(|limit| tokens <= limit)
    }
}

impl From<usize> for TokenBudget {
    fn from(limit: usize) -> Self {
        Self(limit)
    }
}

pub struct SummaryBuffer {
    budget: TokenBudget,
    estimator: Arc<dyn TokenEstimator>,
    exchanges: Vec<Exchange>,
    tokens: usize,
}

impl SummaryBuffer {
    pub fn new(budget: TokenBudget, estimator: Arc<dyn TokenEstimator>) -> Self {
        Self {
            budget,
            estimator,
            exchanges: Vec::new(),
            tokens: 0,
        }
    }

    /// Rebuild a buffer by committing every prior exchange in order.
    pub fn replay(
        budget: TokenBudget,
        estimator: Arc<dyn TokenEstimator>,
        history: &[Exchange],
    ) -> Self {
        let mut buffer = Self::new(budget, estimator);
        for exchange in history {
            buffer.push(exchange.clone());
        }
        debug!(
            history = history.len(),
            retained = buffer.exchanges.len(),
            tokens = buffer.tokens,
            "Replayed conversation memory"
        );
        buffer
    }

    /// Append an exchange, then evict the oldest until the buffer fits.
    pub fn commit(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.push(Exchange::new(question, answer));
    }

    fn push(&mut self, exchange: Exchange) {
        self.tokens += self.estimator.estimate_exchange(&exchange);
        self.exchanges.push(exchange);
        self.evict();
    }

    fn evict(&mut self) {
        let mut evicted = 0;
        while !self.budget.allows(self.tokens) && evicted < self.exchanges.len() {
            self.tokens -= self.estimator.estimate_exchange(&self.exchanges[evicted]);
            evicted += 1;
        }
        if evicted > 0 {
            self.exchanges.drain(..evicted);
        }
    }

    /// The retained exchanges, oldest first.
    pub fn render(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn estimated_tokens(&self) -> usize {
        self.tokens
    }

    pub fn budget(&self) -> TokenBudget {
        self.budget
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}

impl std::fmt::Debug for SummaryBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryBuffer")
            .field("budget", &self.budget)
            .field("exchanges", &self.exchanges.len())
            .field("tokens", &self.tokens)
            .finish()
    }
}
