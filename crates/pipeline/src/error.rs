//! Errors that stop a submit before anything is recorded.
//!
//! Enrichment and model failures are not here: they are folded into the
//! [`TurnOutcome`](crate::TurnOutcome) so the turn still renders.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("You need to log in from the 'Home' page in the left sidebar.")]
    AuthenticationNotReady,

    #[error("Username/password is incorrect")]
    AuthenticationFailed,

    #[error("Question must not be empty")]
    EmptyQuestion,

    #[error("Model '{model}' is not available on the {page} page")]
    ModelNotAllowed { page: String, model: String },

    #[error("Unknown page '{0}', expected one of: gemini, search, url")]
    UnknownPage(String),

    #[error("Invalid page configuration: {0}")]
    InvalidConfig(String),
}
