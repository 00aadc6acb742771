//! The chat pipeline shared by every llmdesk page.
//!
//! One submit runs through a fixed sequence:
//!
//! 1. **Auth gate**: nothing happens unless the session is authenticated
//! 2. **Record** the human turn
//! 3. **Enrich** (search results or webpage text), best-effort
//! 4. **Assemble** the prompt from the page template and replayed memory
//! 5. **Invoke** the model once
//! 6. **Record** the ai turn, and commit the exchange only on success
//!
//! Pages differ only in their [`PageProfile`]: model allow-list, memory
//! budget, system prompt, and how enrichment is spliced into the question.

pub mod assembler;
pub mod error;
pub mod invoker;
pub mod pipeline;
pub mod profile;
pub mod session;

pub use assembler::PromptAssembler;
pub use error::PipelineError;
pub use invoker::ModelInvoker;
pub use pipeline::{ChatPipeline, TurnOutcome, TurnRequest};
pub use profile::{APOLOGY, EnrichmentStyle, GREETING, MODEL_TEMPERATURE, PageKind, PageProfile};
pub use session::{PageSession, PageSettings};
