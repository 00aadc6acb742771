//! Prompt assembly.
//!
//! Layout, in order:
//!
//! 1. **System**: the page's system text
//! 2. **History**: retained exchanges as alternating user/assistant messages
//! 3. **Question**: the new question, with enrichment spliced in per the
//!    page's [`EnrichmentStyle`]
//!
//! Assembly is pure: identical inputs give identical prompts.

use crate::profile::EnrichmentStyle;
use llmdesk_core::message::Message;
use llmdesk_core::turn::Exchange;

#[derive(Debug, Clone, Copy)]
pub struct PromptAssembler {
    style: EnrichmentStyle,
}

impl PromptAssembler {
    pub fn new(style: EnrichmentStyle) -> Self {
        Self { style }
    }

    pub fn assemble(
        &self,
        system_text: &str,
        enrichment: Option<&str>,
        history: &[Exchange],
        question: &str,
    ) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() * 2 + 2);
        messages.push(Message::system(system_text.trim()));

        for exchange in history {
            messages.push(Message::user(&exchange.question));
            messages.push(Message::assistant(&exchange.answer));
        }

        messages.push(Message::user(self.final_question(enrichment, question)));
        messages
    }

    /// The last user message for this page style.
    pub fn final_question(&self, enrichment: Option<&str>, question: &str) -> String {
        match (self.style, enrichment) {
            (EnrichmentStyle::None, _) | (EnrichmentStyle::Inline, None) => question.to_string(),
            (EnrichmentStyle::Inline, Some(context)) => format!(
                "refer to the following webpages to answer your questions:\n\ncontext: {context}\n\nquestion: {question}"
            ),
            (EnrichmentStyle::LabeledField, context) => {
                let mut text =
                    String::from("Please answer the following question based on the search results:\n\n");
                if let Some(context) = context {
                    text.push_str(&format!("Search Results: {context}\n"));
                }
                text.push_str(&format!(
                    "Question: {question}\n\nPlease format your answer as follows:\n1. Main Summary\n2. Detailed Information\n3. Sources Used"
                ));
                text
            }
        }
    }
}
