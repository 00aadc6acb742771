//! Per-(session, page) state.

use crate::profile::PageKind;
use llmdesk_core::turn::Exchange;
use llmdesk_memory::TurnStore;
use serde::{Deserialize, Serialize};

/// Sidebar choices that persist across turns within one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// Everything one page remembers for one authenticated session: the
/// displayed transcript and the full exchange history that memory is
/// replayed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSession {
    pub kind: PageKind,
    pub turns: TurnStore,
    pub exchanges: Vec<Exchange>,
    #[serde(default)]
    pub settings: PageSettings,
}

impl PageSession {
    pub fn new(kind: PageKind) -> Self {
        Self {
            kind,
            turns: TurnStore::new(),
            exchanges: Vec::new(),
            settings: PageSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmdesk_core::turn::Turn;

    #[test]
    fn new_session_is_empty() {
        let session = PageSession::new(PageKind::Url);
        assert!(session.turns.is_empty());
        assert!(session.exchanges.is_empty());
        assert_eq!(session.settings, PageSettings::default());
    }

    #[test]
    fn serializes_named_slots() {
        let mut session = PageSession::new(PageKind::Gemini);
        session.turns.record(Turn::human("hi"));
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["kind"], "gemini");
        assert_eq!(json["turns"][0]["text"], "hi");
        assert!(json["exchanges"].as_array().unwrap().is_empty());
    }
}
