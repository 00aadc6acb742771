//! Page profiles: everything that distinguishes one chat page from another.

use crate::error::PipelineError;
use chrono::NaiveDate;
use llmdesk_config::AppConfig;
use llmdesk_core::turn::Turn;
use llmdesk_memory::TokenBudget;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shown at the top of every transcript. Never stored.
pub const GREETING: &str = "I'm ready! Ask away!";

/// Answer shown when the model call fails.
pub const APOLOGY: &str = "Sorry. An error occurred while generating the response.";

/// Sampling temperature for every page.
pub const MODEL_TEMPERATURE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Gemini,
    Search,
    Url,
}

impl PageKind {
    pub const ALL: [PageKind; 3] = [PageKind::Gemini, PageKind::Search, PageKind::Url];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Search => "search",
            Self::Url => "url",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "chat" => Ok(Self::Gemini),
            "search" => Ok(Self::Search),
            "url" | "webpage" => Ok(Self::Url),
            other => Err(PipelineError::UnknownPage(other.to_string())),
        }
    }
}

/// How enrichment context is spliced into the final user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStyle {
    /// The question is sent verbatim.
    None,
    /// Context is prefixed inline before the question.
    Inline,
    /// Context fills a labeled field in a fixed answer template.
    LabeledField,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageProfile {
    pub kind: PageKind,
    pub title: String,
    /// Allowed models. The first entry is preselected.
    pub models: Vec<String>,
    pub default_model: String,
    /// 0 means unbounded memory.
    pub token_budget: usize,
    pub system_prompt: String,
    /// Whether a session may replace the system prompt.
    pub system_prompt_editable: bool,
    pub enrichment: EnrichmentStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_overlap: Option<usize>,
}

impl PageProfile {
    pub fn from_config(kind: PageKind, config: &AppConfig) -> Self {
        let pages = &config.pages;
        match kind {
            PageKind::Gemini => Self {
                kind,
                title: pages.gemini.title.clone(),
                models: pages.gemini.models.clone(),
                default_model: pages.gemini.default_model.clone(),
                token_budget: pages.gemini.token_budget,
                system_prompt: pages.gemini.system_prompt.clone(),
                system_prompt_editable: true,
                enrichment: EnrichmentStyle::None,
                max_results: None,
                chunk_size: None,
                chunk_overlap: None,
            },
            PageKind::Search => Self {
                kind,
                title: pages.search.title.clone(),
                models: pages.search.models.clone(),
                default_model: pages.search.default_model.clone(),
                token_budget: pages.search.token_budget,
                system_prompt: pages.search.system_prompt.clone(),
                system_prompt_editable: false,
                enrichment: EnrichmentStyle::LabeledField,
                max_results: Some(pages.search.max_results),
                chunk_size: None,
                chunk_overlap: None,
            },
            PageKind::Url => Self {
                kind,
                title: pages.url.title.clone(),
                models: pages.url.models.clone(),
                default_model: pages.url.default_model.clone(),
                token_budget: pages.url.token_budget,
                system_prompt: pages.url.system_prompt.clone(),
                system_prompt_editable: false,
                enrichment: EnrichmentStyle::Inline,
                max_results: None,
                chunk_size: Some(pages.url.chunk_size),
                chunk_overlap: Some(pages.url.chunk_overlap),
            },
        }
    }

    /// Profiles for every page, in menu order.
    pub fn all(config: &AppConfig) -> Vec<Self> {
        PageKind::ALL
            .iter()
            .map(|kind| Self::from_config(*kind, config))
            .collect()
    }

    /// Resolve the model for a turn against the allow-list.
    pub fn select_model(&self, requested: Option<&str>) -> Result<String, PipelineError> {
        let model = requested.unwrap_or(&self.default_model);
        if self.models.iter().any(|m| m == model) {
            Ok(model.to_string())
        } else {
            Err(PipelineError::ModelNotAllowed {
                page: self.kind.to_string(),
                model: model.to_string(),
            })
        }
    }

    pub fn budget(&self) -> TokenBudget {
        TokenBudget::new(self.token_budget)
    }

    /// System text for a turn. `{today}` renders as MM/DD/YY.
    pub fn render_system_prompt(&self, override_text: Option<&str>, today: NaiveDate) -> String {
        let template = match override_text {
            Some(text) if self.system_prompt_editable => text,
            _ => self.system_prompt.as_str(),
        };
        template.replace("{today}", &today.format("%D").to_string())
    }

    pub fn greeting(&self) -> Turn {
        Turn::ai(GREETING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(kind: PageKind) -> PageProfile {
        PageProfile::from_config(kind, &AppConfig::default())
    }

    #[test]
    fn page_defaults() {
        let gemini = profile(PageKind::Gemini);
        assert_eq!(gemini.title, "Gemini Chatbot");
        assert_eq!(gemini.token_budget, 0);
        assert_eq!(gemini.enrichment, EnrichmentStyle::None);

        let search = profile(PageKind::Search);
        assert_eq!(search.token_budget, 1000);
        assert_eq!(search.models, vec!["gemini-2.0-flash-exp"]);
        assert_eq!(search.enrichment, EnrichmentStyle::LabeledField);
        assert_eq!(search.max_results, Some(5));

        let url = profile(PageKind::Url);
        assert_eq!(url.token_budget, 2000);
        assert_eq!(url.enrichment, EnrichmentStyle::Inline);
        assert_eq!(url.chunk_size, Some(1000));
        assert_eq!(url.chunk_overlap, Some(200));
    }

    #[test]
    fn model_selection_enforces_allow_list() {
        let search = profile(PageKind::Search);
        assert_eq!(search.select_model(None).unwrap(), "gemini-2.0-flash-exp");
        let err = search
            .select_model(Some("gemini-2.0-flash-thinking-exp-01-21"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::ModelNotAllowed { .. }));

        let url = profile(PageKind::Url);
        assert_eq!(
            url.select_model(Some("gemini-2.0-flash-exp")).unwrap(),
            "gemini-2.0-flash-exp"
        );
    }

    #[test]
    fn search_prompt_includes_date() {
        let search = profile(PageKind::Search);
        let today = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let text = search.render_system_prompt(None, today);
        assert!(text.contains("Today's date is: 03/07/25"));
    }

    #[test]
    fn only_gemini_prompt_is_editable() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let gemini = profile(PageKind::Gemini);
        assert_eq!(gemini.render_system_prompt(Some("Be brief."), today), "Be brief.");
        assert!(gemini.render_system_prompt(None, today).contains("hardware and software expert"));

        let url = profile(PageKind::Url);
        assert_eq!(
            url.render_system_prompt(Some("Be brief."), today),
            "Answer the question to the point."
        );
    }

    #[test]
    fn page_kind_parsing() {
        assert_eq!("Search".parse::<PageKind>().unwrap(), PageKind::Search);
        assert_eq!("url".parse::<PageKind>().unwrap(), PageKind::Url);
        assert!("home".parse::<PageKind>().is_err());
        assert_eq!(PageKind::Gemini.to_string(), "gemini");
    }
}
