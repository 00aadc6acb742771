//! The per-turn chat pipeline.

use crate::assembler::PromptAssembler;
use crate::error::PipelineError;
use crate::invoker::ModelInvoker;
use crate::profile::{APOLOGY, EnrichmentStyle, PageKind, PageProfile};
use crate::session::PageSession;
use chrono::NaiveDate;
use llmdesk_config::AppConfig;
use llmdesk_core::auth::AuthStatus;
use llmdesk_core::enrich::{ContentLoader, Enricher, SearchProvider};
use llmdesk_core::error::EnrichmentError;
use llmdesk_core::provider::Provider;
use llmdesk_core::turn::{Exchange, Turn};
use llmdesk_enrich::{DEFAULT_MAX_RESULTS, RecursiveTextSplitter, SearchEnricher, UrlEnricher};
use llmdesk_memory::{CharHeuristicEstimator, SummaryBuffer, TokenEstimator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One submit from a page.
///
/// Optional fields are sidebar choices. When present they replace the
/// session's current choice and stick for later turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnRequest {
    pub question: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub max_results: Option<usize>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl TurnRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }
}

/// What the page renders after a submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// The ai turn text: the model answer, or the apology on failure.
    pub answer: String,
    /// Whether an exchange was added to memory.
    pub committed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_error: Option<String>,
}

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Runs turns for every page against shared, stateless collaborators.
///
/// All per-user state lives in the [`PageSession`] passed to [`submit`];
/// the pipeline itself can be shared across sessions.
///
/// [`submit`]: ChatPipeline::submit
pub struct ChatPipeline {
    provider: Arc<dyn Provider>,
    search: Option<Arc<dyn SearchProvider>>,
    loader: Option<Arc<dyn ContentLoader>>,
    estimator: Arc<dyn TokenEstimator>,
    profiles: BTreeMap<PageKind, PageProfile>,
    splitter: RecursiveTextSplitter,
    clock: Clock,
}

impl ChatPipeline {
    pub fn new(provider: Arc<dyn Provider>, config: &AppConfig) -> Result<Self, PipelineError> {
        let profiles: BTreeMap<PageKind, PageProfile> = PageProfile::all(config)
            .into_iter()
            .map(|p| (p.kind, p))
            .collect();

        let url = &config.pages.url;
        let splitter = RecursiveTextSplitter::new(url.chunk_size, url.chunk_overlap)
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            provider,
            search: None,
            loader: None,
            estimator: Arc::new(CharHeuristicEstimator),
            profiles,
            splitter,
            clock: Arc::new(|| chrono::Local::now().date_naive()),
        })
    }

    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn ContentLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Replace the date source used in system prompts.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn profile(&self, kind: PageKind) -> &PageProfile {
        // Every kind is inserted in `new`.
        &self.profiles[&kind]
    }

    pub fn profiles(&self) -> impl Iterator<Item = &PageProfile> {
        self.profiles.values()
    }

    /// The transcript as displayed: greeting first, then stored turns.
    pub fn transcript(&self, session: &PageSession) -> Vec<Turn> {
        std::iter::once(self.profile(session.kind).greeting())
            .chain(session.turns.all().iter().cloned())
            .collect()
    }

    /// Run one turn on `session`.
    ///
    /// Returns `Err` only when the submit is rejected outright (not
    /// authenticated, empty question, disallowed model); in that case the
    /// session is untouched. Enrichment and model failures come back as a
    /// successful [`TurnOutcome`] carrying the error text.
    pub async fn submit(
        &self,
        session: &mut PageSession,
        auth: &AuthStatus,
        request: TurnRequest,
    ) -> Result<TurnOutcome, PipelineError> {
        match auth {
            AuthStatus::NotAttempted => return Err(PipelineError::AuthenticationNotReady),
            AuthStatus::Failed => return Err(PipelineError::AuthenticationFailed),
            AuthStatus::Succeeded(_) => {}
        }

        let question = request.question.trim();
        if question.is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }
        let question = question.to_string();

        let profile = self.profile(session.kind);
        let requested_model = request.model.as_deref().or(session.settings.model.as_deref());
        let model = profile.select_model(requested_model)?;

        // Accepted: remember sidebar choices.
        let settings = &mut session.settings;
        settings.model = Some(model.clone());
        if request.url.is_some() {
            settings.url = request.url;
        }
        if request.max_results.is_some() {
            settings.max_results = request.max_results;
        }
        if request.system_prompt.is_some() {
            settings.system_prompt = request.system_prompt;
        }

        info!(page = %session.kind, model = %model, "Processing turn");
        session.turns.record(Turn::human(&question));

        let (context, enrichment_error) = match self.enrich(profile, session, &question).await {
            Ok(context) => (context, None),
            Err(e) => {
                warn!(page = %session.kind, error = %e, "Enrichment failed, continuing without context");
                (None, Some(e.to_string()))
            }
        };

        let memory = SummaryBuffer::replay(
            profile.budget(),
            Arc::clone(&self.estimator),
            &session.exchanges,
        );
        let system_text = profile.render_system_prompt(
            session.settings.system_prompt.as_deref(),
            (self.clock)(),
        );
        let messages = PromptAssembler::new(profile.enrichment).assemble(
            &system_text,
            context.as_deref(),
            memory.render(),
            &question,
        );
        debug!(
            messages = messages.len(),
            history = memory.len(),
            history_tokens = memory.estimated_tokens(),
            enriched = context.is_some(),
            "Assembled prompt"
        );

        let invoker = ModelInvoker::new(Arc::clone(&self.provider), model);
        let outcome = match invoker.invoke(messages).await {
            Ok(answer) => {
                session.exchanges.push(Exchange::new(question, answer.clone()));
                session.turns.record(Turn::ai(&answer));
                TurnOutcome {
                    answer,
                    committed: true,
                    enrichment_error,
                    model_error: None,
                }
            }
            Err(e) => {
                warn!(page = %session.kind, model = invoker.model(), error = %e, "Model call failed");
                session.turns.record(Turn::ai(APOLOGY));
                TurnOutcome {
                    answer: APOLOGY.to_string(),
                    committed: false,
                    enrichment_error,
                    model_error: Some(e.to_string()),
                }
            }
        };

        info!(
            page = %session.kind,
            committed = outcome.committed,
            turns = session.turns.len(),
            exchanges = session.exchanges.len(),
            "Turn complete"
        );
        Ok(outcome)
    }

    async fn enrich(
        &self,
        profile: &PageProfile,
        session: &PageSession,
        question: &str,
    ) -> Result<Option<String>, EnrichmentError> {
        match profile.enrichment {
            EnrichmentStyle::None => Ok(None),
            EnrichmentStyle::LabeledField => {
                let search = self.search.clone().ok_or_else(|| {
                    EnrichmentError::Search("no search provider configured".into())
                })?;
                let max_results = session
                    .settings
                    .max_results
                    .or(profile.max_results)
                    .unwrap_or(DEFAULT_MAX_RESULTS);
                SearchEnricher::new(search, max_results).enrich(question).await
            }
            EnrichmentStyle::Inline => {
                let Some(url) = session.settings.url.as_deref() else {
                    return Ok(None);
                };
                let loader = self.loader.clone().ok_or_else(|| EnrichmentError::Fetch {
                    url: url.to_string(),
                    reason: "no page loader configured".into(),
                })?;
                UrlEnricher::new(loader, self.splitter.clone()).enrich(url).await
            }
        }
    }
}
