//! `llmdesk chat`: interactive or single-message chat on one page.

use llmdesk_config::AppConfig;
use llmdesk_core::auth::AuthStatus;
use llmdesk_pipeline::{
    ChatPipeline, PageKind, PageSession, PipelineError, TurnOutcome, TurnRequest,
};
use llmdesk_security::{Authenticator, welcome};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

pub struct ChatOptions {
    pub page: PageKind,
    pub model: Option<String>,
    pub url: Option<String>,
    pub max_results: Option<usize>,
    pub username: Option<String>,
    pub message: Option<String>,
}

pub async fn run(options: ChatOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    GEMINI_API_KEY=...   (recommended)");
        eprintln!("    LLMDESK_API_KEY=...  (generic)");
        eprintln!();
        eprintln!("  Or add api_key to your config file:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let pipeline = llmdesk_gateway::build_pipeline(&config)?;
    let auth = Authenticator::from_config(&config.auth);
    let status = log_in(&auth, options.username.as_deref())?;
    if let AuthStatus::Succeeded(user) = &status {
        println!("  {}", welcome(user));
    }

    let mut session = PageSession::new(options.page);
    let profile = pipeline.profile(options.page);
    let mut first = TurnRequest {
        question: String::new(),
        model: options.model,
        url: options.url,
        max_results: options.max_results,
        system_prompt: None,
    };

    if let Some(message) = options.message {
        first.question = message;
        let outcome = pipeline.submit(&mut session, &status, first).await?;
        print_outcome(&outcome);
        return Ok(());
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║          llmdesk: Interactive Mode            ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Page:      {}", profile.title);
    println!("  Model:     {}", first.model.as_deref().unwrap_or(&profile.default_model));
    if let Some(url) = &first.url {
        println!("  URL:       {url}");
    }
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();
    for turn in pipeline.transcript(&session) {
        println!("  Assistant > {}", turn.text);
    }
    println!();

    repl(&pipeline, &mut session, &status, first).await?;

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

async fn repl(
    pipeline: &ChatPipeline,
    session: &mut PageSession,
    status: &AuthStatus,
    first: TurnRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = Some(first);

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        eprint!("  ...");
        let result = submit_line(pipeline, session, status, &mut pending, line).await;
        eprint!("\r     \r");
        match result {
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }
    Ok(())
}

/// Submit one typed line. Sidebar choices from the command line ride along
/// until a submit is accepted; after that they stick in the session.
async fn submit_line(
    pipeline: &ChatPipeline,
    session: &mut PageSession,
    status: &AuthStatus,
    pending: &mut Option<TurnRequest>,
    line: &str,
) -> Result<TurnOutcome, PipelineError> {
    let mut request = pending.clone().unwrap_or_default();
    request.question = line.to_string();
    let result = pipeline.submit(session, status, request).await;
    if result.is_ok() {
        *pending = None;
    }
    result
}

fn print_outcome(outcome: &TurnOutcome) {
    if let Some(err) = &outcome.enrichment_error {
        eprintln!("  [Context unavailable] {err}");
    }
    if let Some(err) = &outcome.model_error {
        eprintln!("  [Model error] {err}");
    }
    println!();
    for line in outcome.answer.lines() {
        println!("  Assistant > {line}");
    }
    println!();
}

/// Log in with the given or prompted username. The password comes from
/// `LLMDESK_PASSWORD` or a prompt.
fn log_in(auth: &Authenticator, username: Option<&str>) -> std::io::Result<AuthStatus> {
    let username = match username {
        Some(name) => name.to_string(),
        None => prompt("Username: ")?,
    };
    if username.is_empty() {
        return Ok(AuthStatus::NotAttempted);
    }
    let password = match std::env::var("LLMDESK_PASSWORD") {
        Ok(password) => password,
        Err(_) => prompt("Password: ")?,
    };
    Ok(auth.login(&username, &password).status)
}

fn prompt(label: &str) -> std::io::Result<String> {
    print!("  {label}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use llmdesk_config::AppConfig;
    use llmdesk_core::auth::AuthenticatedUser;
    use llmdesk_core::error::ProviderError;
    use llmdesk_core::message::Message;
    use llmdesk_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use std::sync::Arc;

    struct Fixed;

    #[async_trait]
    impl Provider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                message: Message::assistant("ok"),
                usage: None,
                model: request.model,
            })
        }
    }

    fn pipeline() -> ChatPipeline {
        ChatPipeline::new(Arc::new(Fixed), &AppConfig::default()).unwrap()
    }

    fn alice() -> AuthStatus {
        AuthStatus::Succeeded(AuthenticatedUser {
            username: "alice".into(),
            display_name: "Alice".into(),
        })
    }

    #[tokio::test]
    async fn rejected_line_keeps_command_line_choices() {
        let pipeline = pipeline();
        let mut session = PageSession::new(PageKind::Gemini);
        let mut pending = Some(TurnRequest {
            model: Some("not-a-model".into()),
            url: Some("https://example.com".into()),
            max_results: Some(3),
            ..TurnRequest::default()
        });

        let result = submit_line(&pipeline, &mut session, &alice(), &mut pending, "hi").await;
        assert!(matches!(result, Err(PipelineError::ModelNotAllowed { .. })));

        let kept = pending.as_ref().unwrap();
        assert_eq!(kept.url.as_deref(), Some("https://example.com"));
        assert_eq!(kept.max_results, Some(3));
        assert!(session.turns.all().is_empty());
    }

    #[tokio::test]
    async fn accepted_line_moves_choices_into_session() {
        let pipeline = pipeline();
        let model = pipeline.profile(PageKind::Gemini).default_model.clone();
        let mut session = PageSession::new(PageKind::Gemini);
        let mut pending = Some(TurnRequest {
            model: Some(model.clone()),
            max_results: Some(3),
            ..TurnRequest::default()
        });

        let outcome = submit_line(&pipeline, &mut session, &alice(), &mut pending, "hi")
            .await
            .unwrap();
        assert_eq!(outcome.answer, "ok");
        assert!(pending.is_none());
        assert_eq!(session.settings.model.as_deref(), Some(model.as_str()));
        assert_eq!(session.settings.max_results, Some(3));
    }
}
