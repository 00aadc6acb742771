//! Chat page routes.

use crate::{ApiError, SharedState, authorize};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Json;
use llmdesk_core::turn::Turn;
use llmdesk_pipeline::{PageKind, PageProfile, PageSession, TurnOutcome, TurnRequest};
use serde::{Deserialize, Serialize};
use tracing::info;

pub(crate) async fn list_pages_handler(State(state): State<SharedState>) -> Json<Vec<PageProfile>> {
    Json(state.pipeline.profiles().cloned().collect())
}

#[derive(Serialize, Deserialize)]
pub struct TurnsResponse {
    pub page: PageKind,
    pub turns: Vec<Turn>,
}

pub(crate) async fn turns_handler(
    State(state): State<SharedState>,
    Path(page): Path<String>,
    headers: HeaderMap,
) -> Result<Json<TurnsResponse>, ApiError> {
    let kind: PageKind = page.parse()?;
    let caller = authorize(&state, &headers)?;

    let turns = match state.sessions.get(&caller.session_id, kind).await {
        Some(session) => state.pipeline.transcript(&*session.lock().await),
        None => state.pipeline.transcript(&PageSession::new(kind)),
    };
    Ok(Json(TurnsResponse { page: kind, turns }))
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub max_results: Option<usize>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl From<ChatRequest> for TurnRequest {
    fn from(req: ChatRequest) -> Self {
        Self {
            question: req.message,
            model: req.model,
            url: req.url,
            max_results: req.max_results,
            system_prompt: req.system_prompt,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(flatten)]
    pub outcome: TurnOutcome,
    pub turns: Vec<Turn>,
}

pub(crate) async fn chat_handler(
    State(state): State<SharedState>,
    Path(page): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let kind: PageKind = page.parse()?;
    let caller = authorize(&state, &headers)?;

    let session = state.sessions.get_or_create(&caller.session_id, kind).await;
    // Held for the whole turn so one session's submits never interleave.
    let mut session = session.lock().await;
    let outcome = state
        .pipeline
        .submit(&mut session, &caller.status, payload.into())
        .await?;

    info!(
        page = %kind,
        committed = outcome.committed,
        turns = session.turns.len(),
        "Chat turn served"
    );
    let turns = state.pipeline.transcript(&session);
    Ok(Json(ChatResponse { outcome, turns }))
}

#[cfg(test)]
mod tests {
    use crate::tests::{body_json, login, test_state};
    use crate::{ErrorResponse, build_router};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use llmdesk_core::turn::TurnRole;
    use llmdesk_pipeline::GREETING;
    use tower::ServiceExt;

    use super::*;

    fn chat(token: Option<&str>, page: &str, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/pages/{page}/chat"))
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn lists_three_pages() {
        let app = build_router(test_state("ok"));
        let req = Request::builder().uri("/pages").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = body_json(response).await;
        let pages = body.as_array().unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0]["kind"], "gemini");
        assert_eq!(pages[1]["max_results"], 5);
        assert_eq!(pages[2]["chunk_size"], 1000);
    }

    #[tokio::test]
    async fn chat_records_turns_and_commits() {
        let app = build_router(test_state("RAM is memory."));
        let token = login(&app).await;

        let response = app
            .clone()
            .oneshot(chat(Some(&token), "gemini", r#"{"message":"What is RAM?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: ChatResponse = body_json(response).await;
        assert_eq!(json.outcome.answer, "RAM is memory.");
        assert!(json.outcome.committed);
        assert_eq!(json.turns.len(), 3);
        assert_eq!(json.turns[0].text, GREETING);
        assert_eq!(json.turns[1].role, TurnRole::Human);
        assert_eq!(json.turns[1].text, "What is RAM?");
        assert_eq!(json.turns[2].text, "RAM is memory.");
    }

    #[tokio::test]
    async fn turns_survive_between_requests() {
        let app = build_router(test_state("answer"));
        let token = login(&app).await;
        app.clone()
            .oneshot(chat(Some(&token), "url", r#"{"message":"q1"}"#))
            .await
            .unwrap();

        let req = Request::builder()
            .uri("/pages/url/turns")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        let json: TurnsResponse = body_json(response).await;
        assert_eq!(json.page, PageKind::Url);
        assert_eq!(json.turns.len(), 3);

        // Another page of the same login starts empty.
        let req = Request::builder()
            .uri("/pages/search/turns")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let json: TurnsResponse = body_json(app.oneshot(req).await.unwrap()).await;
        assert_eq!(json.turns.len(), 1);
    }

    #[tokio::test]
    async fn chat_without_login_asks_to_log_in() {
        let state = test_state("ok");
        let app = build_router(state.clone());
        let response = app
            .oneshot(chat(None, "search", r#"{"message":"hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let json: ErrorResponse = body_json(response).await;
        assert_eq!(
            json.error,
            "You need to log in from the 'Home' page in the left sidebar."
        );
        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn chat_with_forged_token_fails() {
        let app = build_router(test_state("ok"));
        let response = app
            .oneshot(chat(Some("forged.token"), "gemini", r#"{"message":"hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json: ErrorResponse = body_json(response).await;
        assert_eq!(json.error, "Username/password is incorrect");
    }

    #[tokio::test]
    async fn unknown_page_is_not_found() {
        let app = build_router(test_state("ok"));
        let token = login(&app).await;
        let response = app
            .oneshot(chat(Some(&token), "home", r#"{"message":"hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn disallowed_model_is_bad_request() {
        let app = build_router(test_state("ok"));
        let token = login(&app).await;
        let response = app
            .oneshot(chat(
                Some(&token),
                "search",
                r#"{"message":"hi","model":"gpt-4o"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_without_provider_reports_enrichment_error() {
        let app = build_router(test_state("plain answer"));
        let token = login(&app).await;
        let response = app
            .oneshot(chat(Some(&token), "search", r#"{"message":"news?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: ChatResponse = body_json(response).await;
        assert_eq!(json.outcome.answer, "plain answer");
        assert!(json.outcome.enrichment_error.is_some());
    }
}
