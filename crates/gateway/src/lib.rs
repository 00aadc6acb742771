//! HTTP gateway for llmdesk.
//!
//! Serves the three chat pages over a small JSON API:
//!
//! - `GET  /health`
//! - `POST /login`, `POST /logout`
//! - `GET  /pages`
//! - `GET  /pages/{page}/turns`
//! - `POST /pages/{page}/chat`
//!
//! Authentication comes from the signed session cookie or an
//! `Authorization: Bearer <token>` header carrying the same token.

pub mod pages;
pub mod sessions;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use llmdesk_config::AppConfig;
use llmdesk_core::auth::AuthStatus;
use llmdesk_enrich::{HttpPageLoader, TavilySearch};
use llmdesk_pipeline::{ChatPipeline, PipelineError};
use llmdesk_security::{Authenticator, welcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

pub use sessions::{MAX_SESSIONS, SessionRegistry};

/// Request bodies above this size are rejected.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared state for every route.
pub struct AppState {
    pub pipeline: ChatPipeline,
    pub auth: Authenticator,
    pub sessions: SessionRegistry,
    cors_origin: Option<String>,
}

impl AppState {
    pub fn new(pipeline: ChatPipeline, auth: Authenticator) -> Self {
        Self {
            pipeline,
            auth,
            sessions: SessionRegistry::default(),
            cors_origin: None,
        }
    }

    pub fn with_sessions(mut self, sessions: SessionRegistry) -> Self {
        self.sessions = sessions;
        self
    }

    /// Allow browser requests from `origin` (e.g. `http://localhost:8501`).
    pub fn with_cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_origin = Some(origin.into());
        self
    }
}

pub type SharedState = Arc<AppState>;

/// Build the chat pipeline with the configured provider, Tavily search,
/// and HTTP page loader.
pub fn build_pipeline(config: &AppConfig) -> Result<ChatPipeline, Box<dyn std::error::Error>> {
    let router = llmdesk_providers::build_from_config(config);
    let provider = router.default().ok_or_else(|| {
        format!(
            "Provider '{}' is not configured. Run `llmdesk onboard` or set an API key",
            config.default_provider
        )
    })?;
    let loader = HttpPageLoader::new(config.loader.clone())?;

    let pipeline = ChatPipeline::new(provider, config)?
        .with_search(Arc::new(TavilySearch::from_config(&config.search)))
        .with_loader(Arc::new(loader));
    Ok(pipeline)
}

pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(state.cors_origin.as_deref());

    Router::new()
        .route("/health", get(health_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/pages", get(pages::list_pages_handler))
        .route("/pages/{page}/turns", get(pages::turns_handler))
        .route("/pages/{page}/chat", post(pages::chat_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600));

    match origin.map(HeaderValue::from_str) {
        Some(Ok(value)) => layer
            .allow_origin(AllowOrigin::exact(value))
            .allow_credentials(true),
        Some(Err(_)) => {
            warn!(origin = ?origin, "Ignoring invalid CORS origin");
            layer
        }
        None => layer,
    }
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let pipeline = build_pipeline(&config)?;
    let auth = Authenticator::from_config(&config.auth);
    if config.auth.credentials.is_empty() {
        warn!("No credentials configured; every page will refuse to chat");
    }

    let state = AppState::new(pipeline, auth).with_cors_origin(format!(
        "http://localhost:{}",
        config.gateway.port
    ));
    let app = build_router(Arc::new(state));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Errors ---

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error rendered as `{ "error": ... }` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let status = match &err {
            PipelineError::AuthenticationNotReady | PipelineError::AuthenticationFailed => {
                StatusCode::UNAUTHORIZED
            }
            PipelineError::UnknownPage(_) => StatusCode::NOT_FOUND,
            PipelineError::EmptyQuestion | PipelineError::ModelNotAllowed { .. } => {
                StatusCode::BAD_REQUEST
            }
            PipelineError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Request failed");
        }
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

// --- Auth helpers ---

/// An authenticated request: its login session and status.
pub(crate) struct Authorized {
    pub session_id: String,
    pub status: AuthStatus,
}

/// Session token from `Authorization: Bearer` or the session cookie.
fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if let Some(token) = bearer {
        return Some(token.trim().to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.to_string())
}

/// Resolve the caller, refusing anyone not logged in.
pub(crate) fn authorize(state: &AppState, headers: &HeaderMap) -> Result<Authorized, ApiError> {
    let token = session_token(headers, state.auth.signer().name());
    let status = state.auth.status(token.as_deref());
    match status {
        AuthStatus::NotAttempted => Err(PipelineError::AuthenticationNotReady.into()),
        AuthStatus::Failed => Err(PipelineError::AuthenticationFailed.into()),
        AuthStatus::Succeeded(_) => {
            let (cookie, _) = state
                .auth
                .resolve(token.as_deref().unwrap_or_default())
                .map_err(|_| ApiError::from(PipelineError::AuthenticationFailed))?;
            Ok(Authorized {
                session_id: cookie.session_id,
                status,
            })
        }
    }
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub display_name: String,
    pub welcome: String,
    pub token: String,
}

async fn login_handler(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.auth.login(&payload.username, &payload.password);

    match (outcome.status, outcome.session) {
        (AuthStatus::Succeeded(user), Some(session)) => {
            let cookie = state.auth.signer().set_cookie_header(&session.token);
            let body = LoginResponse {
                welcome: welcome(&user),
                display_name: user.display_name,
                token: session.token,
            };
            Ok(([(header::SET_COOKIE, cookie)], Json(body)))
        }
        _ => Err(PipelineError::AuthenticationFailed.into()),
    }
}

#[derive(Serialize, Deserialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

async fn logout_handler(State(state): State<SharedState>, headers: HeaderMap) -> impl IntoResponse {
    let token = session_token(&headers, state.auth.signer().name());
    let session_id = token.as_deref().and_then(|t| state.auth.logout(t));
    if let Some(session_id) = &session_id {
        state.sessions.remove_all(session_id).await;
    }

    let clear = state.auth.signer().clear_cookie_header();
    (
        [(header::SET_COOKIE, clear)],
        Json(LogoutResponse {
            logged_out: session_id.is_some(),
        }),
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use llmdesk_config::CredentialConfig;
    use llmdesk_core::error::ProviderError;
    use llmdesk_core::message::Message;
    use llmdesk_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use llmdesk_security::hash_password;
    use tower::ServiceExt;

    /// Answers every request with the same text.
    pub(crate) struct MockProvider {
        pub answer: String,
    }

    #[async_trait::async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "gateway_mock"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                message: Message::assistant(&self.answer),
                usage: None,
                model: "mock-model".into(),
            })
        }
    }

    pub(crate) fn test_state(answer: &str) -> SharedState {
        let mut config = AppConfig::default();
        config.auth.cookie.key = "gateway-test-key".into();
        config.auth.credentials.insert(
            "alice".into(),
            CredentialConfig {
                name: "Alice".into(),
                email: String::new(),
                password_hash: hash_password("alice", "pw"),
            },
        );
        let provider = Arc::new(MockProvider {
            answer: answer.into(),
        });
        let pipeline = ChatPipeline::new(provider, &config).unwrap();
        let auth = Authenticator::from_config(&config.auth);
        Arc::new(AppState::new(pipeline, auth))
    }

    pub(crate) async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    pub(crate) async fn login(app: &Router) -> String {
        let req = Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"username":"alice","password":"pw"}"#))
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: LoginResponse = body_json(response).await;
        json.token
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_state("ok"));
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn login_sets_cookie_and_welcomes() {
        let app = build_router(test_state("ok"));
        let req = Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"username":"alice","password":"pw"}"#))
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("llmdesk_session="));

        let json: LoginResponse = body_json(response).await;
        assert_eq!(json.display_name, "Alice");
        assert_eq!(json.welcome, "Welcome *Alice*");
        assert!(cookie.contains(&json.token));
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let app = build_router(test_state("ok"));
        let req = Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"username":"alice","password":"nope"}"#))
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json: ErrorResponse = body_json(response).await;
        assert_eq!(json.error, "Username/password is incorrect");
    }

    #[tokio::test]
    async fn logout_clears_page_sessions() {
        let state = test_state("ok");
        let app = build_router(state.clone());
        let token = login(&app).await;

        let req = Request::builder()
            .method("POST")
            .uri("/pages/gemini/chat")
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(r#"{"message":"hi"}"#))
            .unwrap();
        app.clone().oneshot(req).await.unwrap();
        assert_eq!(state.sessions.len().await, 1);

        let req = Request::builder()
            .method("POST")
            .uri("/logout")
            .header("cookie", format!("other=1; llmdesk_session={token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: LogoutResponse = body_json(response).await;
        assert!(json.logged_out);
        assert!(state.sessions.is_empty().await);

        // The old token no longer opens a page.
        let req = Request::builder()
            .uri("/pages/gemini/turns")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn token_from_cookie_or_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("a=1; sid=abc.def"));
        assert_eq!(session_token(&headers, "sid").as_deref(), Some("abc.def"));
        assert_eq!(session_token(&headers, "missing"), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(session_token(&headers, "sid").as_deref(), Some("xyz"));
    }

    #[test]
    fn pipeline_errors_map_to_status_codes() {
        let cases = [
            (PipelineError::AuthenticationNotReady, StatusCode::UNAUTHORIZED),
            (PipelineError::AuthenticationFailed, StatusCode::UNAUTHORIZED),
            (PipelineError::EmptyQuestion, StatusCode::BAD_REQUEST),
            (PipelineError::UnknownPage("x".into()), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }
}
