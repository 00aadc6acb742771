//! Configuration loading, validation, and management for llmdesk.
//!
//! Loads configuration from `~/.llmdesk/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default persona for the general chat page.
pub const DEFAULT_GEMINI_SYSTEM_PROMPT: &str = "\
Description: As a hardware and software expert, your job is to provide detailed and easy-to-understand explanations in Korean for inquiries or statements.
You need to explain complex concepts related to hardware and software in an easy-to-understand manner so that they can be understood by a wide audience.
Your goal is not only to simplify the explanation, but also to provide relevant examples wherever possible to enhance the questioner's understanding.

    Role: Hardware and software expert
    Goal: Help the questioner gain a comprehensive understanding of hardware and software concepts.

    Guidelines
    1. break down complex technical topics into simple, easy-to-understand explanations.
    2. Use clear, accessible language that individuals without a technical background can understand.
    3. Provide real-world examples or hypothetical scenarios to illustrate explanations and make abstract concepts concrete.
    4. Explain the \"how\" and \"why\" of processes and technologies to deepen the questioner's understanding.
    5. When discussing software, explain how the software interacts with hardware to perform its function.";

/// System prompt template for the search page. `{today}` is replaced with
/// the current date when the prompt is assembled.
pub const DEFAULT_SEARCH_SYSTEM_PROMPT: &str = "\
You are a helpful assistant that provides detailed answers based on search results.
Please provide search results based on the latest possible date.
Today's date is: {today}";

pub const DEFAULT_URL_SYSTEM_PROMPT: &str = "Answer the question to the point.";

const FLASH_THINKING: &str = "gemini-2.0-flash-thinking-exp-01-21";
const FLASH: &str = "gemini-2.0-flash-exp";

/// The root configuration structure.
///
/// Maps directly to `~/.llmdesk/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model provider (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Per-page settings
    #[serde(default)]
    pub pages: PagesConfig,

    /// Web search backend
    #[serde(default)]
    pub search: SearchConfig,

    /// Webpage loader
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Credentials and session cookie
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_provider() -> String {
    "gemini".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("providers", &self.providers)
            .field("pages", &self.pages)
            .field("search", &self.search)
            .field("loader", &self.loader)
            .field("gateway", &self.gateway)
            .field("auth", &self.auth)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

// --- Pages ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PagesConfig {
    #[serde(default)]
    pub gemini: GeminiPageConfig,

    #[serde(default)]
    pub search: SearchPageConfig,

    #[serde(default)]
    pub url: UrlPageConfig,
}

/// General chat page. Unbounded memory, editable persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiPageConfig {
    #[serde(default = "default_gemini_title")]
    pub title: String,

    #[serde(default = "default_two_models")]
    pub models: Vec<String>,

    #[serde(default = "default_flash_thinking")]
    pub default_model: String,

    /// 0 keeps every exchange
    #[serde(default)]
    pub token_budget: usize,

    #[serde(default = "default_gemini_system_prompt")]
    pub system_prompt: String,
}

fn default_gemini_title() -> String {
    "Gemini Chatbot".into()
}
fn default_two_models() -> Vec<String> {
    vec![FLASH_THINKING.into(), FLASH.into()]
}
fn default_flash_thinking() -> String {
    FLASH_THINKING.into()
}
fn default_gemini_system_prompt() -> String {
    DEFAULT_GEMINI_SYSTEM_PROMPT.into()
}

impl Default for GeminiPageConfig {
    fn default() -> Self {
        Self {
            title: default_gemini_title(),
            models: default_two_models(),
            default_model: default_flash_thinking(),
            token_budget: 0,
            system_prompt: default_gemini_system_prompt(),
        }
    }
}

/// Search-grounded page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPageConfig {
    #[serde(default = "default_search_title")]
    pub title: String,

    #[serde(default = "default_flash_only")]
    pub models: Vec<String>,

    #[serde(default = "default_flash")]
    pub default_model: String,

    #[serde(default = "default_search_budget")]
    pub token_budget: usize,

    #[serde(default = "default_search_system_prompt")]
    pub system_prompt: String,

    /// Number of search results requested per question (1..=10)
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_search_title() -> String {
    "🔍 Search Gemini".into()
}
fn default_flash_only() -> Vec<String> {
    vec![FLASH.into()]
}
fn default_flash() -> String {
    FLASH.into()
}
fn default_search_budget() -> usize {
    1000
}
fn default_search_system_prompt() -> String {
    DEFAULT_SEARCH_SYSTEM_PROMPT.into()
}
fn default_max_results() -> usize {
    5
}

impl Default for SearchPageConfig {
    fn default() -> Self {
        Self {
            title: default_search_title(),
            models: default_flash_only(),
            default_model: default_flash(),
            token_budget: default_search_budget(),
            system_prompt: default_search_system_prompt(),
            max_results: default_max_results(),
        }
    }
}

/// Webpage-grounded page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlPageConfig {
    #[serde(default = "default_url_title")]
    pub title: String,

    #[serde(default = "default_two_models")]
    pub models: Vec<String>,

    #[serde(default = "default_flash_thinking")]
    pub default_model: String,

    #[serde(default = "default_url_budget")]
    pub token_budget: usize,

    #[serde(default = "default_url_system_prompt")]
    pub system_prompt: String,

    /// Chunk size in characters for splitting loaded pages
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_url_title() -> String {
    "Webpage Summary".into()
}
fn default_url_budget() -> usize {
    2000
}
fn default_url_system_prompt() -> String {
    DEFAULT_URL_SYSTEM_PROMPT.into()
}
fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}

impl Default for UrlPageConfig {
    fn default() -> Self {
        Self {
            title: default_url_title(),
            models: default_two_models(),
            default_model: default_flash_thinking(),
            token_budget: default_url_budget(),
            system_prompt: default_url_system_prompt(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

// --- Enrichment backends ---

#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_search_api_url")]
    pub api_url: String,
}

fn default_search_api_url() -> String {
    "https://api.tavily.com".into()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_search_api_url(),
        }
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Responses larger than this are truncated
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!("llmdesk/{}", env!("CARGO_PKG_VERSION"))
}
fn default_max_bytes() -> usize {
    2 * 1024 * 1024
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
        }
    }
}

// --- Gateway ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8501
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

// --- Auth ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub cookie: CookieConfig,

    /// Keyed by username
    #[serde(default)]
    pub credentials: HashMap<String, CredentialConfig>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    #[serde(default = "default_cookie_name")]
    pub name: String,

    /// HMAC signing key. Empty means a random key is generated per process.
    #[serde(default)]
    pub key: String,

    #[serde(default = "default_expiry_days")]
    pub expiry_days: u32,
}

fn default_cookie_name() -> String {
    "llmdesk_session".into()
}
fn default_expiry_days() -> u32 {
    30
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            key: String::new(),
            expiry_days: default_expiry_days(),
        }
    }
}

impl std::fmt::Debug for CookieConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = if self.key.is_empty() { "None" } else { "[REDACTED]" };
        f.debug_struct("CookieConfig")
            .field("name", &self.name)
            .field("key", &key)
            .field("expiry_days", &self.expiry_days)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// Display name shown after login
    pub name: String,

    #[serde(default)]
    pub email: String,

    /// Hex SHA-256 of `"{username}:{password}"`
    pub password_hash: String,
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.llmdesk/config.toml).
    ///
    /// Also checks environment variables:
    /// - `LLMDESK_API_KEY` (highest priority), `GEMINI_API_KEY`, `GOOGLE_API_KEY`
    /// - `TAVILY_API_KEY` for the search backend
    /// - `LLMDESK_PROVIDER` to override the default provider
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("LLMDESK_API_KEY")
                .ok()
                .or_else(|| std::env::var("GEMINI_API_KEY").ok())
                .or_else(|| std::env::var("GOOGLE_API_KEY").ok());
        }

        if config.search.api_key.is_none() {
            config.search.api_key = std::env::var("TAVILY_API_KEY").ok();
        }

        if let Ok(provider) = std::env::var("LLMDESK_PROVIDER") {
            config.default_provider = provider;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".llmdesk")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pages = &self.pages;
        check_models("gemini", &pages.gemini.models, &pages.gemini.default_model)?;
        check_models("search", &pages.search.models, &pages.search.default_model)?;
        check_models("url", &pages.url.models, &pages.url.default_model)?;

        if !(1..=10).contains(&pages.search.max_results) {
            return Err(ConfigError::ValidationError(
                "pages.search.max_results must be between 1 and 10".into(),
            ));
        }

        if pages.url.chunk_size == 0 || pages.url.chunk_overlap >= pages.url.chunk_size {
            return Err(ConfigError::ValidationError(
                "pages.url.chunk_overlap must be smaller than a non-zero chunk_size".into(),
            ));
        }

        if self.auth.cookie.expiry_days == 0 {
            return Err(ConfigError::ValidationError(
                "auth.cookie.expiry_days must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if a model API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn check_models(page: &str, models: &[String], default_model: &str) -> Result<(), ConfigError> {
    if models.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "pages.{page}.models must not be empty"
        )));
    }
    if !models.iter().any(|m| m == default_model) {
        return Err(ConfigError::ValidationError(format!(
            "pages.{page}.default_model '{default_model}' is not in pages.{page}.models"
        )));
    }
    Ok(())
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            providers: HashMap::new(),
            pages: PagesConfig::default(),
            search: SearchConfig::default(),
            loader: LoaderConfig::default(),
            gateway: GatewayConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.pages.gemini.token_budget, 0);
        assert_eq!(config.pages.search.token_budget, 1000);
        assert_eq!(config.pages.url.token_budget, 2000);
        assert_eq!(config.pages.search.models, vec!["gemini-2.0-flash-exp"]);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.pages.url.chunk_size, 1000);
    }

    #[test]
    fn temperature_is_not_a_setting() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "temperature = 0.7").unwrap();
        let config = AppConfig::load_from(file.path()).unwrap();

        let written = toml::to_string_pretty(&config).unwrap();
        assert!(!written.contains("temperature"));
        assert!(!AppConfig::default_toml().contains("temperature"));
    }

    #[test]
    fn default_model_outside_allow_list_rejected() {
        let mut config = AppConfig::default();
        config.pages.search.default_model = "gemini-2.0-flash-thinking-exp-01-21".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pages.search.default_model"));
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let mut config = AppConfig::default();
        config.pages.url.chunk_overlap = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn max_results_range_enforced() {
        let mut config = AppConfig::default();
        config.pages.search.max_results = 11;
        assert!(config.validate().is_err());
        config.pages.search.max_results = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        let config = result.unwrap();
        assert_eq!(config.default_provider, "gemini");
    }

    #[test]
    fn partial_page_section_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[pages.search]
token_budget = 500

[auth.credentials.alice]
name = "Alice"
password_hash = "abc"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.pages.search.token_budget, 500);
        assert_eq!(config.pages.search.max_results, 5);
        assert_eq!(config.pages.search.title, "🔍 Search Gemini");
        assert_eq!(config.auth.credentials["alice"].name, "Alice");
    }

    #[test]
    fn invalid_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[gateway]\nport = \"eighty\"").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        config.auth.cookie.key = "cookie-secret".into();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("cookie-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemini-2.0-flash-exp"));
        assert!(toml_str.contains("8501"));
    }
}
