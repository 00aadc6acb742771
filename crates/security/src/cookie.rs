//! Signed session cookies.
//!
//! Token format: `base64url(payload) "." base64url(HMAC-SHA256(key, payload))`
//! where payload is `session_id|username|expires_unix`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use llmdesk_core::error::AuthError;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub session_id: String,
    pub username: String,
    /// Unix seconds
    pub expires_at: i64,
}

impl SessionCookie {
    fn payload(&self) -> String {
        format!("{}|{}|{}", self.session_id, self.username, self.expires_at)
    }

    fn parse(payload: &str) -> Result<Self, AuthError> {
        let (session_id, rest) = payload.split_once('|').ok_or(AuthError::MalformedToken)?;
        let (username, expires) = rest.rsplit_once('|').ok_or(AuthError::MalformedToken)?;
        let expires_at = expires.parse().map_err(|_| AuthError::MalformedToken)?;
        if session_id.is_empty() || username.is_empty() {
            return Err(AuthError::MalformedToken);
        }
        Ok(Self {
            session_id: session_id.to_string(),
            username: username.to_string(),
            expires_at,
        })
    }
}

/// Issues and verifies session tokens with one signing key.
#[derive(Clone)]
pub struct CookieSigner {
    name: String,
    key: Vec<u8>,
    expiry_days: u32,
}

impl std::fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSigner")
            .field("name", &self.name)
            .field("key", &"[REDACTED]")
            .field("expiry_days", &self.expiry_days)
            .finish()
    }
}

impl CookieSigner {
    pub fn new(name: impl Into<String>, key: impl AsRef<[u8]>, expiry_days: u32) -> Self {
        Self {
            name: name.into(),
            key: key.as_ref().to_vec(),
            expiry_days,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create a fresh session for `username` and its signed token.
    pub fn issue(&self, username: &str) -> (SessionCookie, String) {
        let cookie = SessionCookie {
            session_id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            expires_at: (Utc::now() + Duration::days(i64::from(self.expiry_days))).timestamp(),
        };
        let token = self.sign(&cookie);
        (cookie, token)
    }

    pub fn sign(&self, cookie: &SessionCookie) -> String {
        let payload = cookie.payload();
        let signature = self.mac(payload.as_bytes()).finalize().into_bytes();
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload.as_bytes()),
            URL_SAFE_NO_PAD.encode(signature)
        )
    }

    /// Check signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<SessionCookie, AuthError> {
        let (payload_b64, sig_b64) = token.trim().split_once('.').ok_or(AuthError::MalformedToken)?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AuthError::MalformedToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| AuthError::MalformedToken)?;

        self.mac(&payload)
            .verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let payload = String::from_utf8(payload).map_err(|_| AuthError::MalformedToken)?;
        let cookie = SessionCookie::parse(&payload)?;
        if cookie.expires_at <= Utc::now().timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(cookie)
    }

    /// `Set-Cookie` value that stores `token` in the browser.
    pub fn set_cookie_header(&self, token: &str) -> String {
        let max_age = i64::from(self.expiry_days) * 24 * 60 * 60;
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}",
            self.name, token
        )
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn clear_cookie_header(&self) -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", self.name)
    }

    fn mac(&self, payload: &[u8]) -> HmacSha256 {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.key)
            .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
        mac.update(payload);
        mac
    }
}

/// A random 32-byte signing key, hex encoded.
pub fn generate_key() -> String {
    use rand::Rng;
    let mut key = [0u8; 32];
    rand::rng().fill(&mut key[..]);
    hex::encode(key)
}
