//! Resolves credentials and session tokens into an [`AuthStatus`].

use crate::audit::{AuditEvent, AuditLogger, AuditOutcome, AuditSink, TracingSink};
use crate::cookie::{CookieSigner, SessionCookie, generate_key};
use crate::password::verify_password;
use llmdesk_config::{AuthConfig, CredentialConfig};
use llmdesk_core::auth::{AuthStatus, AuthenticatedUser};
use llmdesk_core::error::AuthError;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::{info, warn};

/// A freshly issued session after a successful login.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub cookie: SessionCookie,
    /// Signed token for the cookie value or a bearer header.
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub status: AuthStatus,
    pub session: Option<IssuedSession>,
}

pub struct Authenticator {
    credentials: HashMap<String, CredentialConfig>,
    signer: CookieSigner,
    /// Logged-out session ids and when their tokens expire.
    revoked: RwLock<HashMap<String, i64>>,
    audit: AuditLogger,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("users", &self.credentials.len())
            .field("signer", &self.signer)
            .finish()
    }
}

impl Authenticator {
    pub fn from_config(config: &AuthConfig) -> Self {
        let key = if config.cookie.key.is_empty() {
            warn!("No cookie key configured; sessions will not survive a restart");
            generate_key()
        } else {
            config.cookie.key.clone()
        };
        let sinks: Vec<Box<dyn AuditSink>> = vec![Box::new(TracingSink)];

        Self {
            credentials: config.credentials.clone(),
            signer: CookieSigner::new(&config.cookie.name, key, config.cookie.expiry_days),
            revoked: RwLock::new(HashMap::new()),
            audit: AuditLogger::with_sinks(sinks),
        }
    }

    pub fn signer(&self) -> &CookieSigner {
        &self.signer
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn login(&self, username: &str, password: &str) -> LoginOutcome {
        let username = username.trim();
        let matched = self
            .credentials
            .get(username)
            .filter(|cred| verify_password(username, password, &cred.password_hash));

        let Some(credential) = matched else {
            self.audit.log(
                AuditEvent::LoginAttempt,
                username,
                AuditOutcome::Denied,
                Some("username/password mismatch".into()),
            );
            return LoginOutcome {
                status: AuthStatus::Failed,
                session: None,
            };
        };

        let (cookie, token) = self.signer.issue(username);
        self.audit
            .log(AuditEvent::LoginAttempt, username, AuditOutcome::Success, None);
        info!(user = %username, session = %cookie.session_id, "Login succeeded");

        LoginOutcome {
            status: AuthStatus::Succeeded(user_for(username, credential)),
            session: Some(IssuedSession { cookie, token }),
        }
    }

    /// Status of the session carried by `token`.
    pub fn status(&self, token: Option<&str>) -> AuthStatus {
        match token.map(str::trim).filter(|t| !t.is_empty()) {
            None => AuthStatus::NotAttempted,
            Some(token) => match self.resolve(token) {
                Ok((cookie, user)) if !self.is_revoked(&cookie.session_id) => {
                    AuthStatus::Succeeded(user)
                }
                // A logged-out session reads as never logged in.
                Ok(_) => AuthStatus::NotAttempted,
                Err(err) => {
                    self.audit.log(
                        AuditEvent::SessionRejected {
                            reason: err.to_string(),
                        },
                        "anonymous",
                        AuditOutcome::Denied,
                        None,
                    );
                    AuthStatus::Failed
                }
            },
        }
    }

    /// Verify a token and return its claims alongside the user.
    pub fn resolve(&self, token: &str) -> Result<(SessionCookie, AuthenticatedUser), AuthError> {
        let cookie = self.signer.verify(token)?;
        let credential = self
            .credentials
            .get(&cookie.username)
            .ok_or_else(|| AuthError::UnknownUser(cookie.username.clone()))?;
        let user = user_for(&cookie.username, credential);
        Ok((cookie, user))
    }

    /// End the session behind `token`. Returns its session id when valid.
    pub fn logout(&self, token: &str) -> Option<String> {
        let (cookie, _) = self.resolve(token).ok()?;
        {
            let now = Utc::now().timestamp();
            let mut revoked = self.revoked.write().unwrap_or_else(PoisonError::into_inner);
            // Expired tokens fail verification anyway.
            revoked.retain(|_, expires_at| *expires_at > now);
            revoked.insert(cookie.session_id.clone(), cookie.expires_at);
        }
        self.audit.log(
            AuditEvent::Logout {
                session_id: cookie.session_id.clone(),
            },
            &cookie.username,
            AuditOutcome::Success,
            None,
        );
        info!(user = %cookie.username, session = %cookie.session_id, "Logged out");
        Some(cookie.session_id)
    }

    fn is_revoked(&self, session_id: &str) -> bool {
        self.revoked
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(session_id)
    }
}

/// Banner shown after a successful login.
pub fn welcome(user: &AuthenticatedUser) -> String {
    format!("Welcome *{}*", user.display_name)
}

fn user_for(username: &str, credential: &CredentialConfig) -> AuthenticatedUser {
    let display_name = if credential.name.is_empty() {
        username.to_string()
    } else {
        credential.name.clone()
    };
    AuthenticatedUser {
        username: username.to_string(),
        display_name,
    }
}
