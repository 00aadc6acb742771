//! Security module for llmdesk: login, session cookies, and audit logging.
//!
//! Provides:
//! - **Passwords**: unsalted SHA-256 digests of `username:password`
//! - **Cookies**: HMAC-signed, expiring session tokens
//! - **Authenticator**: resolves a request's token into an `AuthStatus`
//! - **Audit logging**: structured login/logout event logging

pub mod audit;
pub mod authenticator;
pub mod cookie;
pub mod password;

pub use audit::{AuditEntry, AuditEvent, AuditLogger, AuditOutcome, AuditSink, TracingSink};
pub use authenticator::{Authenticator, IssuedSession, LoginOutcome, welcome};
pub use cookie::{CookieSigner, SessionCookie, generate_key};
pub use password::{hash_password, verify_password};
