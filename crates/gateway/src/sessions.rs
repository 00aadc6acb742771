//! Per-(login session, page) chat state.

use chrono::{DateTime, Utc};
use llmdesk_pipeline::{PageKind, PageSession};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Maximum number of page sessions held in memory before the oldest is evicted.
pub const MAX_SESSIONS: usize = 10_000;

pub type SessionKey = (String, PageKind);

struct SessionEntry {
    created_at: DateTime<Utc>,
    session: Arc<Mutex<PageSession>>,
}

/// Page sessions keyed by login session id and page.
///
/// Each entry has its own mutex so one user's turns run one at a time
/// while other sessions proceed.
pub struct SessionRegistry {
    entries: RwLock<HashMap<SessionKey, SessionEntry>>,
    capacity: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_capacity(MAX_SESSIONS)
    }
}

impl SessionRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// The session for `(session_id, kind)`, created on first use.
    pub async fn get_or_create(&self, session_id: &str, kind: PageKind) -> Arc<Mutex<PageSession>> {
        let key = (session_id.to_string(), kind);
        if let Some(entry) = self.entries.read().await.get(&key) {
            return entry.session.clone();
        }

        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(&key) {
            return entry.session.clone();
        }

        if entries.len() >= self.capacity {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| k.clone())
            {
                debug!(session = %oldest.0, page = %oldest.1, "Evicting oldest page session");
                entries.remove(&oldest);
            }
        }

        let session = Arc::new(Mutex::new(PageSession::new(kind)));
        entries.insert(
            key,
            SessionEntry {
                created_at: Utc::now(),
                session: session.clone(),
            },
        );
        session
    }

    /// Existing session for `(session_id, kind)`, if any.
    pub async fn get(&self, session_id: &str, kind: PageKind) -> Option<Arc<Mutex<PageSession>>> {
        self.entries
            .read()
            .await
            .get(&(session_id.to_string(), kind))
            .map(|e| e.session.clone())
    }

    /// Drop every page of one login session. Returns how many were removed.
    pub async fn remove_all(&self, session_id: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|(id, _), _| id != session_id);
        let removed = before - entries.len();
        if removed > 0 {
            info!(session = %session_id, pages = removed, "Page sessions cleared");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
