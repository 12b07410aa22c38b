//! crates/chat_core/src/session_store.rs
//!
//! Per-user collection of chat sessions, mirrored to durable storage.
//!
//! The whole collection is written back after every mutation under
//! `chats_{email}`. There is one writer per user and no schema versioning.

use crate::domain::{ChatMessage, Session};
use crate::ports::{KeyValueStorage, PortError, PortResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Storage key for a user's session collection.
pub fn sessions_key(email: &str) -> String {
    format!("chats_{}", email)
}

/// Storage key for a user's sidebar visibility preference.
pub fn sidebar_key(email: &str) -> String {
    format!("sidebar_state_{}", email)
}

pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
    owner: String,
    sessions: Vec<Session>,
    active_id: Option<String>,
    /// Highest id handed out so far. Ids of deleted sessions are never reissued.
    last_issued: i64,
}

impl SessionStore {
    /// Rehydrates the collection stored for `owner`, or starts one with a single
    /// default session. The first stored session becomes active.
    pub async fn open(storage: Arc<dyn KeyValueStorage>, owner: &str) -> PortResult<Self> {
        let stored = storage.get_item(&sessions_key(owner)).await?;
        let sessions: Vec<Session> = match stored {
            Some(json) => serde_json::from_str(&json).map_err(|e| {
                PortError::Unexpected(format!("stored sessions for {} are unreadable: {}", owner, e))
            })?,
            None => Vec::new(),
        };

        let mut store = Self {
            storage,
            owner: owner.to_string(),
            active_id: sessions.first().map(|s| s.id.clone()),
            last_issued: sessions
                .iter()
                .filter_map(|s| s.id.parse::<i64>().ok())
                .max()
                .unwrap_or(0),
            sessions,
        };
        if store.sessions.is_empty() {
            store.create().await?;
        } else {
            info!("Rehydrated {} sessions for {}", store.sessions.len(), owner);
        }
        Ok(store)
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Session> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    /// Messages of the active session, empty if there is none.
    pub fn active_messages(&self) -> Vec<ChatMessage> {
        self.active().map(|s| s.messages.clone()).unwrap_or_default()
    }

    /// Inserts a new empty session at the front and makes it active.
    pub async fn create(&mut self) -> PortResult<&Session> {
        let now = Utc::now();
        let session = Session::new(self.next_id(now), now);
        debug!("Creating session {} for {}", session.id, self.owner);

        self.active_id = Some(session.id.clone());
        self.sessions.insert(0, session);
        self.persist().await?;
        Ok(&self.sessions[0])
    }

    /// Makes `id` the active session and returns its messages.
    pub fn select(&mut self, id: &str) -> PortResult<Vec<ChatMessage>> {
        let messages = self
            .get(id)
            .map(|s| s.messages.clone())
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", id)))?;
        self.active_id = Some(id.to_string());
        Ok(messages)
    }

    /// Removes a session. Returns `false` if no session had that id.
    ///
    /// When the active session is removed, the first remaining one takes its
    /// place, or a new session is created if none remain.
    pub async fn delete(&mut self, id: &str) -> PortResult<bool> {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        if self.sessions.len() == before {
            return Ok(false);
        }
        info!("Deleted session {} for {}", id, self.owner);

        if self.active_id.as_deref() == Some(id) {
            match self.sessions.first().map(|s| s.id.clone()) {
                Some(next) => self.active_id = Some(next),
                None => {
                    // create() persists the new collection as well.
                    self.create().await?;
                    return Ok(true);
                }
            }
        }
        self.persist().await?;
        Ok(true)
    }

    /// Appends a message to the session `id` and persists the collection.
    pub async fn append_message(&mut self, id: &str, message: ChatMessage) -> PortResult<()> {
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", id)))?;
        session.push(message, Utc::now());
        self.persist().await
    }

    async fn persist(&self) -> PortResult<()> {
        let json = serde_json::to_string(&self.sessions)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.storage.set_item(&sessions_key(&self.owner), &json).await
    }

    /// Millisecond timestamp of `now`, kept above every id issued before.
    fn next_id(&mut self, now: DateTime<Utc>) -> String {
        let mut millis = now.timestamp_millis().max(self.last_issued + 1);
        while self.get(&millis.to_string()).is_some() {
            millis += 1;
        }
        self.last_issued = millis;
        millis.to_string()
    }
}
