//! crates/chat_core/src/controller.rs
//!
//! The chat controller: one per logged-in user. It owns the in-memory message
//! list for the active session, the session store, the loading flag and the
//! sidebar preference, and keeps the message list equal to the active session
//! after every mutation.
//!
//! A submission is split in two so the model call can run without holding the
//! controller: [`ChatController::begin_submit`] records the user turn and sets
//! the loading flag, [`ChatController::finish_submit`] records the reply.

use crate::domain::{ChatMessage, Session, UserIdentity};
use crate::gateway::fallback_reply;
use crate::ports::{ChatService, GatewayError, KeyValueStorage, PortResult};
use crate::session_store::{sidebar_key, SessionStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// A user turn that has been recorded and is waiting for its reply.
///
/// The controller stays loading for as long as the turn exists. Dropping it
/// without calling [`ChatController::finish_submit`] clears the flag too.
#[derive(Debug)]
pub struct PendingTurn {
    /// The session that was active when the turn was submitted.
    pub session_id: String,
    /// The conversation to hand to the chat service.
    pub transcript: Vec<ChatMessage>,
    _loading: LoadingGuard,
}

#[derive(Debug)]
struct LoadingGuard(Arc<AtomicBool>);

impl LoadingGuard {
    fn raise(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag.clone())
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Result of trying to start a submission.
#[derive(Debug)]
pub enum Submission {
    /// Input was empty or whitespace; nothing happened.
    Empty,
    /// A reply is still outstanding; nothing happened.
    Busy,
    Started(PendingTurn),
}

pub struct ChatController {
    user: UserIdentity,
    storage: Arc<dyn KeyValueStorage>,
    sessions: SessionStore,
    messages: Vec<ChatMessage>,
    loading: Arc<AtomicBool>,
    sidebar_open: bool,
}

impl ChatController {
    /// Builds the controller for a freshly logged-in user from durable storage.
    pub async fn login(storage: Arc<dyn KeyValueStorage>, user: UserIdentity) -> PortResult<Self> {
        let sessions = SessionStore::open(storage.clone(), &user.email).await?;
        let sidebar_open = storage
            .get_item(&sidebar_key(&user.email))
            .await?
            .map(|v| v == "true")
            .unwrap_or(true);

        info!("User {} logged in with {} sessions", user.email, sessions.sessions().len());
        Ok(Self {
            messages: sessions.active_messages(),
            user,
            storage,
            sessions,
            loading: Arc::new(AtomicBool::new(false)),
            sidebar_open,
        })
    }

    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    /// Takes the identity from a repeated login of the same user. Chats and the
    /// sidebar preference are kept as they are in memory.
    pub fn update_identity(&mut self, user: UserIdentity) {
        self.user = user;
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn sessions(&self) -> &[Session] {
        self.sessions.sessions()
    }

    pub fn active_session_id(&self) -> Option<&str> {
        self.sessions.active_id()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    //=====================================================================================
    // Submitting messages
    //=====================================================================================

    /// Records the user's message and marks the controller as loading.
    pub async fn begin_submit(&mut self, input: &str) -> PortResult<Submission> {
        if input.trim().is_empty() {
            return Ok(Submission::Empty);
        }
        if self.is_loading() {
            return Ok(Submission::Busy);
        }
        let Some(session_id) = self.sessions.active_id().map(str::to_string) else {
            return Ok(Submission::Empty);
        };

        let appended = self
            .sessions
            .append_message(&session_id, ChatMessage::user(input))
            .await;
        self.messages = self.sessions.active_messages();
        appended?;

        Ok(Submission::Started(PendingTurn {
            session_id,
            transcript: self.messages.clone(),
            _loading: LoadingGuard::raise(&self.loading),
        }))
    }

    /// Records the reply to `turn` and clears the loading flag.
    ///
    /// Errors from the chat service become the fallback reply. The reply goes to
    /// the session the turn was submitted in; it only shows up in the message
    /// list if that session is still active.
    pub async fn finish_submit(
        &mut self,
        turn: PendingTurn,
        outcome: Result<ChatMessage, GatewayError>,
    ) -> PortResult<ChatMessage> {
        let PendingTurn { session_id, _loading: loading, .. } = turn;
        drop(loading);
        let reply = outcome.unwrap_or_else(|e| {
            warn!("Chat service error for {}: {}", self.user.email, e);
            fallback_reply()
        });

        if self.sessions.get(&session_id).is_none() {
            warn!("Session {} was deleted before its reply arrived", session_id);
            return Ok(reply);
        }
        let appended = self
            .sessions
            .append_message(&session_id, reply.clone())
            .await;
        self.messages = self.sessions.active_messages();
        appended?;
        Ok(reply)
    }

    /// Runs a whole submission against `service`. Returns `None` for empty input
    /// or while another submission is outstanding.
    pub async fn submit(
        &mut self,
        input: &str,
        service: &dyn ChatService,
    ) -> PortResult<Option<ChatMessage>> {
        match self.begin_submit(input).await? {
            Submission::Started(turn) => {
                let outcome = service.reply(&turn.transcript).await;
                self.finish_submit(turn, outcome).await.map(Some)
            }
            Submission::Empty | Submission::Busy => Ok(None),
        }
    }

    //=====================================================================================
    // Session management
    //=====================================================================================

    pub async fn new_session(&mut self) -> PortResult<()> {
        self.sessions.create().await?;
        self.messages.clear();
        Ok(())
    }

    pub fn select_session(&mut self, id: &str) -> PortResult<()> {
        self.messages = self.sessions.select(id)?;
        Ok(())
    }

    /// Returns `false` if there was no such session.
    pub async fn delete_session(&mut self, id: &str) -> PortResult<bool> {
        let removed = self.sessions.delete(id).await?;
        self.messages = self.sessions.active_messages();
        Ok(removed)
    }

    //=====================================================================================
    // Sidebar preference
    //=====================================================================================

    pub async fn set_sidebar_open(&mut self, open: bool) -> PortResult<()> {
        self.sidebar_open = open;
        self.storage
            .set_item(&sidebar_key(&self.user.email), if open { "true" } else { "false" })
            .await
    }

    pub async fn toggle_sidebar(&mut self) -> PortResult<bool> {
        let open = !self.sidebar_open;
        self.set_sidebar_open(open).await?;
        Ok(open)
    }
}
