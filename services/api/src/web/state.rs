//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-user controller registry.

use chat_core::controller::ChatController;
use chat_core::domain::UserIdentity;
use chat_core::ports::{ChatService, KeyValueStorage, PortResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

/// The controller of one logged-in user, shared between its requests.
pub type ControllerHandle = Arc<Mutex<ChatController>>;

/// Live logins. Each email has at most one token, and so at most one
/// controller writing its chats.
#[derive(Default)]
struct LoginTable {
    by_token: HashMap<String, ControllerHandle>,
    token_by_email: HashMap<String, String>,
}

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub storage: Arc<dyn KeyValueStorage>,
    pub chat: Arc<dyn ChatService>,
    logins: RwLock<LoginTable>,
}

impl AppState {
    pub fn new(storage: Arc<dyn KeyValueStorage>, chat: Arc<dyn ChatService>) -> Self {
        Self {
            storage,
            chat,
            logins: RwLock::new(LoginTable::default()),
        }
    }

    /// Logs `user` in under a fresh token and returns the token.
    ///
    /// A user who is already logged in keeps their controller; the earlier token
    /// stops working. Otherwise the controller is loaded from storage.
    pub async fn start_login(&self, user: UserIdentity) -> PortResult<String> {
        let mut guard = self.logins.write().await;
        let table = &mut *guard;

        let existing = table
            .token_by_email
            .remove(&user.email)
            .and_then(|old| table.by_token.remove(&old));
        let controller = match existing {
            Some(handle) => {
                info!("Replacing the earlier login of {}", user.email);
                handle.lock().await.update_identity(user.clone());
                handle
            }
            None => Arc::new(Mutex::new(
                ChatController::login(self.storage.clone(), user.clone()).await?,
            )),
        };

        let token = Uuid::new_v4().to_string();
        table.by_token.insert(token.clone(), controller);
        table.token_by_email.insert(user.email, token.clone());
        Ok(token)
    }

    pub async fn controller(&self, token: &str) -> Option<ControllerHandle> {
        self.logins.read().await.by_token.get(token).cloned()
    }

    /// Forgets a login. Returns `false` if the token was unknown.
    pub async fn end_login(&self, token: &str) -> bool {
        let mut table = self.logins.write().await;
        if table.by_token.remove(token).is_none() {
            return false;
        }
        table.token_by_email.retain(|_, t| t != token);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chat_core::domain::ChatMessage;
    use chat_core::ports::GatewayError;
    use chat_core::storage::MemoryStorage;

    struct EchoService;

    #[async_trait]
    impl ChatService for EchoService {
        async fn reply(&self, _messages: &[ChatMessage]) -> Result<ChatMessage, GatewayError> {
            Ok(ChatMessage::assistant("echo"))
        }
    }

    fn user(name: &str) -> UserIdentity {
        UserIdentity {
            email: "ada@example.com".into(),
            name: name.into(),
            id: "1".into(),
        }
    }

    #[tokio::test]
    async fn second_login_shares_controller_and_keeps_sessions() {
        let state = AppState::new(Arc::new(MemoryStorage::new()), Arc::new(EchoService));

        let first = state.start_login(user("User")).await.unwrap();
        let handle = state.controller(&first).await.unwrap();
        handle.lock().await.new_session().await.unwrap();

        let second = state.start_login(user("Ada")).await.unwrap();
        let again = state.controller(&second).await.unwrap();

        assert!(Arc::ptr_eq(&handle, &again));
        assert!(state.controller(&first).await.is_none());
        let controller = again.lock().await;
        assert_eq!(controller.sessions().len(), 2);
        assert_eq!(controller.user().name, "Ada");
    }

    #[tokio::test]
    async fn logout_then_login_reloads_from_storage() {
        let state = AppState::new(Arc::new(MemoryStorage::new()), Arc::new(EchoService));

        let first = state.start_login(user("User")).await.unwrap();
        let handle = state.controller(&first).await.unwrap();
        handle.lock().await.new_session().await.unwrap();
        assert!(state.end_login(&first).await);
        assert!(!state.end_login(&first).await);

        let second = state.start_login(user("User")).await.unwrap();
        let reloaded = state.controller(&second).await.unwrap();
        assert!(!Arc::ptr_eq(&handle, &reloaded));
        assert_eq!(reloaded.lock().await.sessions().len(), 2);
    }
}
