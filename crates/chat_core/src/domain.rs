//! crates/chat_core/src/domain.rs
//!
//! Defines the pure, core data structures for the chat application.
//! The serde representation of these types is also the durable storage format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used for a session that has no user message yet.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Number of characters kept from the first user message when deriving a title.
pub const TITLE_MAX_CHARS: usize = 25;

/// Name given to a user who logs in without registering.
pub const DEFAULT_USER_NAME: &str = "User";

/// The author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single role-tagged message. Never mutated once it is part of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// A titled, timestamped conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Session {
    /// Creates an empty session stamped with `now`.
    pub fn new(id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            last_updated: now,
        }
    }

    /// Appends a message, refreshing `last_updated` and the stored title.
    pub fn push(&mut self, message: ChatMessage, now: DateTime<Utc>) {
        self.messages.push(message);
        self.last_updated = now;
        self.title = self.display_title();
    }

    /// The title shown in a session list.
    pub fn display_title(&self) -> String {
        match self.messages.iter().find(|m| m.is_user()) {
            Some(first) => derive_title(&first.content),
            None if self.title.is_empty() => DEFAULT_TITLE.to_string(),
            None => self.title.clone(),
        }
    }
}

/// Truncates a message to [`TITLE_MAX_CHARS`] characters, adding `...` when cut.
pub fn derive_title(content: &str) -> String {
    if content.chars().count() > TITLE_MAX_CHARS {
        let head: String = content.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}

/// The identity of a logged-in user. Nothing about it is verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserIdentity {
    pub email: String,
    pub name: String,
    pub id: String,
}

/// Credentials as submitted by the login or signup form.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// Present only when registering a new account.
    pub name: Option<String>,
}

/// Login form rejection. The only check is that required fields are filled in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("Please fill in all fields")]
    MissingFields,
}

impl UserIdentity {
    /// Accepts any filled-in form. The password is never checked.
    pub fn sign_in(form: LoginForm, now: DateTime<Utc>) -> Result<Self, LoginError> {
        if form.email.is_empty() || form.password.is_empty() {
            return Err(LoginError::MissingFields);
        }
        let name = match form.name {
            Some(name) if name.is_empty() => return Err(LoginError::MissingFields),
            Some(name) => name,
            None => DEFAULT_USER_NAME.to_string(),
        };
        Ok(Self {
            email: form.email,
            name,
            id: now.timestamp_millis().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_first_25_chars_with_ellipsis() {
        let title = derive_title("Explain quantum computing in simple terms please");
        assert_eq!(title, "Explain quantum computing...");
    }

    #[test]
    fn short_message_is_kept_whole() {
        assert_eq!(derive_title("hi"), "hi");
        let exact: String = "a".repeat(TITLE_MAX_CHARS);
        assert_eq!(derive_title(&exact), exact);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let title = derive_title(&"é".repeat(30));
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS + 3);
    }

    #[test]
    fn display_title_uses_first_user_message() {
        let now = Utc::now();
        let mut session = Session::new("1".into(), now);
        assert_eq!(session.display_title(), DEFAULT_TITLE);

        session.push(ChatMessage::assistant("welcome"), now);
        assert_eq!(session.display_title(), DEFAULT_TITLE);

        session.push(ChatMessage::user("first question"), now);
        session.push(ChatMessage::user("second question"), now);
        assert_eq!(session.display_title(), "first question");
        assert_eq!(session.title, "first question");
    }

    #[test]
    fn session_serializes_with_camel_case_fields() {
        let session = Session::new("42".into(), Utc::now());
        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("lastUpdated").is_some());
        assert_eq!(json["title"], DEFAULT_TITLE);
    }

    #[test]
    fn message_roles_are_lowercase_on_the_wire() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }

    #[test]
    fn sign_in_accepts_any_filled_form() {
        let now = Utc::now();
        let user = UserIdentity::sign_in(
            LoginForm {
                email: "a@b.c".into(),
                password: "anything".into(),
                name: None,
            },
            now,
        )
        .unwrap();
        assert_eq!(user.name, DEFAULT_USER_NAME);
        assert_eq!(user.id, now.timestamp_millis().to_string());

        let missing = UserIdentity::sign_in(
            LoginForm {
                email: "a@b.c".into(),
                password: "pw".into(),
                name: Some(String::new()),
            },
            now,
        );
        assert_eq!(missing, Err(LoginError::MissingFields));
    }
}
