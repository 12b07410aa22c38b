pub mod controller;
pub mod domain;
pub mod gateway;
pub mod ports;
pub mod session_store;
pub mod storage;

pub use controller::{ChatController, PendingTurn, Submission};
pub use domain::{ChatMessage, LoginError, LoginForm, Role, Session, UserIdentity};
pub use gateway::{fallback_reply, ChatGateway, FALLBACK_TEXT};
pub use ports::{ChatProvider, ChatService, GatewayError, KeyValueStorage, PortError, PortResult};
pub use session_store::SessionStore;
pub use storage::MemoryStorage;
