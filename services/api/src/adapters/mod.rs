pub mod db;
pub mod file_storage;
pub mod gemini_llm;

pub use db::DbAdapter;
pub use file_storage::FileStorageAdapter;
pub use gemini_llm::GeminiChatAdapter;
