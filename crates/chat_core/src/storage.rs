//! crates/chat_core/src/storage.rs
//!
//! An in-process `KeyValueStorage`. Nothing survives the process; used for tests
//! and for throwaway servers.

use crate::ports::{KeyValueStorage, PortResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> PortResult<()> {
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
