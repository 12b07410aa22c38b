//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the Postgres implementation of the
//! `KeyValueStorage` port from the `core` crate. Each storage key is one row of the
//! `local_storage` table.

use async_trait::async_trait;
use chat_core::ports::{KeyValueStorage, PortError, PortResult};
use sqlx::PgPool;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `KeyValueStorage` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// `KeyValueStorage` Trait Implementation
//=========================================================================================

#[async_trait]
impl KeyValueStorage for DbAdapter {
    async fn get_item(&self, key: &str) -> PortResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT value FROM local_storage WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn set_item(&self, key: &str, value: &str) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO local_storage (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}
