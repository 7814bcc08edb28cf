use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use page_state::SessionStorage;
use serde_json::Value;
use shared::domain::SessionId;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

/// Durable session storage. Rows are scoped by session so several browser
/// sessions can share one database file.
#[derive(Clone)]
pub struct SqliteSessionStorage {
    pool: Pool<Sqlite>,
    session_id: SessionId,
}

#[derive(Debug, Clone)]
pub struct StoredPageState {
    pub storage_key: String,
    pub value: Value,
    pub updated_at: DateTime<Utc>,
}

impl SqliteSessionStorage {
    pub async fn new(database_url: &str, session_id: SessionId) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open session storage at '{database_url}'"))?;

        let storage = Self { pool, session_id };
        storage.ensure_schema().await?;
        Ok(storage)
    }

    /// Another session's view of the same database.
    pub fn for_session(&self, session_id: SessionId) -> Self {
        Self {
            pool: self.pool.clone(),
            session_id,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_page_state (
                session_id  TEXT NOT NULL,
                storage_key TEXT NOT NULL,
                value_json  TEXT NOT NULL,
                updated_at  TEXT NOT NULL,
                PRIMARY KEY (session_id, storage_key)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure session_page_state table exists")?;
        Ok(())
    }

    pub async fn list_entries(&self) -> Result<Vec<StoredPageState>> {
        let rows = sqlx::query(
            "SELECT storage_key, value_json, updated_at FROM session_page_state
             WHERE session_id = ? ORDER BY storage_key",
        )
        .bind(self.session_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<StoredPageState> {
                let storage_key: String = row.try_get("storage_key")?;
                let raw: String = row.try_get("value_json")?;
                let value = serde_json::from_str(&raw).with_context(|| {
                    format!("stored page state '{storage_key}' is not valid json")
                })?;
                Ok(StoredPageState {
                    storage_key,
                    value,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }

    pub async fn keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT storage_key FROM session_page_state WHERE session_id = ? ORDER BY storage_key",
        )
        .bind(self.session_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.get::<String, _>(0)).collect())
    }

    pub async fn remove(&self, key: &str) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM session_page_state WHERE session_id = ? AND storage_key = ?")
                .bind(self.session_id.to_string())
                .bind(key)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drops every entry of this session and returns how many were removed.
    pub async fn clear_session(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM session_page_state WHERE session_id = ?")
            .bind(self.session_id.to_string())
            .execute(&self.pool)
            .await?;
        debug!(
            session_id = %self.session_id,
            removed = result.rows_affected(),
            "cleared session state"
        );
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SessionStorage for SqliteSessionStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let row = sqlx::query(
            "SELECT value_json FROM session_page_state WHERE session_id = ? AND storage_key = ?",
        )
        .bind(self.session_id.to_string())
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get(0)?;
        let value = serde_json::from_str(&raw)
            .with_context(|| format!("stored page state '{key}' is not valid json"))?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        sqlx::query(
            "INSERT INTO session_page_state (session_id, storage_key, value_json, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(session_id, storage_key) DO UPDATE SET
                value_json = excluded.value_json,
                updated_at = excluded.updated_at",
        )
        .bind(self.session_id.to_string())
        .bind(key)
        .bind(value.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to store page state '{key}'"))?;
        Ok(())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
