//! Append-only lead storage backed by SQLite.
//!
//! The capture pipeline only ever calls [`LeadStore::append`]. Reads exist
//! for the `leads` CLI subcommand. The schema is applied inline via
//! `include_str!` on open, and triggers reject `UPDATE`/`DELETE` on the
//! `leads` table.

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::trace;

use crate::leads::LeadRecord;

const SCHEMA_SQL: &str = include_str!("../../migrations/001_leads.sql");

/// Errors from lead storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable, append-only record of captured leads.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Persist a new lead and return its row id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails. Callers do not retry.
    async fn append(&self, record: &LeadRecord) -> Result<i64, StoreError>;
}

/// A row from the `leads` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLead {
    /// Row id.
    pub id: i64,
    /// Lead name.
    pub name: String,
    /// Contact detail.
    pub contact: String,
    /// Triggering user message.
    pub original_message: String,
    /// Capture time (RFC 3339).
    pub captured_at: String,
}

/// SQLite-backed [`LeadStore`].
#[derive(Debug, Clone)]
pub struct SqliteLeadStore {
    pool: SqlitePool,
}

impl SqliteLeadStore {
    /// Open (or create) the lead database at `path` and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema fails.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create lead db directory {}", parent.display())
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .pragma("trusted_schema", "OFF");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open lead db at {}", path.display()))?;

        Self::from_pool(pool)
            .await
            .context("failed to apply lead schema")
    }

    /// Wrap an existing pool, applying the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the schema cannot be applied.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Most recent leads first, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn recent(&self, limit: usize) -> Result<Vec<StoredLead>, StoreError> {
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<(i64, String, String, String, String)> = sqlx::query_as(
            "SELECT id, name, contact, original_message, captured_at \
             FROM leads \
             ORDER BY id DESC \
             LIMIT ?1",
        )
        .bind(limit_i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, name, contact, original_message, captured_at)| StoredLead {
                    id,
                    name,
                    contact,
                    original_message,
                    captured_at,
                },
            )
            .collect())
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl LeadStore for SqliteLeadStore {
    async fn append(&self, record: &LeadRecord) -> Result<i64, StoreError> {
        let result = sqlx::query(
            "INSERT INTO leads (name, contact, original_message, captured_at) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&record.name)
        .bind(&record.contact)
        .bind(&record.original_message)
        .bind(record.captured_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        trace!(lead_id = id, "lead row inserted");
        Ok(id)
    }
}
