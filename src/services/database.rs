use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::time::Duration;
use tokio::sync::OnceCell;
use uuid::Uuid;

use super::store::{with_id, ScanStore};
use crate::error::ScanError;

/// How long a request waits for a pooled connection before giving up.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// PostgreSQL-backed document collection (`scan_results`).
///
/// Documents live in a `JSON` column, which keeps the text as sent (including
/// `\u0000` escapes that `JSONB` refuses). Connections are opened on demand and
/// the table is created by the first operation that reaches the server, so a
/// database outage surfaces per request instead of at startup.
pub struct Database {
    pool: PgPool,
    schema: OnceCell<()>,
}

impl Database {
    /// Only a malformed connection string fails here.
    pub fn new(database_url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(database_url)?;

        Ok(Database {
            pool,
            schema: OnceCell::new(),
        })
    }

    /// Create `scan_results` if needed. Retried on the next call after a failure.
    pub async fn ensure_schema(&self) -> Result<(), ScanError> {
        self.schema
            .get_or_try_init(|| async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS scan_results (
                        id UUID PRIMARY KEY,
                        seq BIGSERIAL NOT NULL,
                        document JSON NOT NULL,
                        created_at TIMESTAMPTZ NOT NULL
                    )
                    "#,
                )
                .execute(&self.pool)
                .await?;
                log::info!("✅ scan_results table ready");
                Ok::<(), sqlx::Error>(())
            })
            .await?;

        Ok(())
    }

    /// Drain and close the pool on shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait::async_trait]
impl ScanStore for Database {
    async fn insert(&self, document: Value, created_at: DateTime<Utc>) -> Result<String, ScanError> {
        self.ensure_schema().await?;

        let id = Uuid::new_v4();
        let text = serde_json::to_string(&document).map_err(|e| ScanError::StoreOperation(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO scan_results (id, document, created_at)
            VALUES ($1, $2::json, $3)
            "#,
        )
        .bind(id)
        .bind(text)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(id.to_string())
    }

    async fn list_newest_first(&self) -> Result<Vec<Value>, ScanError> {
        self.ensure_schema().await?;

        let rows = sqlx::query(
            r#"
            SELECT id, document::text
            FROM scan_results
            ORDER BY created_at DESC, seq DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<Value, ScanError> {
                let id: Uuid = row.try_get(0)?;
                let text: String = row.try_get(1)?;
                let document: Value =
                    serde_json::from_str(&text).map_err(|e| ScanError::StoreOperation(e.to_string()))?;
                Ok(with_id(document, &id.to_string()))
            })
            .collect()
    }
}
