// SQLite-backed moderation audit log.
//
// Tables:
// - content_filter_logs: one row per classification attempt, never updated

use crate::core::moderation::{
    ContentCategory, ContentFilterLogEntry, ContentFilterLogStore, LogFilter, ModerationError,
    NewContentFilterLog,
};
use crate::infra::database::{format_timestamp, parse_timestamp};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteFilterLogStore {
    pool: Pool<Sqlite>,
}

impl SqliteFilterLogStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), ModerationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS content_filter_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT NOT NULL,
                user_id TEXT NOT NULL,
                is_acceptable BOOLEAN NOT NULL,
                reason TEXT,
                category TEXT NOT NULL CHECK (category IN (
                    'PROFANITY', 'SELF_ADVERTISEMENT', 'HATE_SPEECH', 'HARASSMENT', 'ACCEPTABLE'
                )),
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_content_filter_logs_created
                ON content_filter_logs(created_at);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        Ok(())
    }
}

fn row_to_entry(row: &SqliteRow) -> Result<ContentFilterLogEntry, ModerationError> {
    let category: String = row.get("category");
    let category = category
        .parse::<ContentCategory>()
        .map_err(ModerationError::StorageError)?;
    let created_at: String = row.get("created_at");
    let created_at =
        parse_timestamp(&created_at).map_err(|e| ModerationError::StorageError(e.to_string()))?;

    Ok(ContentFilterLogEntry {
        id: row.get("id"),
        content: row.get("content"),
        user_id: row.get("user_id"),
        is_acceptable: row.get("is_acceptable"),
        reason: row.get("reason"),
        category,
        created_at,
    })
}

#[async_trait]
impl ContentFilterLogStore for SqliteFilterLogStore {
    async fn append(
        &self,
        entry: NewContentFilterLog,
    ) -> Result<ContentFilterLogEntry, ModerationError> {
        let result = sqlx::query(
            r#"
            INSERT INTO content_filter_logs (content, user_id, is_acceptable, reason, category, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.content)
        .bind(&entry.user_id)
        .bind(entry.is_acceptable)
        .bind(&entry.reason)
        .bind(entry.category.as_str())
        .bind(format_timestamp(&entry.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        Ok(ContentFilterLogEntry {
            id: result.last_insert_rowid(),
            content: entry.content,
            user_id: entry.user_id,
            is_acceptable: entry.is_acceptable,
            reason: entry.reason,
            category: entry.category,
            created_at: entry.created_at,
        })
    }

    async fn recent(
        &self,
        filter: LogFilter,
        limit: usize,
    ) -> Result<Vec<ContentFilterLogEntry>, ModerationError> {
        let rows = match filter.acceptance() {
            Some(accepted) => {
                sqlx::query(
                    r#"
                    SELECT id, content, user_id, is_acceptable, reason, category, created_at
                    FROM content_filter_logs
                    WHERE is_acceptable = ?
                    ORDER BY created_at DESC, id DESC
                    LIMIT ?
                    "#,
                )
                .bind(accepted)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, content, user_id, is_acceptable, reason, category, created_at
                    FROM content_filter_logs
                    ORDER BY created_at DESC, id DESC
                    LIMIT ?
                    "#,
                )
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        rows.iter().map(row_to_entry).collect()
    }
}
