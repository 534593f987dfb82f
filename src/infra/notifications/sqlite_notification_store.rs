// SQLite-backed notification store.
//
// Tables:
// - notifications: one row per notification, keyed by a UUID string
//
// Every query that reads or updates rows filters on user_id.

use crate::core::notifications::{
    Notification, NotificationError, NotificationStore, NotificationType,
};
use crate::infra::database::{format_timestamp, parse_timestamp};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteNotificationStore {
    pool: Pool<Sqlite>,
}

impl SqliteNotificationStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), NotificationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notifications (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('like', 'comment', 'follow', 'mention', 'system')),
                content TEXT NOT NULL,
                reference_id TEXT,
                reference_type TEXT,
                is_read BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_notifications_user_created
                ON notifications(user_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_notifications_user_unread
                ON notifications(user_id, is_read);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| NotificationError::StorageError(e.to_string()))?;

        Ok(())
    }
}

fn row_to_notification(row: &SqliteRow) -> Result<Notification, NotificationError> {
    let kind: String = row.get("type");
    let notification_type = kind
        .parse::<NotificationType>()
        .map_err(|_| NotificationError::InvalidType(kind.clone()))?;
    let created_at: String = row.get("created_at");
    let created_at = parse_timestamp(&created_at)
        .map_err(|e| NotificationError::StorageError(e.to_string()))?;

    Ok(Notification {
        id: row.get("id"),
        user_id: row.get("user_id"),
        notification_type,
        content: row.get("content"),
        reference_id: row.get("reference_id"),
        reference_type: row.get("reference_type"),
        is_read: row.get("is_read"),
        created_at,
    })
}

#[async_trait]
impl NotificationStore for SqliteNotificationStore {
    async fn insert(&self, notification: &Notification) -> Result<(), NotificationError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, type, content, reference_id, reference_type, is_read, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.user_id)
        .bind(notification.notification_type.as_str())
        .bind(&notification.content)
        .bind(&notification.reference_id)
        .bind(&notification.reference_type)
        .bind(notification.is_read)
        .bind(format_timestamp(&notification.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| NotificationError::StorageError(e.to_string()))?;

        Ok(())
    }

    async fn recent_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, NotificationError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, type, content, reference_id, reference_type, is_read, created_at
            FROM notifications
            WHERE user_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| NotificationError::StorageError(e.to_string()))?;

        rows.iter().map(row_to_notification).collect()
    }

    async fn mark_read(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> Result<bool, NotificationError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ? AND is_read = 0",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| NotificationError::StorageError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: &str) -> Result<u64, NotificationError> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(|e| NotificationError::StorageError(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn unread_count(&self, user_id: &str) -> Result<u64, NotificationError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS unread FROM notifications WHERE user_id = ? AND is_read = 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| NotificationError::StorageError(e.to_string()))?;

        let unread: i64 = row.get("unread");
        Ok(unread as u64)
    }

    async fn delete_read_before(&self, cutoff: DateTime<Utc>) -> Result<u64, NotificationError> {
        let result = sqlx::query("DELETE FROM notifications WHERE is_read = 1 AND created_at < ?")
            .bind(format_timestamp(&cutoff))
            .execute(&self.pool)
            .await
            .map_err(|e| NotificationError::StorageError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
