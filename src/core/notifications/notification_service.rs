// Notification dispatcher - creates notifications and answers the
// recipient's "what's new" queries.
//
// Every read or update is scoped to a viewer id. The store enforces the
// scoping so one user can never list, count or mark another user's rows.

use super::notification_models::{Notification, NotificationTrigger, NotificationType};
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Notification recipient id must not be empty")]
    InvalidRecipient,

    #[error("Stored notification has an unknown type: {0}")]
    InvalidType(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persist a freshly created notification.
    async fn insert(&self, notification: &Notification) -> Result<(), NotificationError>;

    /// The user's notifications, newest first, at most `limit`.
    async fn recent_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, NotificationError>;

    /// Mark one of the user's notifications read. Returns whether a row changed.
    async fn mark_read(&self, user_id: &str, notification_id: &str)
        -> Result<bool, NotificationError>;

    /// Mark all of the user's unread notifications read. Returns how many changed.
    async fn mark_all_read(&self, user_id: &str) -> Result<u64, NotificationError>;

    async fn unread_count(&self, user_id: &str) -> Result<u64, NotificationError>;

    /// Delete read notifications created before `cutoff`. Returns how many were removed.
    async fn delete_read_before(&self, cutoff: DateTime<Utc>) -> Result<u64, NotificationError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct NotificationService<S: NotificationStore> {
    store: S,
}

impl<S: NotificationStore> NotificationService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create an unread notification for `recipient_id`.
    ///
    /// Identical calls create identical, separate notifications. Storage
    /// errors are returned so the triggering action can see that its side
    /// effect failed.
    pub async fn create(
        &self,
        recipient_id: &str,
        notification_type: NotificationType,
        content: &str,
        reference_id: Option<&str>,
        reference_type: Option<&str>,
    ) -> Result<Notification, NotificationError> {
        if recipient_id.trim().is_empty() {
            return Err(NotificationError::InvalidRecipient);
        }

        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            user_id: recipient_id.to_string(),
            notification_type,
            content: content.to_string(),
            reference_id: reference_id.map(str::to_string),
            reference_type: reference_type.map(str::to_string),
            is_read: false,
            created_at: Utc::now().trunc_subsecs(6),
        };

        self.store.insert(&notification).await?;

        tracing::info!(
            notification_id = %notification.id,
            recipient_id,
            kind = %notification_type,
            "Notification created"
        );

        Ok(notification)
    }

    /// Create the notification that goes with a social action.
    pub async fn notify(&self, trigger: NotificationTrigger) -> Result<Notification, NotificationError> {
        let draft = trigger.into_draft();
        self.create(
            &draft.recipient_id,
            draft.notification_type,
            &draft.content,
            draft.reference_id.as_deref(),
            draft.reference_type.as_deref(),
        )
        .await
    }

    /// Newest first, at most `limit`. Each call is a fresh snapshot.
    pub async fn list_recent(
        &self,
        viewer_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, NotificationError> {
        self.store.recent_for_user(viewer_id, limit).await
    }

    /// Idempotent: marking an already-read or unknown notification does nothing.
    pub async fn mark_read(
        &self,
        viewer_id: &str,
        notification_id: &str,
    ) -> Result<(), NotificationError> {
        let changed = self.store.mark_read(viewer_id, notification_id).await?;
        if !changed {
            tracing::debug!(
                viewer_id,
                notification_id,
                "mark_read matched no unread notification"
            );
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, viewer_id: &str) -> Result<(), NotificationError> {
        let changed = self.store.mark_all_read(viewer_id).await?;
        tracing::debug!(viewer_id, changed, "Marked all notifications read");
        Ok(())
    }

    /// Size of the set `mark_all_read` would clear.
    pub async fn unread_count(&self, viewer_id: &str) -> Result<u64, NotificationError> {
        self.store.unread_count(viewer_id).await
    }

    /// Retention: drop read notifications older than `cutoff`. Unread ones are kept.
    pub async fn prune_read(&self, cutoff: DateTime<Utc>) -> Result<u64, NotificationError> {
        let removed = self.store.delete_read_before(cutoff).await?;
        tracing::info!(removed, cutoff = %cutoff, "Pruned read notifications");
        Ok(removed)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// In-memory store for testing. The sequence number breaks created_at ties.
    struct MockNotificationStore {
        rows: DashMap<String, (u64, Notification)>,
        seq: AtomicU64,
        fail_inserts: bool,
    }

    impl MockNotificationStore {
        fn new() -> Self {
            Self {
                rows: DashMap::new(),
                seq: AtomicU64::new(0),
                fail_inserts: false,
            }
        }
    }

    #[async_trait]
    impl NotificationStore for MockNotificationStore {
        async fn insert(&self, notification: &Notification) -> Result<(), NotificationError> {
            if self.fail_inserts {
                return Err(NotificationError::StorageError("connection refused".to_string()));
            }
            let seq = self.seq.fetch_add(1, Ordering::SeqCst);
            self.rows
                .insert(notification.id.clone(), (seq, notification.clone()));
            Ok(())
        }

        async fn recent_for_user(
            &self,
            user_id: &str,
            limit: usize,
        ) -> Result<Vec<Notification>, NotificationError> {
            let mut rows: Vec<(u64, Notification)> = self
                .rows
                .iter()
                .filter(|r| r.value().1.user_id == user_id)
                .map(|r| r.value().clone())
                .collect();
            rows.sort_by(|a, b| (b.1.created_at, b.0).cmp(&(a.1.created_at, a.0)));
            Ok(rows.into_iter().take(limit).map(|(_, n)| n).collect())
        }

        async fn mark_read(
            &self,
            user_id: &str,
            notification_id: &str,
        ) -> Result<bool, NotificationError> {
            match self.rows.get_mut(notification_id) {
                Some(mut row) if row.1.user_id == user_id && !row.1.is_read => {
                    row.1.is_read = true;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn mark_all_read(&self, user_id: &str) -> Result<u64, NotificationError> {
            let mut changed = 0;
            for mut row in self.rows.iter_mut() {
                if row.1.user_id == user_id && !row.1.is_read {
                    row.1.is_read = true;
                    changed += 1;
                }
            }
            Ok(changed)
        }

        async fn unread_count(&self, user_id: &str) -> Result<u64, NotificationError> {
            Ok(self
                .rows
                .iter()
                .filter(|r| r.value().1.user_id == user_id && !r.value().1.is_read)
                .count() as u64)
        }

        async fn delete_read_before(
            &self,
            cutoff: DateTime<Utc>,
        ) -> Result<u64, NotificationError> {
            let before = self.rows.len();
            self.rows
                .retain(|_, (_, n)| !(n.is_read && n.created_at < cutoff));
            Ok((before - self.rows.len()) as u64)
        }
    }

    fn service() -> NotificationService<MockNotificationStore> {
        NotificationService::new(MockNotificationStore::new())
    }

    #[tokio::test]
    async fn test_create_returns_unread_notification() {
        let service = service();

        let n = service
            .create("alice", NotificationType::Like, "bob liked your post", Some("p1"), Some("post"))
            .await
            .unwrap();

        assert_eq!(n.user_id, "alice");
        assert!(!n.is_read);
        assert_eq!(n.reference_id.as_deref(), Some("p1"));
        assert_eq!(service.unread_count("alice").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_repeated_triggers_are_not_deduplicated() {
        let service = service();

        for _ in 0..3 {
            service
                .notify(NotificationTrigger::Like {
                    recipient_id: "alice".to_string(),
                    actor_name: "bob".to_string(),
                    post_id: "p1".to_string(),
                })
                .await
                .unwrap();
        }

        let list = service.list_recent("alice", 50).await.unwrap();
        assert_eq!(list.len(), 3);
        assert!(list.iter().all(|n| n.content == "bob liked your post"));
    }

    #[tokio::test]
    async fn test_empty_recipient_is_rejected() {
        let service = service();

        let result = service
            .create("  ", NotificationType::System, "hi", None, None)
            .await;

        assert!(matches!(result, Err(NotificationError::InvalidRecipient)));
        assert!(service.store.rows.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let service = NotificationService::new(MockNotificationStore {
            fail_inserts: true,
            ..MockNotificationStore::new()
        });

        let result = service
            .create("alice", NotificationType::Follow, "bob started following you", None, None)
            .await;

        assert!(matches!(result, Err(NotificationError::StorageError(_))));
    }

    #[tokio::test]
    async fn test_mark_read_twice_is_harmless() {
        let service = service();
        let n = service
            .create("alice", NotificationType::Comment, "hey", None, None)
            .await
            .unwrap();

        service.mark_read("alice", &n.id).await.unwrap();
        service.mark_read("alice", &n.id).await.unwrap();

        let list = service.list_recent("alice", 10).await.unwrap();
        assert!(list[0].is_read);
        assert_eq!(service.unread_count("alice").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_read_ignores_other_users_notifications() {
        let service = service();
        let n = service
            .create("alice", NotificationType::Mention, "hey", None, None)
            .await
            .unwrap();

        service.mark_read("mallory", &n.id).await.unwrap();

        assert_eq!(service.unread_count("alice").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mark_all_read_clears_exactly_the_unread_set() {
        let service = service();
        let mut created = Vec::new();
        for i in 0..5 {
            created.push(
                service
                    .create("alice", NotificationType::Like, &format!("like {i}"), None, None)
                    .await
                    .unwrap(),
            );
        }
        service.create("bob", NotificationType::Like, "other", None, None).await.unwrap();

        service.mark_read("alice", &created[0].id).await.unwrap();
        service.mark_read("alice", &created[1].id).await.unwrap();
        assert_eq!(service.unread_count("alice").await.unwrap(), 3);

        service.mark_all_read("alice").await.unwrap();

        assert_eq!(service.unread_count("alice").await.unwrap(), 0);
        let list = service.list_recent("alice", 50).await.unwrap();
        assert_eq!(list.len(), 5);
        assert!(list.iter().all(|n| n.is_read));
        for original in &created[..2] {
            let after = list.iter().find(|n| n.id == original.id).unwrap();
            assert_eq!(after.created_at, original.created_at);
        }

        assert_eq!(service.unread_count("bob").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_recent_is_newest_first_and_capped() {
        let service = service();
        let t1 = service.create("alice", NotificationType::Like, "t1", None, None).await.unwrap();
        let t2 = service.create("alice", NotificationType::Like, "t2", None, None).await.unwrap();
        let t3 = service.create("alice", NotificationType::Like, "t3", None, None).await.unwrap();

        let list = service.list_recent("alice", 2).await.unwrap();

        let ids: Vec<&str> = list.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec![t3.id.as_str(), t2.id.as_str()]);
        assert!(!ids.contains(&t1.id.as_str()));
    }

    #[tokio::test]
    async fn test_prune_keeps_unread_notifications() {
        let service = service();
        let read = service.create("alice", NotificationType::Like, "old", None, None).await.unwrap();
        service.create("alice", NotificationType::Like, "new", None, None).await.unwrap();
        service.mark_read("alice", &read.id).await.unwrap();

        let removed = service
            .prune_read(Utc::now() + chrono::Duration::seconds(1))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        let list = service.list_recent("alice", 10).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].content, "new");
    }
}
