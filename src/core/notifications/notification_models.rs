// Notification domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How many notifications a listing returns when the caller doesn't say.
pub const DEFAULT_NOTIFICATION_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Like,
    Comment,
    Follow,
    Mention,
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Like => "like",
            NotificationType::Comment => "comment",
            NotificationType::Follow => "follow",
            NotificationType::Mention => "mention",
            NotificationType::System => "system",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(NotificationType::Like),
            "comment" => Ok(NotificationType::Comment),
            "follow" => Ok(NotificationType::Follow),
            "mention" => Ok(NotificationType::Mention),
            "system" => Ok(NotificationType::System),
            other => Err(format!("unknown notification type: {other}")),
        }
    }
}

/// A message telling a user that someone acted on them or their content.
///
/// Only `is_read` ever changes after creation, and only from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    /// Recipient profile id.
    pub user_id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub content: String,
    pub reference_id: Option<String>,
    pub reference_type: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A social action that should notify someone.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationTrigger {
    Like {
        recipient_id: String,
        actor_name: String,
        post_id: String,
    },
    Comment {
        recipient_id: String,
        actor_name: String,
        post_id: String,
    },
    Follow {
        recipient_id: String,
        actor_name: String,
        actor_id: String,
    },
    /// References the profile of whoever wrote the mention.
    Mention {
        recipient_id: String,
        actor_name: String,
        actor_id: String,
    },
    System {
        recipient_id: String,
        message: String,
    },
}

/// Everything `NotificationService::create` needs, derived from a trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub recipient_id: String,
    pub notification_type: NotificationType,
    pub content: String,
    pub reference_id: Option<String>,
    pub reference_type: Option<String>,
}

impl NotificationTrigger {
    pub fn into_draft(self) -> NotificationDraft {
        match self {
            NotificationTrigger::Like {
                recipient_id,
                actor_name,
                post_id,
            } => NotificationDraft {
                recipient_id,
                notification_type: NotificationType::Like,
                content: format!("{actor_name} liked your post"),
                reference_id: Some(post_id),
                reference_type: Some("post".to_string()),
            },
            NotificationTrigger::Comment {
                recipient_id,
                actor_name,
                post_id,
            } => NotificationDraft {
                recipient_id,
                notification_type: NotificationType::Comment,
                content: format!("{actor_name} commented on your post"),
                reference_id: Some(post_id),
                reference_type: Some("post".to_string()),
            },
            NotificationTrigger::Follow {
                recipient_id,
                actor_name,
                actor_id,
            } => NotificationDraft {
                recipient_id,
                notification_type: NotificationType::Follow,
                content: format!("{actor_name} started following you"),
                reference_id: Some(actor_id),
                reference_type: Some("profile".to_string()),
            },
            NotificationTrigger::Mention {
                recipient_id,
                actor_name,
                actor_id,
            } => NotificationDraft {
                recipient_id,
                notification_type: NotificationType::Mention,
                content: format!("{actor_name} mentioned you in a post"),
                reference_id: Some(actor_id),
                reference_type: Some("profile".to_string()),
            },
            NotificationTrigger::System {
                recipient_id,
                message,
            } => NotificationDraft {
                recipient_id,
                notification_type: NotificationType::System,
                content: message,
                reference_id: None,
                reference_type: None,
            },
        }
    }
}
