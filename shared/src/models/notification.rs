//! In-app notification records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub title: String,
    pub message: String,
    pub document_type: String,
    pub document_id: Uuid,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// A notification to be written inside a document transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub recipients: Vec<Uuid>,
    pub title: String,
    pub message: String,
    pub document_type: &'static str,
    pub document_id: Uuid,
}

impl NotificationDraft {
    /// Drop the actor and duplicate recipients; nobody is notified of their own action
    pub fn without_actor(mut self, actor_id: Uuid) -> Self {
        self.recipients.retain(|r| *r != actor_id);
        self.recipients.sort();
        self.recipients.dedup();
        self
    }
}
