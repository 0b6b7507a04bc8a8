//! In-app notifications
//!
//! Document services enqueue rows through [`notify`] on their open unit of
//! work, so a notification exists exactly when its status change committed.
//! Delivery beyond the in-app list is out of scope.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use shared::{Notification, NotificationDraft, PaginatedResponse, Pagination};

use crate::error::{AppError, AppResult};
use crate::repositories::notifications;

/// Notification service
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
}

impl NotificationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_mine(
        &self,
        user_id: Uuid,
        unread_only: bool,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<Notification>> {
        let (limit, offset) = pagination.limit_offset();
        let mut conn = self.db.acquire().await?;
        let (rows, total) =
            notifications::list_for(&mut conn, user_id, unread_only, limit, offset).await?;
        Ok(PaginatedResponse::new(rows, pagination, total as u64))
    }

    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> AppResult<Notification> {
        let mut conn = self.db.acquire().await?;
        notifications::mark_read(&mut conn, notification_id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Notification", "thông báo"))
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        let mut conn = self.db.acquire().await?;
        let updated = notifications::mark_all_read(&mut conn, user_id).await?;
        tracing::debug!(user_id = %user_id, updated, "notifications marked read");
        Ok(updated)
    }
}

/// Build a notification about one document
pub(crate) fn draft(
    document_type: &'static str,
    document_id: Uuid,
    recipients: Vec<Uuid>,
    title: String,
    message: String,
) -> NotificationDraft {
    NotificationDraft {
        recipients,
        title,
        message,
        document_type,
        document_id,
    }
}

/// Enqueue on the caller's transaction; the actor is never notified
pub(crate) async fn notify(
    conn: &mut PgConnection,
    draft: NotificationDraft,
    actor_id: Uuid,
) -> AppResult<()> {
    let draft = draft.without_actor(actor_id);
    if draft.recipients.is_empty() {
        return Ok(());
    }
    notifications::enqueue(conn, &draft).await?;
    tracing::debug!(
        document = draft.document_type,
        document_id = %draft.document_id,
        recipients = draft.recipients.len(),
        "notification enqueued"
    );
    Ok(())
}
