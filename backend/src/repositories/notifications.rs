use sqlx::PgConnection;
use uuid::Uuid;

use shared::{Notification, NotificationDraft};

use crate::error::AppResult;

const NOTIFICATION_COLUMNS: &str =
    "id, recipient_id, title, message, document_type, document_id, is_read, created_at, read_at";

/// Write one row per recipient on the caller's connection
pub async fn enqueue(conn: &mut PgConnection, draft: &NotificationDraft) -> AppResult<()> {
    for recipient in &draft.recipients {
        sqlx::query(
            "INSERT INTO notifications (recipient_id, title, message, document_type, document_id) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(recipient)
        .bind(&draft.title)
        .bind(&draft.message)
        .bind(draft.document_type)
        .bind(draft.document_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn list_for(
    conn: &mut PgConnection,
    recipient_id: Uuid,
    unread_only: bool,
    limit: i64,
    offset: i64,
) -> AppResult<(Vec<Notification>, i64)> {
    let sql = format!(
        "SELECT {} FROM notifications WHERE recipient_id = $1 AND (NOT $2 OR is_read = FALSE) \
         ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        NOTIFICATION_COLUMNS
    );
    let rows = sqlx::query_as::<_, Notification>(&sql)
        .bind(recipient_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND (NOT $2 OR is_read = FALSE)",
    )
    .bind(recipient_id)
    .bind(unread_only)
    .fetch_one(&mut *conn)
    .await?;
    Ok((rows, total))
}

/// Mark one notification read; `None` when it does not belong to the recipient
pub async fn mark_read(
    conn: &mut PgConnection,
    id: Uuid,
    recipient_id: Uuid,
) -> AppResult<Option<Notification>> {
    let sql = format!(
        "UPDATE notifications SET is_read = TRUE, read_at = COALESCE(read_at, NOW()) \
         WHERE id = $1 AND recipient_id = $2 RETURNING {}",
        NOTIFICATION_COLUMNS
    );
    Ok(sqlx::query_as::<_, Notification>(&sql)
        .bind(id)
        .bind(recipient_id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn mark_all_read(conn: &mut PgConnection, recipient_id: Uuid) -> AppResult<u64> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = TRUE, read_at = NOW() \
         WHERE recipient_id = $1 AND is_read = FALSE",
    )
    .bind(recipient_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}
