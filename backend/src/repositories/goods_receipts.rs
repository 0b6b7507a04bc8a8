use sqlx::PgConnection;
use uuid::Uuid;

use shared::{
    GoodsReceiptDetailStatus, GoodsReceiptNote, GoodsReceiptNoteDetail, GoodsReceiptNoteStatus,
};

use super::StatusChange;
use crate::error::{AppError, AppResult};

const NOTE_COLUMNS: &str = "id, code, purchase_order_id, status, created_by, assigned_to, \
     approval_by, rejection_reason, created_at, updated_at";
const DETAIL_COLUMNS: &str = "id, goods_receipt_note_id, goods_id, expected_quantity, \
     received_quantity, rejected_quantity, status, note";

pub async fn insert(
    conn: &mut PgConnection,
    code: &str,
    purchase_order_id: Uuid,
    created_by: Uuid,
    assigned_to: Uuid,
) -> AppResult<GoodsReceiptNote> {
    let sql = format!(
        "INSERT INTO goods_receipt_notes (code, purchase_order_id, created_by, assigned_to) \
         VALUES ($1, $2, $3, $4) RETURNING {}",
        NOTE_COLUMNS
    );
    sqlx::query_as::<_, GoodsReceiptNote>(&sql)
        .bind(code)
        .bind(purchase_order_id)
        .bind(created_by)
        .bind(assigned_to)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::from_insert(e, "purchase_order_id"))
}

/// One pending detail per purchase order line, expecting the ordered quantity
pub async fn insert_details_from_order(
    conn: &mut PgConnection,
    note_id: Uuid,
    purchase_order_id: Uuid,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO goods_receipt_note_details (goods_receipt_note_id, goods_id, expected_quantity) \
         SELECT $1, goods_id, quantity FROM purchase_order_details WHERE purchase_order_id = $2",
    )
    .bind(note_id)
    .bind(purchase_order_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<GoodsReceiptNote>> {
    let sql = format!("SELECT {} FROM goods_receipt_notes WHERE id = $1", NOTE_COLUMNS);
    Ok(sqlx::query_as::<_, GoodsReceiptNote>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn lock_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<GoodsReceiptNote>> {
    let sql = format!(
        "SELECT {} FROM goods_receipt_notes WHERE id = $1 FOR UPDATE",
        NOTE_COLUMNS
    );
    Ok(sqlx::query_as::<_, GoodsReceiptNote>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn list(
    conn: &mut PgConnection,
    status: Option<GoodsReceiptNoteStatus>,
    limit: i64,
    offset: i64,
) -> AppResult<(Vec<GoodsReceiptNote>, i64)> {
    let sql = format!(
        "SELECT {} FROM goods_receipt_notes \
         WHERE ($1::goods_receipt_note_status IS NULL OR status = $1) \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        NOTE_COLUMNS
    );
    let notes = sqlx::query_as::<_, GoodsReceiptNote>(&sql)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM goods_receipt_notes \
         WHERE ($1::goods_receipt_note_status IS NULL OR status = $1)",
    )
    .bind(status)
    .fetch_one(&mut *conn)
    .await?;
    Ok((notes, total))
}

pub async fn details(
    conn: &mut PgConnection,
    note_id: Uuid,
) -> AppResult<Vec<GoodsReceiptNoteDetail>> {
    let sql = format!(
        "SELECT {} FROM goods_receipt_note_details WHERE goods_receipt_note_id = $1 ORDER BY id",
        DETAIL_COLUMNS
    );
    Ok(sqlx::query_as::<_, GoodsReceiptNoteDetail>(&sql)
        .bind(note_id)
        .fetch_all(&mut *conn)
        .await?)
}

pub async fn find_detail(
    conn: &mut PgConnection,
    detail_id: Uuid,
) -> AppResult<Option<GoodsReceiptNoteDetail>> {
    let sql = format!(
        "SELECT {} FROM goods_receipt_note_details WHERE id = $1",
        DETAIL_COLUMNS
    );
    Ok(sqlx::query_as::<_, GoodsReceiptNoteDetail>(&sql)
        .bind(detail_id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn lock_detail(
    conn: &mut PgConnection,
    detail_id: Uuid,
) -> AppResult<Option<GoodsReceiptNoteDetail>> {
    let sql = format!(
        "SELECT {} FROM goods_receipt_note_details WHERE id = $1 FOR UPDATE",
        DETAIL_COLUMNS
    );
    Ok(sqlx::query_as::<_, GoodsReceiptNoteDetail>(&sql)
        .bind(detail_id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn record_inspection(
    conn: &mut PgConnection,
    detail_id: Uuid,
    received: i32,
    rejected: i32,
    note: Option<&str>,
) -> AppResult<GoodsReceiptNoteDetail> {
    let sql = format!(
        "UPDATE goods_receipt_note_details SET received_quantity = $2, rejected_quantity = $3, \
         note = $4, status = $5 WHERE id = $1 RETURNING {}",
        DETAIL_COLUMNS
    );
    Ok(sqlx::query_as::<_, GoodsReceiptNoteDetail>(&sql)
        .bind(detail_id)
        .bind(received)
        .bind(rejected)
        .bind(note)
        .bind(GoodsReceiptDetailStatus::Inspected)
        .fetch_one(&mut *conn)
        .await?)
}

pub async fn update_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: GoodsReceiptNoteStatus,
    change: &StatusChange,
) -> AppResult<GoodsReceiptNote> {
    let sql = format!(
        "UPDATE goods_receipt_notes SET status = $2, approval_by = COALESCE($3, approval_by), \
         rejection_reason = $4, updated_at = NOW() WHERE id = $1 RETURNING {}",
        NOTE_COLUMNS
    );
    Ok(sqlx::query_as::<_, GoodsReceiptNote>(&sql)
        .bind(id)
        .bind(status)
        .bind(change.approval_by)
        .bind(&change.rejection_reason)
        .fetch_one(&mut *conn)
        .await?)
}
