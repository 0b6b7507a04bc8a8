use sqlx::PgConnection;
use uuid::Uuid;

use shared::{
    GoodsIssueAllocation, GoodsIssueDetailStatus, GoodsIssueNote, GoodsIssueNoteDetail,
    GoodsIssueNoteStatus,
};

use super::StatusChange;
use crate::error::{AppError, AppResult};

const NOTE_COLUMNS: &str = "id, code, sales_order_id, status, created_by, assigned_to, \
     approval_by, rejection_reason, created_at, updated_at";
const DETAIL_COLUMNS: &str = "id, goods_issue_note_id, goods_id, requested_quantity, status";
const ALLOCATION_COLUMNS: &str = "id, goods_issue_note_detail_id, pallet_id, quantity";

pub async fn insert(
    conn: &mut PgConnection,
    code: &str,
    sales_order_id: Uuid,
    created_by: Uuid,
    assigned_to: Uuid,
) -> AppResult<GoodsIssueNote> {
    let sql = format!(
        "INSERT INTO goods_issue_notes (code, sales_order_id, created_by, assigned_to) \
         VALUES ($1, $2, $3, $4) RETURNING {}",
        NOTE_COLUMNS
    );
    sqlx::query_as::<_, GoodsIssueNote>(&sql)
        .bind(code)
        .bind(sales_order_id)
        .bind(created_by)
        .bind(assigned_to)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::from_insert(e, "sales_order_id"))
}

/// One pending detail per sales order line
pub async fn insert_details_from_order(
    conn: &mut PgConnection,
    note_id: Uuid,
    sales_order_id: Uuid,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO goods_issue_note_details (goods_issue_note_id, goods_id, requested_quantity) \
         SELECT $1, goods_id, quantity FROM sales_order_details WHERE sales_order_id = $2",
    )
    .bind(note_id)
    .bind(sales_order_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<GoodsIssueNote>> {
    let sql = format!("SELECT {} FROM goods_issue_notes WHERE id = $1", NOTE_COLUMNS);
    Ok(sqlx::query_as::<_, GoodsIssueNote>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn lock_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<GoodsIssueNote>> {
    let sql = format!(
        "SELECT {} FROM goods_issue_notes WHERE id = $1 FOR UPDATE",
        NOTE_COLUMNS
    );
    Ok(sqlx::query_as::<_, GoodsIssueNote>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn list(
    conn: &mut PgConnection,
    status: Option<GoodsIssueNoteStatus>,
    limit: i64,
    offset: i64,
) -> AppResult<(Vec<GoodsIssueNote>, i64)> {
    let sql = format!(
        "SELECT {} FROM goods_issue_notes \
         WHERE ($1::goods_issue_note_status IS NULL OR status = $1) \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        NOTE_COLUMNS
    );
    let notes = sqlx::query_as::<_, GoodsIssueNote>(&sql)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM goods_issue_notes \
         WHERE ($1::goods_issue_note_status IS NULL OR status = $1)",
    )
    .bind(status)
    .fetch_one(&mut *conn)
    .await?;
    Ok((notes, total))
}

pub async fn details(conn: &mut PgConnection, note_id: Uuid) -> AppResult<Vec<GoodsIssueNoteDetail>> {
    let sql = format!(
        "SELECT {} FROM goods_issue_note_details WHERE goods_issue_note_id = $1 ORDER BY id",
        DETAIL_COLUMNS
    );
    Ok(sqlx::query_as::<_, GoodsIssueNoteDetail>(&sql)
        .bind(note_id)
        .fetch_all(&mut *conn)
        .await?)
}

pub async fn lock_detail(
    conn: &mut PgConnection,
    detail_id: Uuid,
) -> AppResult<Option<GoodsIssueNoteDetail>> {
    let sql = format!(
        "SELECT {} FROM goods_issue_note_details WHERE id = $1 FOR UPDATE",
        DETAIL_COLUMNS
    );
    Ok(sqlx::query_as::<_, GoodsIssueNoteDetail>(&sql)
        .bind(detail_id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn set_detail_status(
    conn: &mut PgConnection,
    detail_id: Uuid,
    status: GoodsIssueDetailStatus,
) -> AppResult<()> {
    sqlx::query("UPDATE goods_issue_note_details SET status = $2 WHERE id = $1")
        .bind(detail_id)
        .bind(status)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn allocations(
    conn: &mut PgConnection,
    note_id: Uuid,
) -> AppResult<Vec<GoodsIssueAllocation>> {
    Ok(sqlx::query_as::<_, GoodsIssueAllocation>(
        "SELECT a.id, a.goods_issue_note_detail_id, a.pallet_id, a.quantity \
         FROM goods_issue_allocations a \
         JOIN goods_issue_note_details d ON d.id = a.goods_issue_note_detail_id \
         WHERE d.goods_issue_note_id = $1 ORDER BY a.id",
    )
        .bind(note_id)
        .fetch_all(&mut *conn)
        .await?)
}

pub async fn allocated_to_detail(conn: &mut PgConnection, detail_id: Uuid) -> AppResult<i32> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity), 0)::bigint FROM goods_issue_allocations \
         WHERE goods_issue_note_detail_id = $1",
    )
    .bind(detail_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(total as i32)
}

/// Packages of a pallet already promised to notes that are not yet completed
pub async fn reserved_on_pallet(conn: &mut PgConnection, pallet_id: Uuid) -> AppResult<i32> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(a.quantity), 0)::bigint FROM goods_issue_allocations a \
         JOIN goods_issue_note_details d ON d.id = a.goods_issue_note_detail_id \
         JOIN goods_issue_notes n ON n.id = d.goods_issue_note_id \
         WHERE a.pallet_id = $1 AND n.status <> 'completed'",
    )
    .bind(pallet_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(total as i32)
}

pub async fn insert_allocation(
    conn: &mut PgConnection,
    detail_id: Uuid,
    pallet_id: Uuid,
    quantity: i32,
) -> AppResult<GoodsIssueAllocation> {
    let sql = format!(
        "INSERT INTO goods_issue_allocations (goods_issue_note_detail_id, pallet_id, quantity) \
         VALUES ($1, $2, $3) RETURNING {}",
        ALLOCATION_COLUMNS
    );
    Ok(sqlx::query_as::<_, GoodsIssueAllocation>(&sql)
        .bind(detail_id)
        .bind(pallet_id)
        .bind(quantity)
        .fetch_one(&mut *conn)
        .await?)
}

pub async fn update_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: GoodsIssueNoteStatus,
    change: &StatusChange,
) -> AppResult<GoodsIssueNote> {
    let sql = format!(
        "UPDATE goods_issue_notes SET status = $2, approval_by = COALESCE($3, approval_by), \
         rejection_reason = $4, updated_at = NOW() WHERE id = $1 RETURNING {}",
        NOTE_COLUMNS
    );
    Ok(sqlx::query_as::<_, GoodsIssueNote>(&sql)
        .bind(id)
        .bind(status)
        .bind(change.approval_by)
        .bind(&change.rejection_reason)
        .fetch_one(&mut *conn)
        .await?)
}
