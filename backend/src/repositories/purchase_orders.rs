use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use shared::{OrderLineInput, PurchaseOrder, PurchaseOrderDetail, PurchaseOrderStatus};

use super::StatusChange;
use crate::error::{AppError, AppResult};

const ORDER_COLUMNS: &str = "id, code, supplier_id, status, created_by, approval_by, assigned_to, \
     estimated_arrival_date, rejection_reason, note, approved_at, created_at, updated_at";
const DETAIL_COLUMNS: &str = "id, purchase_order_id, goods_id, quantity, unit_price";

pub async fn insert(
    conn: &mut PgConnection,
    code: &str,
    supplier_id: Uuid,
    note: Option<&str>,
    created_by: Uuid,
) -> AppResult<PurchaseOrder> {
    let sql = format!(
        "INSERT INTO purchase_orders (code, supplier_id, note, created_by) VALUES ($1, $2, $3, $4) RETURNING {}",
        ORDER_COLUMNS
    );
    sqlx::query_as::<_, PurchaseOrder>(&sql)
        .bind(code)
        .bind(supplier_id)
        .bind(note)
        .bind(created_by)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::from_insert(e, "code"))
}

pub async fn insert_details(
    conn: &mut PgConnection,
    order_id: Uuid,
    lines: &[OrderLineInput],
) -> AppResult<()> {
    for line in lines {
        sqlx::query(
            "INSERT INTO purchase_order_details (purchase_order_id, goods_id, quantity, unit_price) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(order_id)
        .bind(line.goods_id)
        .bind(line.quantity)
        .bind(line.unit_price.unwrap_or(Decimal::ZERO))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn replace_details(
    conn: &mut PgConnection,
    order_id: Uuid,
    lines: &[OrderLineInput],
) -> AppResult<()> {
    sqlx::query("DELETE FROM purchase_order_details WHERE purchase_order_id = $1")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    insert_details(conn, order_id, lines).await
}

pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<PurchaseOrder>> {
    let sql = format!("SELECT {} FROM purchase_orders WHERE id = $1", ORDER_COLUMNS);
    Ok(sqlx::query_as::<_, PurchaseOrder>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn lock_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<PurchaseOrder>> {
    let sql = format!(
        "SELECT {} FROM purchase_orders WHERE id = $1 FOR UPDATE",
        ORDER_COLUMNS
    );
    Ok(sqlx::query_as::<_, PurchaseOrder>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn details(conn: &mut PgConnection, order_id: Uuid) -> AppResult<Vec<PurchaseOrderDetail>> {
    let sql = format!(
        "SELECT {} FROM purchase_order_details WHERE purchase_order_id = $1 ORDER BY id",
        DETAIL_COLUMNS
    );
    Ok(sqlx::query_as::<_, PurchaseOrderDetail>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?)
}

/// One page of orders, newest first, with the total count
pub async fn list(
    conn: &mut PgConnection,
    status: Option<PurchaseOrderStatus>,
    limit: i64,
    offset: i64,
) -> AppResult<(Vec<PurchaseOrder>, i64)> {
    let sql = format!(
        "SELECT {} FROM purchase_orders WHERE ($1::purchase_order_status IS NULL OR status = $1) \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        ORDER_COLUMNS
    );
    let orders = sqlx::query_as::<_, PurchaseOrder>(&sql)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM purchase_orders WHERE ($1::purchase_order_status IS NULL OR status = $1)",
    )
    .bind(status)
    .fetch_one(&mut *conn)
    .await?;
    Ok((orders, total))
}

pub async fn update_note(conn: &mut PgConnection, id: Uuid, note: Option<&str>) -> AppResult<()> {
    sqlx::query("UPDATE purchase_orders SET note = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(note)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn delete(conn: &mut PgConnection, id: Uuid) -> AppResult<()> {
    sqlx::query("DELETE FROM purchase_orders WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn update_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: PurchaseOrderStatus,
    change: &StatusChange,
    estimated_arrival_date: Option<NaiveDate>,
) -> AppResult<PurchaseOrder> {
    let sql = format!(
        "UPDATE purchase_orders SET status = $2, \
         approval_by = COALESCE($3, approval_by), \
         assigned_to = COALESCE($4, assigned_to), \
         rejection_reason = $5, \
         approved_at = CASE WHEN $6 THEN NOW() ELSE approved_at END, \
         estimated_arrival_date = COALESCE($7, estimated_arrival_date), \
         updated_at = NOW() \
         WHERE id = $1 RETURNING {}",
        ORDER_COLUMNS
    );
    Ok(sqlx::query_as::<_, PurchaseOrder>(&sql)
        .bind(id)
        .bind(status)
        .bind(change.approval_by)
        .bind(change.assigned_to)
        .bind(&change.rejection_reason)
        .bind(change.approved)
        .bind(estimated_arrival_date)
        .fetch_one(&mut *conn)
        .await?)
}
