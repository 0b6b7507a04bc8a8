use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use shared::{CreateSalesOrderInput, OrderLineInput, SalesOrder, SalesOrderDetail, SalesOrderStatus};

use super::StatusChange;
use crate::error::{AppError, AppResult};

const ORDER_COLUMNS: &str = "id, code, retailer_id, status, created_by, approval_by, assigned_to, \
     requested_delivery_date, rejection_reason, note, approved_at, created_at, updated_at";
const DETAIL_COLUMNS: &str = "id, sales_order_id, goods_id, quantity, unit_price";

pub async fn insert(
    conn: &mut PgConnection,
    code: &str,
    input: &CreateSalesOrderInput,
    created_by: Uuid,
) -> AppResult<SalesOrder> {
    let sql = format!(
        "INSERT INTO sales_orders (code, retailer_id, requested_delivery_date, note, created_by) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {}",
        ORDER_COLUMNS
    );
    sqlx::query_as::<_, SalesOrder>(&sql)
        .bind(code)
        .bind(input.retailer_id)
        .bind(input.requested_delivery_date)
        .bind(&input.note)
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
            "INSERT INTO sales_order_details (sales_order_id, goods_id, quantity, unit_price) \
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

pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<SalesOrder>> {
    let sql = format!("SELECT {} FROM sales_orders WHERE id = $1", ORDER_COLUMNS);
    Ok(sqlx::query_as::<_, SalesOrder>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn lock_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<SalesOrder>> {
    let sql = format!("SELECT {} FROM sales_orders WHERE id = $1 FOR UPDATE", ORDER_COLUMNS);
    Ok(sqlx::query_as::<_, SalesOrder>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn details(conn: &mut PgConnection, order_id: Uuid) -> AppResult<Vec<SalesOrderDetail>> {
    let sql = format!(
        "SELECT {} FROM sales_order_details WHERE sales_order_id = $1 ORDER BY id",
        DETAIL_COLUMNS
    );
    Ok(sqlx::query_as::<_, SalesOrderDetail>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?)
}

pub async fn list(
    conn: &mut PgConnection,
    status: Option<SalesOrderStatus>,
    limit: i64,
    offset: i64,
) -> AppResult<(Vec<SalesOrder>, i64)> {
    let sql = format!(
        "SELECT {} FROM sales_orders WHERE ($1::sales_order_status IS NULL OR status = $1) \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        ORDER_COLUMNS
    );
    let orders = sqlx::query_as::<_, SalesOrder>(&sql)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sales_orders WHERE ($1::sales_order_status IS NULL OR status = $1)",
    )
    .bind(status)
    .fetch_one(&mut *conn)
    .await?;
    Ok((orders, total))
}

pub async fn update_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: SalesOrderStatus,
    change: &StatusChange,
) -> AppResult<SalesOrder> {
    let sql = format!(
        "UPDATE sales_orders SET status = $2, \
         approval_by = COALESCE($3, approval_by), \
         assigned_to = COALESCE($4, assigned_to), \
         rejection_reason = $5, \
         approved_at = CASE WHEN $6 THEN NOW() ELSE approved_at END, \
         updated_at = NOW() \
         WHERE id = $1 RETURNING {}",
        ORDER_COLUMNS
    );
    Ok(sqlx::query_as::<_, SalesOrder>(&sql)
        .bind(id)
        .bind(status)
        .bind(change.approval_by)
        .bind(change.assigned_to)
        .bind(&change.rejection_reason)
        .bind(change.approved)
        .fetch_one(&mut *conn)
        .await?)
}
