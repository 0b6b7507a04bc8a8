use sqlx::PgConnection;
use uuid::Uuid;

use shared::{BackOrder, BackOrderStatus, CreateBackOrderInput};

use crate::error::AppResult;

const BACK_ORDER_COLUMNS: &str =
    "id, retailer_id, goods_id, quantity, status, created_by, created_at, updated_at";

pub async fn insert(
    conn: &mut PgConnection,
    input: &CreateBackOrderInput,
    created_by: Uuid,
) -> AppResult<BackOrder> {
    let sql = format!(
        "INSERT INTO back_orders (retailer_id, goods_id, quantity, created_by) \
         VALUES ($1, $2, $3, $4) RETURNING {}",
        BACK_ORDER_COLUMNS
    );
    Ok(sqlx::query_as::<_, BackOrder>(&sql)
        .bind(input.retailer_id)
        .bind(input.goods_id)
        .bind(input.quantity)
        .bind(created_by)
        .fetch_one(&mut *conn)
        .await?)
}

pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<BackOrder>> {
    let sql = format!("SELECT {} FROM back_orders WHERE id = $1", BACK_ORDER_COLUMNS);
    Ok(sqlx::query_as::<_, BackOrder>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn lock_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<BackOrder>> {
    let sql = format!(
        "SELECT {} FROM back_orders WHERE id = $1 FOR UPDATE",
        BACK_ORDER_COLUMNS
    );
    Ok(sqlx::query_as::<_, BackOrder>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn list(
    conn: &mut PgConnection,
    status: Option<BackOrderStatus>,
    limit: i64,
    offset: i64,
) -> AppResult<(Vec<BackOrder>, i64)> {
    let sql = format!(
        "SELECT {} FROM back_orders WHERE ($1::back_order_status IS NULL OR status = $1) \
         ORDER BY created_at LIMIT $2 OFFSET $3",
        BACK_ORDER_COLUMNS
    );
    let rows = sqlx::query_as::<_, BackOrder>(&sql)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM back_orders WHERE ($1::back_order_status IS NULL OR status = $1)",
    )
    .bind(status)
    .fetch_one(&mut *conn)
    .await?;
    Ok((rows, total))
}

pub async fn update_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: BackOrderStatus,
) -> AppResult<BackOrder> {
    let sql = format!(
        "UPDATE back_orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
        BACK_ORDER_COLUMNS
    );
    Ok(sqlx::query_as::<_, BackOrder>(&sql)
        .bind(id)
        .bind(status)
        .fetch_one(&mut *conn)
        .await?)
}
