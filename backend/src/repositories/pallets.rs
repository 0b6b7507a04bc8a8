use sqlx::PgConnection;
use uuid::Uuid;

use shared::{CreatePalletInput, Pallet, PalletStatus};

use crate::error::AppResult;

const PALLET_COLUMNS: &str = "id, goods_id, goods_receipt_note_detail_id, location_id, batch_code, \
     manufacturing_date, expiry_date, package_quantity, initial_quantity, status, created_by, created_at, \
     updated_at";

pub async fn insert(
    conn: &mut PgConnection,
    goods_id: Uuid,
    input: &CreatePalletInput,
    created_by: Uuid,
) -> AppResult<Pallet> {
    let sql = format!(
        "INSERT INTO pallets (goods_id, goods_receipt_note_detail_id, batch_code, manufacturing_date, \
         expiry_date, package_quantity, initial_quantity, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $6, $7) RETURNING {}",
        PALLET_COLUMNS
    );
    Ok(sqlx::query_as::<_, Pallet>(&sql)
        .bind(goods_id)
        .bind(input.goods_receipt_note_detail_id)
        .bind(&input.batch_code)
        .bind(input.manufacturing_date)
        .bind(input.expiry_date)
        .bind(input.package_quantity)
        .bind(created_by)
        .fetch_one(&mut *conn)
        .await?)
}

pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Pallet>> {
    let sql = format!("SELECT {} FROM pallets WHERE id = $1", PALLET_COLUMNS);
    Ok(sqlx::query_as::<_, Pallet>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn lock_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Pallet>> {
    let sql = format!("SELECT {} FROM pallets WHERE id = $1 FOR UPDATE", PALLET_COLUMNS);
    Ok(sqlx::query_as::<_, Pallet>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

/// Lock several pallets in id order
pub async fn lock_many(conn: &mut PgConnection, ids: &[Uuid]) -> AppResult<Vec<Pallet>> {
    let sql = format!(
        "SELECT {} FROM pallets WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        PALLET_COLUMNS
    );
    Ok(sqlx::query_as::<_, Pallet>(&sql)
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?)
}

/// Non-empty pallets of one goods item; ordering is applied by the caller
pub async fn list_by_goods(conn: &mut PgConnection, goods_id: Uuid) -> AppResult<Vec<Pallet>> {
    let sql = format!(
        "SELECT {} FROM pallets WHERE goods_id = $1 AND status <> 'empty'",
        PALLET_COLUMNS
    );
    Ok(sqlx::query_as::<_, Pallet>(&sql)
        .bind(goods_id)
        .fetch_all(&mut *conn)
        .await?)
}

/// Stored pallets located in one of `location_ids`
pub async fn list_stored_in_locations(
    conn: &mut PgConnection,
    location_ids: &[Uuid],
) -> AppResult<Vec<Pallet>> {
    let sql = format!(
        "SELECT {} FROM pallets WHERE location_id = ANY($1) AND status = 'stored' ORDER BY id",
        PALLET_COLUMNS
    );
    Ok(sqlx::query_as::<_, Pallet>(&sql)
        .bind(location_ids)
        .fetch_all(&mut *conn)
        .await?)
}

/// Every pallet built from one receipt line, whatever is left on it
pub async fn list_by_receipt_detail(
    conn: &mut PgConnection,
    detail_id: Uuid,
) -> AppResult<Vec<Pallet>> {
    let sql = format!(
        "SELECT {} FROM pallets WHERE goods_receipt_note_detail_id = $1 ORDER BY created_at",
        PALLET_COLUMNS
    );
    Ok(sqlx::query_as::<_, Pallet>(&sql)
        .bind(detail_id)
        .fetch_all(&mut *conn)
        .await?)
}

pub async fn set_location(
    conn: &mut PgConnection,
    id: Uuid,
    location_id: Option<Uuid>,
    status: PalletStatus,
) -> AppResult<Pallet> {
    let sql = format!(
        "UPDATE pallets SET location_id = $2, status = $3, updated_at = NOW() WHERE id = $1 RETURNING {}",
        PALLET_COLUMNS
    );
    Ok(sqlx::query_as::<_, Pallet>(&sql)
        .bind(id)
        .bind(location_id)
        .bind(status)
        .fetch_one(&mut *conn)
        .await?)
}

/// Write a new package quantity; an empty pallet also releases its location
pub async fn set_quantity(
    conn: &mut PgConnection,
    id: Uuid,
    quantity: i32,
    status: PalletStatus,
) -> AppResult<Pallet> {
    let sql = format!(
        "UPDATE pallets SET package_quantity = $2, status = $3, \
         location_id = CASE WHEN $3 = 'empty'::pallet_status THEN NULL ELSE location_id END, \
         updated_at = NOW() WHERE id = $1 RETURNING {}",
        PALLET_COLUMNS
    );
    Ok(sqlx::query_as::<_, Pallet>(&sql)
        .bind(id)
        .bind(quantity)
        .bind(status)
        .fetch_one(&mut *conn)
        .await?)
}
