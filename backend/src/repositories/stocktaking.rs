use sqlx::PgConnection;
use uuid::Uuid;

use shared::{
    StocktakingArea, StocktakingLocation, StocktakingPallet, StocktakingPalletStatus,
    StocktakingSheet, StocktakingStatus, StocktakingVarianceRow,
};

use super::StatusChange;
use crate::error::{AppError, AppResult};

const SHEET_COLUMNS: &str = "id, code, status, created_by, approval_by, rejection_reason, note, \
     started_at, created_at, updated_at";
const PALLET_COLUMNS: &str = "sp.id, sp.stocktaking_location_id, sp.pallet_id, sp.goods_id, \
     sp.expected_quantity, sp.counted_quantity, sp.status, sp.counted_by, sp.counted_at";
const PALLET_JOIN: &str = "FROM stocktaking_pallets sp \
     JOIN stocktaking_locations sl ON sl.id = sp.stocktaking_location_id \
     JOIN stocktaking_areas sa ON sa.id = sl.stocktaking_area_id";

/// Where a counted pallet sits in the sheet hierarchy
#[derive(Debug, sqlx::FromRow)]
pub struct CountTarget {
    pub id: Uuid,
    pub stocktaking_sheet_id: Uuid,
    /// Assignee of the pallet's area
    pub assigned_to: Uuid,
}

pub async fn insert_sheet(
    conn: &mut PgConnection,
    code: &str,
    note: Option<&str>,
    created_by: Uuid,
) -> AppResult<StocktakingSheet> {
    let sql = format!(
        "INSERT INTO stocktaking_sheets (code, note, created_by) VALUES ($1, $2, $3) RETURNING {}",
        SHEET_COLUMNS
    );
    sqlx::query_as::<_, StocktakingSheet>(&sql)
        .bind(code)
        .bind(note)
        .bind(created_by)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::from_insert(e, "code"))
}

pub async fn insert_area(
    conn: &mut PgConnection,
    sheet_id: Uuid,
    area_id: Uuid,
    assigned_to: Uuid,
) -> AppResult<StocktakingArea> {
    Ok(sqlx::query_as::<_, StocktakingArea>(
        "INSERT INTO stocktaking_areas (stocktaking_sheet_id, area_id, assigned_to) \
         VALUES ($1, $2, $3) RETURNING id, stocktaking_sheet_id, area_id, assigned_to",
    )
    .bind(sheet_id)
    .bind(area_id)
    .bind(assigned_to)
    .fetch_one(&mut *conn)
    .await?)
}

pub async fn insert_location(
    conn: &mut PgConnection,
    stocktaking_area_id: Uuid,
    location_id: Uuid,
) -> AppResult<StocktakingLocation> {
    Ok(sqlx::query_as::<_, StocktakingLocation>(
        "INSERT INTO stocktaking_locations (stocktaking_area_id, location_id) \
         VALUES ($1, $2) RETURNING id, stocktaking_area_id, location_id",
    )
    .bind(stocktaking_area_id)
    .bind(location_id)
    .fetch_one(&mut *conn)
    .await?)
}

pub async fn insert_pallet(
    conn: &mut PgConnection,
    stocktaking_location_id: Uuid,
    pallet_id: Uuid,
    goods_id: Uuid,
    expected_quantity: i32,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO stocktaking_pallets (stocktaking_location_id, pallet_id, goods_id, expected_quantity) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(stocktaking_location_id)
    .bind(pallet_id)
    .bind(goods_id)
    .bind(expected_quantity)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn find_sheet(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<StocktakingSheet>> {
    let sql = format!("SELECT {} FROM stocktaking_sheets WHERE id = $1", SHEET_COLUMNS);
    Ok(sqlx::query_as::<_, StocktakingSheet>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn lock_sheet(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<StocktakingSheet>> {
    let sql = format!(
        "SELECT {} FROM stocktaking_sheets WHERE id = $1 FOR UPDATE",
        SHEET_COLUMNS
    );
    Ok(sqlx::query_as::<_, StocktakingSheet>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn list_sheets(
    conn: &mut PgConnection,
    status: Option<StocktakingStatus>,
    limit: i64,
    offset: i64,
) -> AppResult<(Vec<StocktakingSheet>, i64)> {
    let sql = format!(
        "SELECT {} FROM stocktaking_sheets WHERE ($1::stocktaking_status IS NULL OR status = $1) \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        SHEET_COLUMNS
    );
    let sheets = sqlx::query_as::<_, StocktakingSheet>(&sql)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM stocktaking_sheets WHERE ($1::stocktaking_status IS NULL OR status = $1)",
    )
    .bind(status)
    .fetch_one(&mut *conn)
    .await?;
    Ok((sheets, total))
}

pub async fn areas(conn: &mut PgConnection, sheet_id: Uuid) -> AppResult<Vec<StocktakingArea>> {
    Ok(sqlx::query_as::<_, StocktakingArea>(
        "SELECT id, stocktaking_sheet_id, area_id, assigned_to FROM stocktaking_areas \
         WHERE stocktaking_sheet_id = $1 ORDER BY id",
    )
    .bind(sheet_id)
    .fetch_all(&mut *conn)
    .await?)
}

pub async fn locations(conn: &mut PgConnection, sheet_id: Uuid) -> AppResult<Vec<StocktakingLocation>> {
    Ok(sqlx::query_as::<_, StocktakingLocation>(
        "SELECT sl.id, sl.stocktaking_area_id, sl.location_id FROM stocktaking_locations sl \
         JOIN stocktaking_areas sa ON sa.id = sl.stocktaking_area_id \
         WHERE sa.stocktaking_sheet_id = $1 ORDER BY sl.id",
    )
    .bind(sheet_id)
    .fetch_all(&mut *conn)
    .await?)
}

pub async fn pallets(conn: &mut PgConnection, sheet_id: Uuid) -> AppResult<Vec<StocktakingPallet>> {
    let sql = format!(
        "SELECT {} {} WHERE sa.stocktaking_sheet_id = $1 ORDER BY sp.id",
        PALLET_COLUMNS, PALLET_JOIN
    );
    Ok(sqlx::query_as::<_, StocktakingPallet>(&sql)
        .bind(sheet_id)
        .fetch_all(&mut *conn)
        .await?)
}

pub async fn count_target(
    conn: &mut PgConnection,
    stocktaking_pallet_id: Uuid,
) -> AppResult<Option<CountTarget>> {
    let sql = format!(
        "SELECT sp.id, sa.stocktaking_sheet_id, sa.assigned_to {} WHERE sp.id = $1",
        PALLET_JOIN
    );
    Ok(sqlx::query_as::<_, CountTarget>(&sql)
        .bind(stocktaking_pallet_id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn record_count(
    conn: &mut PgConnection,
    stocktaking_pallet_id: Uuid,
    counted_quantity: i32,
    counted_by: Uuid,
) -> AppResult<StocktakingPallet> {
    Ok(sqlx::query_as::<_, StocktakingPallet>(
        "UPDATE stocktaking_pallets SET counted_quantity = $2, status = $3, counted_by = $4, \
         counted_at = NOW() WHERE id = $1 RETURNING id, stocktaking_location_id, pallet_id, \
         goods_id, expected_quantity, counted_quantity, status, counted_by, counted_at",
    )
    .bind(stocktaking_pallet_id)
    .bind(counted_quantity)
    .bind(StocktakingPalletStatus::Counted)
    .bind(counted_by)
    .fetch_one(&mut *conn)
    .await?)
}

pub async fn variance_report(
    conn: &mut PgConnection,
    sheet_id: Uuid,
) -> AppResult<Vec<StocktakingVarianceRow>> {
    let sql = format!(
        "SELECT a.code AS area_code, l.code AS location_code, sp.pallet_id, g.code AS goods_code, \
         sp.expected_quantity, sp.counted_quantity, \
         COALESCE(sp.counted_quantity - sp.expected_quantity, 0) AS variance \
         {} JOIN areas a ON a.id = sa.area_id JOIN locations l ON l.id = sl.location_id \
         JOIN goods g ON g.id = sp.goods_id \
         WHERE sa.stocktaking_sheet_id = $1 ORDER BY a.code, l.code",
        PALLET_JOIN
    );
    Ok(sqlx::query_as::<_, StocktakingVarianceRow>(&sql)
        .bind(sheet_id)
        .fetch_all(&mut *conn)
        .await?)
}

pub async fn update_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: StocktakingStatus,
    change: &StatusChange,
) -> AppResult<StocktakingSheet> {
    let sql = format!(
        "UPDATE stocktaking_sheets SET status = $2, approval_by = COALESCE($3, approval_by), \
         rejection_reason = $4, \
         started_at = CASE WHEN $2 = 'in_progress'::stocktaking_status AND started_at IS NULL \
             THEN NOW() ELSE started_at END, \
         updated_at = NOW() WHERE id = $1 RETURNING {}",
        SHEET_COLUMNS
    );
    Ok(sqlx::query_as::<_, StocktakingSheet>(&sql)
        .bind(id)
        .bind(status)
        .bind(change.approval_by)
        .bind(&change.rejection_reason)
        .fetch_one(&mut *conn)
        .await?)
}
