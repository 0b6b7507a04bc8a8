use sqlx::PgConnection;
use uuid::Uuid;

use shared::{Area, CreateAreaInput, Location};

use crate::error::{AppError, AppResult};

const AREA_COLUMNS: &str = "id, code, name, temperature_class";
const LOCATION_COLUMNS: &str = "id, area_id, code, rack, level, is_available";

pub async fn insert_area(conn: &mut PgConnection, input: &CreateAreaInput) -> AppResult<Area> {
    let sql = format!(
        "INSERT INTO areas (code, name, temperature_class) VALUES ($1, $2, $3) RETURNING {}",
        AREA_COLUMNS
    );
    sqlx::query_as::<_, Area>(&sql)
        .bind(&input.code)
        .bind(&input.name)
        .bind(input.temperature_class)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::from_insert(e, "code"))
}

pub async fn find_area(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Area>> {
    let sql = format!("SELECT {} FROM areas WHERE id = $1", AREA_COLUMNS);
    Ok(sqlx::query_as::<_, Area>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn list_areas(conn: &mut PgConnection) -> AppResult<Vec<Area>> {
    let sql = format!("SELECT {} FROM areas ORDER BY code", AREA_COLUMNS);
    Ok(sqlx::query_as::<_, Area>(&sql).fetch_all(&mut *conn).await?)
}

pub async fn insert_location(
    conn: &mut PgConnection,
    area_id: Uuid,
    code: &str,
    rack: &str,
    level: i32,
) -> AppResult<Location> {
    let sql = format!(
        "INSERT INTO locations (area_id, code, rack, level) VALUES ($1, $2, $3, $4) RETURNING {}",
        LOCATION_COLUMNS
    );
    sqlx::query_as::<_, Location>(&sql)
        .bind(area_id)
        .bind(code)
        .bind(rack)
        .bind(level)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::from_insert(e, "code"))
}

pub async fn lock_location(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Location>> {
    let sql = format!("SELECT {} FROM locations WHERE id = $1 FOR UPDATE", LOCATION_COLUMNS);
    Ok(sqlx::query_as::<_, Location>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn list_locations(
    conn: &mut PgConnection,
    area_id: Option<Uuid>,
    available: Option<bool>,
) -> AppResult<Vec<Location>> {
    let sql = format!(
        "SELECT {} FROM locations \
         WHERE ($1::uuid IS NULL OR area_id = $1) AND ($2::boolean IS NULL OR is_available = $2) \
         ORDER BY code",
        LOCATION_COLUMNS
    );
    Ok(sqlx::query_as::<_, Location>(&sql)
        .bind(area_id)
        .bind(available)
        .fetch_all(&mut *conn)
        .await?)
}

pub async fn list_locations_in_areas(
    conn: &mut PgConnection,
    area_ids: &[Uuid],
) -> AppResult<Vec<Location>> {
    let sql = format!(
        "SELECT {} FROM locations WHERE area_id = ANY($1) ORDER BY code",
        LOCATION_COLUMNS
    );
    Ok(sqlx::query_as::<_, Location>(&sql)
        .bind(area_ids)
        .fetch_all(&mut *conn)
        .await?)
}

pub async fn set_available(conn: &mut PgConnection, id: Uuid, available: bool) -> AppResult<()> {
    sqlx::query("UPDATE locations SET is_available = $2 WHERE id = $1")
        .bind(id)
        .bind(available)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
