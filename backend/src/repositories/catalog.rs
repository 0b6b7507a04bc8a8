use sqlx::PgConnection;
use uuid::Uuid;

use shared::{CreateGoodsInput, CreatePartnerInput, Goods, Retailer, Supplier};

use crate::error::{AppError, AppResult};

const GOODS_COLUMNS: &str =
    "id, code, name, unit, packages_per_pallet, supplier_id, is_active, created_at";
const PARTNER_COLUMNS: &str = "id, name, phone, email, address, created_at";

pub async fn insert_goods(conn: &mut PgConnection, input: &CreateGoodsInput) -> AppResult<Goods> {
    let sql = format!(
        "INSERT INTO goods (code, name, unit, packages_per_pallet, supplier_id) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {}",
        GOODS_COLUMNS
    );
    sqlx::query_as::<_, Goods>(&sql)
        .bind(&input.code)
        .bind(&input.name)
        .bind(&input.unit)
        .bind(input.packages_per_pallet)
        .bind(input.supplier_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::from_insert(e, "code"))
}

pub async fn find_goods(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Goods>> {
    let sql = format!("SELECT {} FROM goods WHERE id = $1", GOODS_COLUMNS);
    Ok(sqlx::query_as::<_, Goods>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn list_goods(conn: &mut PgConnection) -> AppResult<Vec<Goods>> {
    let sql = format!("SELECT {} FROM goods ORDER BY code", GOODS_COLUMNS);
    Ok(sqlx::query_as::<_, Goods>(&sql).fetch_all(&mut *conn).await?)
}

/// Ids from `ids` that have no active goods row
pub async fn missing_goods(conn: &mut PgConnection, ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
    let found: Vec<Uuid> =
        sqlx::query_scalar("SELECT id FROM goods WHERE id = ANY($1) AND is_active = TRUE")
            .bind(ids)
            .fetch_all(&mut *conn)
            .await?;
    Ok(ids.iter().filter(|id| !found.contains(id)).copied().collect())
}

pub async fn insert_supplier(
    conn: &mut PgConnection,
    input: &CreatePartnerInput,
) -> AppResult<Supplier> {
    let sql = format!(
        "INSERT INTO suppliers (name, phone, email, address) VALUES ($1, $2, $3, $4) RETURNING {}",
        PARTNER_COLUMNS
    );
    Ok(sqlx::query_as::<_, Supplier>(&sql)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .fetch_one(&mut *conn)
        .await?)
}

pub async fn find_supplier(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Supplier>> {
    let sql = format!("SELECT {} FROM suppliers WHERE id = $1", PARTNER_COLUMNS);
    Ok(sqlx::query_as::<_, Supplier>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn list_suppliers(conn: &mut PgConnection) -> AppResult<Vec<Supplier>> {
    let sql = format!("SELECT {} FROM suppliers ORDER BY name", PARTNER_COLUMNS);
    Ok(sqlx::query_as::<_, Supplier>(&sql).fetch_all(&mut *conn).await?)
}

pub async fn insert_retailer(
    conn: &mut PgConnection,
    input: &CreatePartnerInput,
) -> AppResult<Retailer> {
    let sql = format!(
        "INSERT INTO retailers (name, phone, email, address) VALUES ($1, $2, $3, $4) RETURNING {}",
        PARTNER_COLUMNS
    );
    Ok(sqlx::query_as::<_, Retailer>(&sql)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .fetch_one(&mut *conn)
        .await?)
}

pub async fn find_retailer(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Retailer>> {
    let sql = format!("SELECT {} FROM retailers WHERE id = $1", PARTNER_COLUMNS);
    Ok(sqlx::query_as::<_, Retailer>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn list_retailers(conn: &mut PgConnection) -> AppResult<Vec<Retailer>> {
    let sql = format!("SELECT {} FROM retailers ORDER BY name", PARTNER_COLUMNS);
    Ok(sqlx::query_as::<_, Retailer>(&sql).fetch_all(&mut *conn).await?)
}

/// Lock goods rows in id order so concurrent stock commitments serialize
pub async fn lock_goods(conn: &mut PgConnection, ids: &[Uuid]) -> AppResult<()> {
    let mut sorted = ids.to_vec();
    sorted.sort();
    sorted.dedup();
    sqlx::query("SELECT id FROM goods WHERE id = ANY($1) ORDER BY id FOR UPDATE")
        .bind(&sorted)
        .fetch_all(&mut *conn)
        .await?;
    Ok(())
}
