use std::collections::HashMap;

use sqlx::PgConnection;
use uuid::Uuid;

use shared::{LedgerDraft, LedgerEntry, StockLevel, StockSummary};

use crate::error::AppResult;

const LEDGER_COLUMNS: &str =
    "id, goods_id, pallet_id, delta, reason, document_type, document_id, created_by, created_at";

// Sales order statuses whose lines hold stock; mirrors `SalesOrderStatus::COMMITTED`
const COMMITTED_SUM: &str = "COALESCE((SELECT SUM(d.quantity) FROM sales_order_details d \
     JOIN sales_orders o ON o.id = d.sales_order_id \
     WHERE d.goods_id = g.id \
       AND o.status IN ('pending_approval', 'approved', 'assigned_for_picking') \
       AND ($1::uuid IS NULL OR o.id <> $1)), 0)::bigint";
const STOCK_SUM: &str = "COALESCE((SELECT SUM(p.package_quantity) FROM pallets p \
     WHERE p.goods_id = g.id), 0)::bigint";

/// Append entries for one document
pub async fn append(
    conn: &mut PgConnection,
    drafts: &[LedgerDraft],
    document_type: &str,
    document_id: Uuid,
    created_by: Uuid,
) -> AppResult<()> {
    for draft in drafts {
        sqlx::query(
            "INSERT INTO inventory_ledger (goods_id, pallet_id, delta, reason, document_type, document_id, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(draft.goods_id)
        .bind(draft.pallet_id)
        .bind(draft.delta)
        .bind(draft.reason)
        .bind(document_type)
        .bind(document_id)
        .bind(created_by)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Stock and committed quantities for `goods_ids`, leaving out the lines of
/// `excluding_order` when given
pub async fn stock_levels(
    conn: &mut PgConnection,
    goods_ids: &[Uuid],
    excluding_order: Option<Uuid>,
) -> AppResult<HashMap<Uuid, StockLevel>> {
    let sql = format!(
        "SELECT g.id AS goods_id, {} AS stock, {} AS committed FROM goods g WHERE g.id = ANY($2)",
        STOCK_SUM, COMMITTED_SUM
    );
    let levels = sqlx::query_as::<_, StockLevel>(&sql)
        .bind(excluding_order)
        .bind(goods_ids)
        .fetch_all(&mut *conn)
        .await?;
    Ok(levels.into_iter().map(|l| (l.goods_id, l)).collect())
}

pub async fn stock_summary(conn: &mut PgConnection) -> AppResult<Vec<StockSummary>> {
    let sql = format!(
        "SELECT goods_id, goods_code, goods_name, stock, committed, stock - committed AS available \
         FROM (SELECT g.id AS goods_id, g.code AS goods_code, g.name AS goods_name, \
               {} AS stock, {} AS committed \
               FROM goods g WHERE g.is_active = TRUE) s \
         ORDER BY goods_code",
        STOCK_SUM, COMMITTED_SUM
    );
    Ok(sqlx::query_as::<_, StockSummary>(&sql)
        .bind(Option::<Uuid>::None)
        .fetch_all(&mut *conn)
        .await?)
}

/// Movements of one goods item, newest first
pub async fn history(
    conn: &mut PgConnection,
    goods_id: Uuid,
    limit: i64,
    offset: i64,
) -> AppResult<(Vec<LedgerEntry>, i64)> {
    let sql = format!(
        "SELECT {} FROM inventory_ledger WHERE goods_id = $1 \
         ORDER BY created_at DESC, id LIMIT $2 OFFSET $3",
        LEDGER_COLUMNS
    );
    let entries = sqlx::query_as::<_, LedgerEntry>(&sql)
        .bind(goods_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_ledger WHERE goods_id = $1")
        .bind(goods_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok((entries, total))
}

/// Every movement in chronological order, for export
pub async fn all_entries(conn: &mut PgConnection) -> AppResult<Vec<LedgerEntry>> {
    let sql = format!(
        "SELECT {} FROM inventory_ledger ORDER BY created_at, id",
        LEDGER_COLUMNS
    );
    Ok(sqlx::query_as::<_, LedgerEntry>(&sql).fetch_all(&mut *conn).await?)
}
