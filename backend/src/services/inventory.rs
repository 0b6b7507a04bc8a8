//! Stock positions and ledger queries
//!
//! The ledger is only written by document transactions; this service reads it.

use sqlx::PgPool;
use uuid::Uuid;

use shared::{LedgerEntry, PaginatedResponse, Pagination, StockSummary};

use super::export_to_csv;
use crate::error::{AppError, AppResult};
use crate::repositories::{catalog, ledger};

#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

impl InventoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Stock, committed and available packages for every active goods item
    pub async fn stock_summary(&self) -> AppResult<Vec<StockSummary>> {
        let mut conn = self.db.acquire().await?;
        ledger::stock_summary(&mut conn).await
    }

    /// Ledger movements of one goods item, newest first
    pub async fn history(
        &self,
        goods_id: Uuid,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<LedgerEntry>> {
        let (limit, offset) = pagination.limit_offset();
        let mut conn = self.db.acquire().await?;
        catalog::find_goods(&mut conn, goods_id)
            .await?
            .ok_or_else(|| AppError::not_found("Goods", "hàng hóa"))?;
        let (entries, total) = ledger::history(&mut conn, goods_id, limit, offset).await?;
        Ok(PaginatedResponse::new(entries, pagination, total as u64))
    }

    pub async fn export_stock_csv(&self) -> AppResult<String> {
        let rows = self.stock_summary().await?;
        export_to_csv(&rows)
    }

    pub async fn export_ledger_csv(&self) -> AppResult<String> {
        let mut conn = self.db.acquire().await?;
        let entries = ledger::all_entries(&mut conn).await?;
        tracing::debug!(entries = entries.len(), "exporting inventory ledger");
        export_to_csv(&entries)
    }
}
