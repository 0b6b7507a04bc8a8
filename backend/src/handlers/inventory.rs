//! Stock position and ledger handlers

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use shared::{ApiResponse, LedgerEntry, PaginatedResponse};

use super::{csv_attachment, ExportQuery, PageQuery};
use crate::error::AppResult;
use crate::services::inventory::InventoryService;
use crate::AppState;

/// Stock summary per goods item, JSON or CSV
pub async fn get_stock_summary(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let service = InventoryService::new(state.db);
    if query.wants_csv() {
        let csv = service.export_stock_csv().await?;
        return Ok(csv_attachment("stock_summary.csv", csv));
    }
    let summary = service.stock_summary().await?;
    Ok(Json(ApiResponse::ok(summary)).into_response())
}

pub async fn get_goods_ledger(
    State(state): State<AppState>,
    Path(goods_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<LedgerEntry>>>> {
    let pagination = query.pagination(&state);
    let service = InventoryService::new(state.db);
    Ok(Json(ApiResponse::ok(service.history(goods_id, &pagination).await?)))
}

/// Whole ledger as a CSV download
pub async fn export_ledger(State(state): State<AppState>) -> AppResult<Response> {
    let service = InventoryService::new(state.db);
    let csv = service.export_ledger_csv().await?;
    Ok(csv_attachment("inventory_ledger.csv", csv))
}
