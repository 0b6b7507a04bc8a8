//! Stocktaking handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use shared::{
    ApiResponse, CreateStocktakingInput, PaginatedResponse, RecordCountInput, StocktakingAction,
    StocktakingPallet, StocktakingSheet, StocktakingSheetWithDetails, StocktakingStatus,
    StocktakingTransitionInput,
};

use super::{csv_attachment, parse_action, ExportQuery, ListQuery};
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::{export_to_csv, stocktaking::StocktakingService};
use crate::AppState;

fn service(state: &AppState) -> StocktakingService {
    StocktakingService::new(state.db.clone(), &state.config.warehouse)
}

pub async fn create_stocktaking(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateStocktakingInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<StocktakingSheetWithDetails>>)> {
    let sheet = service(&state).create(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(sheet))))
}

pub async fn list_stocktakings(
    State(state): State<AppState>,
    Query(query): Query<ListQuery<StocktakingStatus>>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<StocktakingSheet>>>> {
    let pagination = query.pagination(&state);
    let page = service(&state).list(query.status, &pagination).await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn get_stocktaking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<StocktakingSheetWithDetails>>> {
    Ok(Json(ApiResponse::ok(service(&state).get(id).await?)))
}

pub async fn record_stocktaking_count(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(stocktaking_pallet_id): Path<Uuid>,
    Json(input): Json<RecordCountInput>,
) -> AppResult<Json<ApiResponse<StocktakingPallet>>> {
    let counted = service(&state)
        .record_count(&current_user.0, stocktaking_pallet_id, input)
        .await?;
    Ok(Json(ApiResponse::ok(counted)))
}

pub async fn transition_stocktaking(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((id, action)): Path<(Uuid, String)>,
    body: Option<Json<StocktakingTransitionInput>>,
) -> AppResult<Json<ApiResponse<StocktakingSheetWithDetails>>> {
    let action: StocktakingAction = parse_action(&action)?;
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let sheet = service(&state)
        .update_status(&current_user.0, id, action, input)
        .await?;
    Ok(Json(ApiResponse::ok(sheet)))
}

/// Variance report as JSON, or CSV with `?format=csv`
pub async fn stocktaking_variance_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let rows = service(&state).variance_report(id).await?;
    if query.wants_csv() {
        let csv = export_to_csv(&rows)?;
        Ok(csv_attachment(&format!("stocktaking_{}_variance.csv", id), csv))
    } else {
        Ok(Json(ApiResponse::ok(rows)).into_response())
    }
}
