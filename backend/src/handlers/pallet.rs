//! Pallet handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::{AdjustPalletInput, ApiResponse, AssignLocationInput, CreatePalletInput, Pallet};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::pallet::PalletService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PalletFilter {
    pub goods_id: Uuid,
}

pub async fn create_pallet(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePalletInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Pallet>>)> {
    let service = PalletService::new(state.db);
    let pallet = service.create(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(pallet))))
}

pub async fn get_pallet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Pallet>>> {
    let service = PalletService::new(state.db);
    Ok(Json(ApiResponse::ok(service.get(id).await?)))
}

/// Pallets of a goods item in FEFO order
pub async fn list_pallets(
    State(state): State<AppState>,
    Query(filter): Query<PalletFilter>,
) -> AppResult<Json<ApiResponse<Vec<Pallet>>>> {
    let service = PalletService::new(state.db);
    Ok(Json(ApiResponse::ok(service.list_fefo(filter.goods_id).await?)))
}

pub async fn assign_pallet_location(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<AssignLocationInput>,
) -> AppResult<Json<ApiResponse<Pallet>>> {
    let service = PalletService::new(state.db);
    let pallet = service
        .assign_location(&current_user.0, id, input.location_id)
        .await?;
    Ok(Json(ApiResponse::ok(pallet)))
}

pub async fn move_pallet(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<AssignLocationInput>,
) -> AppResult<Json<ApiResponse<Pallet>>> {
    let service = PalletService::new(state.db);
    let pallet = service
        .move_pallet(&current_user.0, id, input.location_id)
        .await?;
    Ok(Json(ApiResponse::ok(pallet)))
}

pub async fn adjust_pallet(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<AdjustPalletInput>,
) -> AppResult<Json<ApiResponse<Pallet>>> {
    let service = PalletService::new(state.db);
    let pallet = service.adjust(&current_user.0, id, input).await?;
    Ok(Json(ApiResponse::ok(pallet)))
}
