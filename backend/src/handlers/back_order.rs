//! Back order handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::{
    ApiResponse, BackOrder, BackOrderAction, BackOrderStatus, CreateBackOrderInput,
    PaginatedResponse,
};

use super::{parse_action, ListQuery};
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::back_order::BackOrderService;
use crate::AppState;

pub async fn create_back_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateBackOrderInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<BackOrder>>)> {
    let service = BackOrderService::new(state.db);
    let back_order = service.create(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(back_order))))
}

pub async fn list_back_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery<BackOrderStatus>>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<BackOrder>>>> {
    let pagination = query.pagination(&state);
    let service = BackOrderService::new(state.db);
    Ok(Json(ApiResponse::ok(service.list(query.status, &pagination).await?)))
}

pub async fn get_back_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BackOrder>>> {
    let service = BackOrderService::new(state.db);
    Ok(Json(ApiResponse::ok(service.get(id).await?)))
}

/// `POST /back-orders/:id/fulfil` or `/cancel`
pub async fn transition_back_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((id, action)): Path<(Uuid, String)>,
) -> AppResult<Json<ApiResponse<BackOrder>>> {
    let action: BackOrderAction = parse_action(&action)?;
    let service = BackOrderService::new(state.db);
    let back_order = service.update_status(&current_user.0, id, action).await?;
    Ok(Json(ApiResponse::ok(back_order)))
}
