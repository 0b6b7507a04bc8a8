//! Purchase order handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::{
    ApiResponse, CreatePurchaseOrderInput, PaginatedResponse, PurchaseOrder, PurchaseOrderAction,
    PurchaseOrderStatus, PurchaseOrderTransitionInput, PurchaseOrderWithDetails,
    UpdatePurchaseOrderInput,
};

use super::{parse_action, ListQuery};
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::purchase_order::PurchaseOrderService;
use crate::AppState;

fn service(state: &AppState) -> PurchaseOrderService {
    PurchaseOrderService::new(state.db.clone(), &state.config.warehouse)
}

pub async fn create_purchase_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePurchaseOrderInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<PurchaseOrderWithDetails>>)> {
    let order = service(&state).create(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(order))))
}

pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery<PurchaseOrderStatus>>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<PurchaseOrder>>>> {
    let pagination = query.pagination(&state);
    let page = service(&state).list(query.status, &pagination).await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PurchaseOrderWithDetails>>> {
    Ok(Json(ApiResponse::ok(service(&state).get(id).await?)))
}

pub async fn update_purchase_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdatePurchaseOrderInput>,
) -> AppResult<Json<ApiResponse<PurchaseOrderWithDetails>>> {
    let order = service(&state).update(&current_user.0, id, input).await?;
    Ok(Json(ApiResponse::ok(order)))
}

pub async fn delete_purchase_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    service(&state).delete(&current_user.0, id).await?;
    Ok(Json(ApiResponse::message_only(200, "Đã xóa đơn mua hàng")))
}

/// `POST /purchase-orders/:id/:action`
pub async fn transition_purchase_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((id, action)): Path<(Uuid, String)>,
    body: Option<Json<PurchaseOrderTransitionInput>>,
) -> AppResult<Json<ApiResponse<PurchaseOrderWithDetails>>> {
    let action: PurchaseOrderAction = parse_action(&action)?;
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let order = service(&state)
        .update_status(&current_user.0, id, action, input)
        .await?;
    Ok(Json(ApiResponse::ok(order)))
}
