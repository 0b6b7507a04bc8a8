//! Sales order handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::{
    ApiResponse, CreateSalesOrderInput, PaginatedResponse, SalesOrder, SalesOrderAction,
    SalesOrderStatus, SalesOrderTransitionInput, SalesOrderWithDetails,
};

use super::{parse_action, ListQuery};
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::sales_order::SalesOrderService;
use crate::AppState;

fn service(state: &AppState) -> SalesOrderService {
    SalesOrderService::new(state.db.clone(), &state.config.warehouse)
}

pub async fn create_sales_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSalesOrderInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<SalesOrderWithDetails>>)> {
    let order = service(&state).create(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(order))))
}

pub async fn list_sales_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery<SalesOrderStatus>>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<SalesOrder>>>> {
    let pagination = query.pagination(&state);
    let page = service(&state).list(query.status, &pagination).await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn get_sales_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SalesOrderWithDetails>>> {
    Ok(Json(ApiResponse::ok(service(&state).get(id).await?)))
}

pub async fn transition_sales_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((id, action)): Path<(Uuid, String)>,
    body: Option<Json<SalesOrderTransitionInput>>,
) -> AppResult<Json<ApiResponse<SalesOrderWithDetails>>> {
    let action: SalesOrderAction = parse_action(&action)?;
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let order = service(&state)
        .update_status(&current_user.0, id, action, input)
        .await?;
    Ok(Json(ApiResponse::ok(order)))
}
