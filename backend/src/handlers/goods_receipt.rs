//! Goods receipt note handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::{
    ApiResponse, CreateGoodsReceiptNoteInput, GoodsReceiptNote, GoodsReceiptNoteAction,
    GoodsReceiptNoteDetail, GoodsReceiptNoteStatus, GoodsReceiptNoteWithDetails,
    GoodsReceiptTransitionInput, InspectDetailInput, PaginatedResponse,
};

use super::{parse_action, ListQuery};
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::goods_receipt::GoodsReceiptService;
use crate::AppState;

fn service(state: &AppState) -> GoodsReceiptService {
    GoodsReceiptService::new(state.db.clone(), &state.config.warehouse)
}

pub async fn create_goods_receipt(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateGoodsReceiptNoteInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<GoodsReceiptNoteWithDetails>>)> {
    let note = service(&state).create(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(note))))
}

pub async fn list_goods_receipts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery<GoodsReceiptNoteStatus>>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<GoodsReceiptNote>>>> {
    let pagination = query.pagination(&state);
    let page = service(&state).list(query.status, &pagination).await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn get_goods_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<GoodsReceiptNoteWithDetails>>> {
    Ok(Json(ApiResponse::ok(service(&state).get(id).await?)))
}

/// Record received and rejected packages of one line
pub async fn inspect_goods_receipt_detail(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(detail_id): Path<Uuid>,
    Json(input): Json<InspectDetailInput>,
) -> AppResult<Json<ApiResponse<GoodsReceiptNoteDetail>>> {
    let detail = service(&state)
        .inspect_detail(&current_user.0, detail_id, input)
        .await?;
    Ok(Json(ApiResponse::ok(detail)))
}

pub async fn transition_goods_receipt(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((id, action)): Path<(Uuid, String)>,
    body: Option<Json<GoodsReceiptTransitionInput>>,
) -> AppResult<Json<ApiResponse<GoodsReceiptNoteWithDetails>>> {
    let action: GoodsReceiptNoteAction = parse_action(&action)?;
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let note = service(&state)
        .update_status(&current_user.0, id, action, input)
        .await?;
    Ok(Json(ApiResponse::ok(note)))
}
