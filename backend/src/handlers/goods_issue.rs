//! Goods issue note handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::{
    AllocateInput, ApiResponse, GoodsIssueAllocation, GoodsIssueNote, GoodsIssueNoteAction,
    GoodsIssueNoteStatus, GoodsIssueNoteWithDetails, GoodsIssueTransitionInput,
    PaginatedResponse,
};

use super::{parse_action, ListQuery};
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::goods_issue::GoodsIssueService;
use crate::AppState;

fn service(state: &AppState) -> GoodsIssueService {
    GoodsIssueService::new(state.db.clone(), &state.config.warehouse)
}

pub async fn list_goods_issues(
    State(state): State<AppState>,
    Query(query): Query<ListQuery<GoodsIssueNoteStatus>>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<GoodsIssueNote>>>> {
    let pagination = query.pagination(&state);
    let page = service(&state).list(query.status, &pagination).await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn get_goods_issue(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<GoodsIssueNoteWithDetails>>> {
    Ok(Json(ApiResponse::ok(service(&state).get(id).await?)))
}

/// Pick packages from a pallet for one issue line
pub async fn allocate_goods_issue_detail(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(detail_id): Path<Uuid>,
    Json(input): Json<AllocateInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<GoodsIssueAllocation>>)> {
    let allocation = service(&state)
        .allocate(&current_user.0, detail_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(allocation))))
}

pub async fn transition_goods_issue(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((id, action)): Path<(Uuid, String)>,
    body: Option<Json<GoodsIssueTransitionInput>>,
) -> AppResult<Json<ApiResponse<GoodsIssueNoteWithDetails>>> {
    let action: GoodsIssueNoteAction = parse_action(&action)?;
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let note = service(&state)
        .update_status(&current_user.0, id, action, input)
        .await?;
    Ok(Json(ApiResponse::ok(note)))
}
