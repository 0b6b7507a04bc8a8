//! HTTP handlers for notification endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::{ApiResponse, Notification, PaginatedResponse};

use super::page_of;
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::notification::NotificationService;
use crate::AppState;

/// Query parameters for listing notifications
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub unread_only: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct MarkedReadResponse {
    pub updated: u64,
}

/// Notifications of the current user, newest first
pub async fn get_notifications(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Notification>>>> {
    let pagination = page_of(&state, query.page, query.per_page);
    let service = NotificationService::new(state.db);
    let page = service
        .list_mine(
            current_user.0.user_id,
            query.unread_only.unwrap_or(false),
            &pagination,
        )
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// Mark notification as read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(notification_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Notification>>> {
    let service = NotificationService::new(state.db);
    let notification = service
        .mark_read(current_user.0.user_id, notification_id)
        .await?;
    Ok(Json(ApiResponse::ok(notification)))
}

pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<MarkedReadResponse>>> {
    let service = NotificationService::new(state.db);
    let updated = service.mark_all_read(current_user.0.user_id).await?;
    Ok(Json(ApiResponse::ok(MarkedReadResponse { updated })))
}
