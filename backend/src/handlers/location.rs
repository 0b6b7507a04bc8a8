//! Area and location handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::{ApiResponse, Area, CreateAreaInput, CreateLocationInput, Location};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::location::LocationService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LocationFilter {
    pub area_id: Option<Uuid>,
    pub available: Option<bool>,
}

pub async fn create_area(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateAreaInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Area>>)> {
    let service = LocationService::new(state.db);
    let area = service.create_area(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(area))))
}

pub async fn list_areas(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Area>>>> {
    let service = LocationService::new(state.db);
    Ok(Json(ApiResponse::ok(service.list_areas().await?)))
}

pub async fn create_location(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateLocationInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Location>>)> {
    let service = LocationService::new(state.db);
    let location = service.create_location(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(location))))
}

/// List locations, optionally by area and availability
pub async fn list_locations(
    State(state): State<AppState>,
    Query(filter): Query<LocationFilter>,
) -> AppResult<Json<ApiResponse<Vec<Location>>>> {
    let service = LocationService::new(state.db);
    let locations = service.list_locations(filter.area_id, filter.available).await?;
    Ok(Json(ApiResponse::ok(locations)))
}
