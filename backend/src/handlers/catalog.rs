//! Goods, supplier and retailer handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::{ApiResponse, CreateGoodsInput, CreatePartnerInput, Goods, Retailer, Supplier};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::catalog::CatalogService;
use crate::AppState;

pub async fn create_goods(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateGoodsInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Goods>>)> {
    let service = CatalogService::new(state.db);
    let goods = service.create_goods(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(goods))))
}

pub async fn list_goods(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Goods>>>> {
    let service = CatalogService::new(state.db);
    Ok(Json(ApiResponse::ok(service.list_goods().await?)))
}

pub async fn get_goods(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Goods>>> {
    let service = CatalogService::new(state.db);
    Ok(Json(ApiResponse::ok(service.get_goods(id).await?)))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePartnerInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Supplier>>)> {
    let service = CatalogService::new(state.db);
    let supplier = service.create_supplier(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(supplier))))
}

pub async fn list_suppliers(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Supplier>>>> {
    let service = CatalogService::new(state.db);
    Ok(Json(ApiResponse::ok(service.list_suppliers().await?)))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Supplier>>> {
    let service = CatalogService::new(state.db);
    Ok(Json(ApiResponse::ok(service.get_supplier(id).await?)))
}

pub async fn create_retailer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePartnerInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Retailer>>)> {
    let service = CatalogService::new(state.db);
    let retailer = service.create_retailer(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(retailer))))
}

pub async fn list_retailers(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Retailer>>>> {
    let service = CatalogService::new(state.db);
    Ok(Json(ApiResponse::ok(service.list_retailers().await?)))
}

pub async fn get_retailer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Retailer>>> {
    let service = CatalogService::new(state.db);
    Ok(Json(ApiResponse::ok(service.get_retailer(id).await?)))
}
