//! Route definitions for the warehouse API

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (login and refresh are public)
        .nest("/auth", auth_routes())
        // Protected routes - master data
        .nest("/goods", goods_routes())
        .nest("/suppliers", supplier_routes())
        .nest("/retailers", retailer_routes())
        .nest("/areas", area_routes())
        .nest("/locations", location_routes())
        .nest("/pallets", pallet_routes())
        // Protected routes - inbound
        .nest("/purchase-orders", purchase_order_routes())
        .nest("/goods-receipts", goods_receipt_routes())
        .nest("/goods-receipt-details", goods_receipt_detail_routes())
        // Protected routes - outbound
        .nest("/sales-orders", sales_order_routes())
        .nest("/goods-issues", goods_issue_routes())
        .nest("/goods-issue-details", goods_issue_detail_routes())
        .nest("/back-orders", back_order_routes())
        // Protected routes - stock control
        .nest("/stocktakings", stocktaking_routes())
        .nest("/stocktaking-pallets", stocktaking_pallet_routes())
        .nest("/inventory", inventory_routes())
        .nest("/notifications", notification_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .merge(
            Router::new()
                .route("/me", get(handlers::me))
                .route_layer(middleware::from_fn(auth_middleware)),
        )
}

fn goods_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_goods).post(handlers::create_goods))
        .route("/:goods_id", get(handlers::get_goods))
        .route("/:goods_id/ledger", get(handlers::get_goods_ledger))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_suppliers).post(handlers::create_supplier))
        .route("/:supplier_id", get(handlers::get_supplier))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn retailer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_retailers).post(handlers::create_retailer))
        .route("/:retailer_id", get(handlers::get_retailer))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn area_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_areas).post(handlers::create_area))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_locations).post(handlers::create_location))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn pallet_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_pallets).post(handlers::create_pallet))
        .route("/:pallet_id", get(handlers::get_pallet))
        .route("/:pallet_id/location", put(handlers::assign_pallet_location))
        .route("/:pallet_id/move", post(handlers::move_pallet))
        .route("/:pallet_id/adjust", post(handlers::adjust_pallet))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_purchase_orders).post(handlers::create_purchase_order),
        )
        .route(
            "/:order_id",
            get(handlers::get_purchase_order)
                .put(handlers::update_purchase_order)
                .delete(handlers::delete_purchase_order),
        )
        .route("/:order_id/:action", post(handlers::transition_purchase_order))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn goods_receipt_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_goods_receipts).post(handlers::create_goods_receipt),
        )
        .route("/:note_id", get(handlers::get_goods_receipt))
        .route("/:note_id/:action", post(handlers::transition_goods_receipt))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn goods_receipt_detail_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/:detail_id/inspect",
            post(handlers::inspect_goods_receipt_detail),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

fn sales_order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_sales_orders).post(handlers::create_sales_order),
        )
        .route("/:order_id", get(handlers::get_sales_order))
        .route("/:order_id/:action", post(handlers::transition_sales_order))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Goods issue notes are created by assigning a sales order for picking
fn goods_issue_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_goods_issues))
        .route("/:note_id", get(handlers::get_goods_issue))
        .route("/:note_id/:action", post(handlers::transition_goods_issue))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn goods_issue_detail_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/:detail_id/allocations",
            post(handlers::allocate_goods_issue_detail),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

fn back_order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_back_orders).post(handlers::create_back_order),
        )
        .route("/:back_order_id", get(handlers::get_back_order))
        .route("/:back_order_id/:action", post(handlers::transition_back_order))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn stocktaking_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_stocktakings).post(handlers::create_stocktaking),
        )
        .route("/:sheet_id", get(handlers::get_stocktaking))
        .route("/:sheet_id/variance", get(handlers::stocktaking_variance_report))
        .route("/:sheet_id/:action", post(handlers::transition_stocktaking))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn stocktaking_pallet_routes() -> Router<AppState> {
    Router::new()
        .route("/:pallet_id/count", put(handlers::record_stocktaking_count))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/stock", get(handlers::get_stock_summary))
        .route("/ledger/export", get(handlers::export_ledger))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_notifications))
        .route("/read-all", post(handlers::mark_all_notifications_read))
        .route("/:notification_id/read", post(handlers::mark_notification_read))
        .route_layer(middleware::from_fn(auth_middleware))
}
