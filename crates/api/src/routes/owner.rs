//! Cafeteria owner back-office, mounted under `/api/cafeteria`.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use unieats_database::{Cafeteria, InventoryItem, MenuItem, Page, Role};
use utoipa::ToSchema;

use crate::{
    routes::{
        cafeterias::CafeteriaResponse,
        models::{
            AdjustInventoryRequest, AvailabilityRequest, CreateInventoryItemRequest,
            CreateMenuItemRequest, DashboardQuery, OrdersQuery, UpdateCafeteriaRequest,
            UpdateInventoryItemRequest, UpdateMenuItemRequest, UpdateOrderStatusRequest,
        },
        notifications::SuccessResponse,
        orders::{OrderResponse, OrdersResponse},
    },
    services::{
        cafeterias as cafeteria_service,
        metrics::{self, CafeteriaDashboard},
        orders as order_service,
    },
    ApiError, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuItemsResponse {
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuItemResponse {
    pub item: MenuItem,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryResponse {
    pub items: Vec<InventoryItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryItemResponse {
    pub item: InventoryItem,
}

/// Authenticate a cafeteria manager and load the cafeteria they run.
async fn owner_cafeteria(state: &AppState, headers: &HeaderMap) -> Result<Cafeteria, ApiError> {
    let owner = state.require_role(headers, &[Role::CafeteriaManager]).await?;
    cafeteria_service::owned_cafeteria(state.db_pool(), &owner)
        .await
        .map_err(|e| e.into_api("load your cafeteria"))
}

#[utoipa::path(
    get,
    path = "/api/cafeteria/profile",
    tag = "Cafeteria owner",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Owned cafeteria", body = CafeteriaResponse),
        (status = 403, description = "No cafeteria linked to this account", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CafeteriaResponse>, ApiError> {
    let cafeteria = owner_cafeteria(&state, &headers).await?;
    Ok(Json(CafeteriaResponse { cafeteria }))
}

#[utoipa::path(
    put,
    path = "/api/cafeteria/profile",
    tag = "Cafeteria owner",
    security(("bearerAuth" = [])),
    request_body = UpdateCafeteriaRequest,
    responses(
        (status = 200, description = "Cafeteria updated", body = CafeteriaResponse),
        (status = 400, description = "Invalid update", body = crate::error::ErrorResponse),
        (status = 403, description = "No cafeteria linked to this account", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpdateCafeteriaRequest>,
) -> Result<Json<CafeteriaResponse>, ApiError> {
    let cafeteria = owner_cafeteria(&state, &headers).await?;
    let cafeteria = cafeteria_service::update_profile(state.db_pool(), &cafeteria, req)
        .await
        .map_err(|e| e.into_api("update cafeteria"))?;
    Ok(Json(CafeteriaResponse { cafeteria }))
}

#[utoipa::path(
    get,
    path = "/api/cafeteria/menu",
    tag = "Cafeteria owner",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Every menu item, available or not", body = MenuItemsResponse),
        (status = 403, description = "No cafeteria linked to this account", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_menu(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MenuItemsResponse>, ApiError> {
    let cafeteria = owner_cafeteria(&state, &headers).await?;
    let items = cafeteria_service::list_menu(state.db_pool(), &cafeteria)
        .await
        .map_err(|e| e.into_api("load menu"))?;
    Ok(Json(MenuItemsResponse { items }))
}

#[utoipa::path(
    post,
    path = "/api/cafeteria/menu",
    tag = "Cafeteria owner",
    security(("bearerAuth" = [])),
    request_body = CreateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item created", body = MenuItemResponse),
        (status = 400, description = "Invalid menu item", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_menu_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateMenuItemRequest>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let cafeteria = owner_cafeteria(&state, &headers).await?;
    let item = cafeteria_service::create_menu_item(state.db_pool(), &cafeteria, req)
        .await
        .map_err(|e| e.into_api("create menu item"))?;
    Ok(Json(MenuItemResponse { item }))
}

#[utoipa::path(
    put,
    path = "/api/cafeteria/menu/{item_id}",
    tag = "Cafeteria owner",
    security(("bearerAuth" = [])),
    params(("item_id" = i64, Path, description = "Menu item id")),
    request_body = UpdateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item updated", body = MenuItemResponse),
        (status = 404, description = "Menu item not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_menu_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<UpdateMenuItemRequest>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let cafeteria = owner_cafeteria(&state, &headers).await?;
    let item = cafeteria_service::update_menu_item(state.db_pool(), &cafeteria, item_id, req)
        .await
        .map_err(|e| e.into_api("update menu item"))?;
    Ok(Json(MenuItemResponse { item }))
}

#[utoipa::path(
    delete,
    path = "/api/cafeteria/menu/{item_id}",
    tag = "Cafeteria owner",
    security(("bearerAuth" = [])),
    params(("item_id" = i64, Path, description = "Menu item id")),
    responses(
        (status = 200, description = "Menu item deleted", body = SuccessResponse),
        (status = 404, description = "Menu item not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let cafeteria = owner_cafeteria(&state, &headers).await?;
    cafeteria_service::delete_menu_item(state.db_pool(), &cafeteria, item_id)
        .await
        .map_err(|e| e.into_api("delete menu item"))?;
    Ok(Json(SuccessResponse { success: true }))
}

#[utoipa::path(
    post,
    path = "/api/cafeteria/menu/{item_id}/availability",
    tag = "Cafeteria owner",
    security(("bearerAuth" = [])),
    params(("item_id" = i64, Path, description = "Menu item id")),
    request_body = AvailabilityRequest,
    responses(
        (status = 200, description = "Availability changed", body = MenuItemResponse),
        (status = 404, description = "Menu item not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn set_menu_availability(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<AvailabilityRequest>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let cafeteria = owner_cafeteria(&state, &headers).await?;
    let item = cafeteria_service::set_menu_availability(
        state.db_pool(),
        &cafeteria,
        item_id,
        req.is_available,
    )
    .await
    .map_err(|e| e.into_api("update menu item"))?;
    Ok(Json(MenuItemResponse { item }))
}

#[utoipa::path(
    get,
    path = "/api/cafeteria/orders",
    tag = "Cafeteria owner",
    security(("bearerAuth" = [])),
    params(OrdersQuery),
    responses(
        (status = 200, description = "Orders placed with this cafeteria, newest first", body = OrdersResponse),
        (status = 403, description = "No cafeteria linked to this account", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<OrdersResponse>, ApiError> {
    let cafeteria = owner_cafeteria(&state, &headers).await?;
    let orders = order_service::list_cafeteria_orders(
        state.db_pool(),
        &cafeteria,
        query.status,
        Page::new(query.limit, query.offset),
    )
    .await
    .map_err(|e| e.into_api("load orders"))?;
    Ok(Json(OrdersResponse { orders }))
}

#[utoipa::path(
    patch,
    path = "/api/cafeteria/orders/{order_id}/status",
    tag = "Cafeteria owner",
    security(("bearerAuth" = [])),
    params(("order_id" = String, Path, description = "Order public identifier")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status changed", body = OrderResponse),
        (status = 400, description = "Transition not allowed", body = crate::error::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Order changed concurrently", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let cafeteria = owner_cafeteria(&state, &headers).await?;
    let order = order_service::update_cafeteria_order_status(
        state.db_pool(),
        &cafeteria,
        &order_id,
        req.status,
    )
    .await
    .map_err(|e| e.into_api("update order"))?;
    Ok(Json(OrderResponse { order }))
}

#[utoipa::path(
    get,
    path = "/api/cafeteria/inventory",
    tag = "Cafeteria owner",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Inventory items", body = InventoryResponse),
        (status = 403, description = "No cafeteria linked to this account", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<InventoryResponse>, ApiError> {
    let cafeteria = owner_cafeteria(&state, &headers).await?;
    let items = cafeteria_service::list_inventory(state.db_pool(), &cafeteria)
        .await
        .map_err(|e| e.into_api("load inventory"))?;
    Ok(Json(InventoryResponse { items }))
}

#[utoipa::path(
    post,
    path = "/api/cafeteria/inventory",
    tag = "Cafeteria owner",
    security(("bearerAuth" = [])),
    request_body = CreateInventoryItemRequest,
    responses(
        (status = 200, description = "Inventory item created", body = InventoryItemResponse),
        (status = 400, description = "Invalid inventory item", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_inventory_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateInventoryItemRequest>,
) -> Result<Json<InventoryItemResponse>, ApiError> {
    let cafeteria = owner_cafeteria(&state, &headers).await?;
    let item = cafeteria_service::create_inventory_item(state.db_pool(), &cafeteria, req)
        .await
        .map_err(|e| e.into_api("create inventory item"))?;
    Ok(Json(InventoryItemResponse { item }))
}

#[utoipa::path(
    put,
    path = "/api/cafeteria/inventory/{item_id}",
    tag = "Cafeteria owner",
    security(("bearerAuth" = [])),
    params(("item_id" = i64, Path, description = "Inventory item id")),
    request_body = UpdateInventoryItemRequest,
    responses(
        (status = 200, description = "Inventory item updated", body = InventoryItemResponse),
        (status = 404, description = "Inventory item not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_inventory_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<UpdateInventoryItemRequest>,
) -> Result<Json<InventoryItemResponse>, ApiError> {
    let cafeteria = owner_cafeteria(&state, &headers).await?;
    let item = cafeteria_service::update_inventory_item(state.db_pool(), &cafeteria, item_id, req)
        .await
        .map_err(|e| e.into_api("update inventory item"))?;
    Ok(Json(InventoryItemResponse { item }))
}

#[utoipa::path(
    delete,
    path = "/api/cafeteria/inventory/{item_id}",
    tag = "Cafeteria owner",
    security(("bearerAuth" = [])),
    params(("item_id" = i64, Path, description = "Inventory item id")),
    responses(
        (status = 200, description = "Inventory item deleted", body = SuccessResponse),
        (status = 404, description = "Inventory item not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_inventory_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let cafeteria = owner_cafeteria(&state, &headers).await?;
    cafeteria_service::delete_inventory_item(state.db_pool(), &cafeteria, item_id)
        .await
        .map_err(|e| e.into_api("delete inventory item"))?;
    Ok(Json(SuccessResponse { success: true }))
}

#[utoipa::path(
    post,
    path = "/api/cafeteria/inventory/{item_id}/adjust",
    tag = "Cafeteria owner",
    security(("bearerAuth" = [])),
    params(("item_id" = i64, Path, description = "Inventory item id")),
    request_body = AdjustInventoryRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = InventoryItemResponse),
        (status = 400, description = "Adjustment would leave negative stock", body = crate::error::ErrorResponse),
        (status = 404, description = "Inventory item not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<AdjustInventoryRequest>,
) -> Result<Json<InventoryItemResponse>, ApiError> {
    let cafeteria = owner_cafeteria(&state, &headers).await?;
    let item = cafeteria_service::adjust_inventory(state.db_pool(), &cafeteria, item_id, req.delta)
        .await
        .map_err(|e| e.into_api("adjust inventory"))?;
    Ok(Json(InventoryItemResponse { item }))
}

#[utoipa::path(
    get,
    path = "/api/cafeteria/inventory/low-stock",
    tag = "Cafeteria owner",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Items at or below their reorder level", body = InventoryResponse),
        (status = 403, description = "No cafeteria linked to this account", body = crate::error::ErrorResponse)
    )
)]
pub async fn low_stock(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<InventoryResponse>, ApiError> {
    let cafeteria = owner_cafeteria(&state, &headers).await?;
    let limit = state.dashboard().low_stock_limit;
    let items = cafeteria_service::low_stock(state.db_pool(), &cafeteria, limit)
        .await
        .map_err(|e| e.into_api("load inventory"))?;
    Ok(Json(InventoryResponse { items }))
}

#[utoipa::path(
    get,
    path = "/api/cafeteria/dashboard",
    tag = "Cafeteria owner",
    security(("bearerAuth" = [])),
    params(DashboardQuery),
    responses(
        (status = 200, description = "Sales metrics over the requested window", body = CafeteriaDashboard),
        (status = 403, description = "No cafeteria linked to this account", body = crate::error::ErrorResponse)
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<CafeteriaDashboard>, ApiError> {
    let cafeteria = owner_cafeteria(&state, &headers).await?;
    let dashboard =
        metrics::cafeteria_dashboard(state.db_pool(), &cafeteria, query.days, state.dashboard())
            .await
            .map_err(|e| e.into_api("load dashboard"))?;
    Ok(Json(dashboard))
}
