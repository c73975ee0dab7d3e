use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use unieats_database::{Order, Page, Role};
use utoipa::ToSchema;

use crate::{
    routes::models::{OrdersQuery, PlaceOrderRequest},
    services::orders::{self as order_service, OrderDetail},
    ApiError, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct OrdersResponse {
    pub orders: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub order: Order,
}

#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    security(("bearerAuth" = [])),
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Order placed", body = OrderDetail),
        (status = 400, description = "Invalid order", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Only students can order", body = crate::error::ErrorResponse),
        (status = 404, description = "Cafeteria not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn place_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<Json<OrderDetail>, ApiError> {
    let student = state.require_role(&headers, &[Role::Student]).await?;
    let detail = order_service::place_order(state.db_pool(), state.pricing(), &student, req)
        .await
        .map_err(|e| e.into_api("place order"))?;
    Ok(Json(detail))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    security(("bearerAuth" = [])),
    params(OrdersQuery),
    responses(
        (status = 200, description = "Own orders, newest first", body = OrdersResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 500, description = "Failed to load orders", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<OrdersResponse>, ApiError> {
    let student = state.require_role(&headers, &[Role::Student]).await?;
    let orders = order_service::list_student_orders(
        state.db_pool(),
        &student,
        query.status,
        Page::new(query.limit, query.offset),
    )
    .await
    .map_err(|e| e.into_api("load orders"))?;
    Ok(Json(OrdersResponse { orders }))
}

#[utoipa::path(
    get,
    path = "/api/orders/{order_id}",
    tag = "Orders",
    security(("bearerAuth" = [])),
    params(("order_id" = String, Path, description = "Order public identifier")),
    responses(
        (status = 200, description = "Order with its items", body = OrderDetail),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<OrderDetail>, ApiError> {
    let student = state.require_role(&headers, &[Role::Student]).await?;
    let detail = order_service::get_student_order(state.db_pool(), &student, &order_id)
        .await
        .map_err(|e| e.into_api("load order"))?;
    Ok(Json(detail))
}

#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/cancel",
    tag = "Orders",
    security(("bearerAuth" = [])),
    params(("order_id" = String, Path, description = "Order public identifier")),
    responses(
        (status = 200, description = "Order cancelled", body = OrderResponse),
        (status = 400, description = "Order is no longer pending", body = crate::error::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<OrderResponse>, ApiError> {
    let student = state.require_role(&headers, &[Role::Student]).await?;
    let order = order_service::cancel_order(state.db_pool(), &student, &order_id)
        .await
        .map_err(|e| e.into_api("cancel order"))?;
    Ok(Json(OrderResponse { order }))
}
