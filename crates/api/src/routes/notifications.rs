use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use unieats_database::{Notification, Page};
use utoipa::ToSchema;

use crate::{
    routes::models::NotificationsQuery,
    services::notifications::{self as notification_service, UnreadCount},
    ApiError, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    security(("bearerAuth" = [])),
    params(NotificationsQuery),
    responses(
        (status = 200, description = "Notifications for the current user", body = NotificationsResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<NotificationsResponse>, ApiError> {
    let (profile, _) = state.authenticate(&headers).await?;
    let notifications = notification_service::list_notifications(
        state.db_pool(),
        profile.id,
        query.unread_only.unwrap_or(false),
        Page::new(query.limit, query.offset),
    )
    .await
    .map_err(|e| e.into_api("load notifications"))?;
    Ok(Json(NotificationsResponse { notifications }))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    tag = "Notifications",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Number of unread notifications", body = UnreadCount),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_unread_count(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UnreadCount>, ApiError> {
    let (profile, _) = state.authenticate(&headers).await?;
    let count = notification_service::unread_count(state.db_pool(), profile.id)
        .await
        .map_err(|e| e.into_api("load notifications"))?;
    Ok(Json(count))
}

#[utoipa::path(
    post,
    path = "/api/notifications/{notification_id}/read",
    tag = "Notifications",
    security(("bearerAuth" = [])),
    params(("notification_id" = i64, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Marked as read", body = SuccessResponse),
        (status = 404, description = "Notification not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(notification_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (profile, _) = state.authenticate(&headers).await?;
    notification_service::mark_read(state.db_pool(), profile.id, notification_id)
        .await
        .map_err(|e| e.into_api("update notification"))?;
    Ok(Json(SuccessResponse { success: true }))
}

#[utoipa::path(
    post,
    path = "/api/notifications/read-all",
    tag = "Notifications",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "All notifications marked as read", body = MarkAllReadResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let (profile, _) = state.authenticate(&headers).await?;
    let updated = notification_service::mark_all_read(state.db_pool(), profile.id)
        .await
        .map_err(|e| e.into_api("update notifications"))?;
    Ok(Json(MarkAllReadResponse { updated }))
}

#[utoipa::path(
    delete,
    path = "/api/notifications/{notification_id}",
    tag = "Notifications",
    security(("bearerAuth" = [])),
    params(("notification_id" = i64, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification deleted", body = SuccessResponse),
        (status = 404, description = "Notification not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    Path(notification_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (profile, _) = state.authenticate(&headers).await?;
    notification_service::delete_notification(state.db_pool(), profile.id, notification_id)
        .await
        .map_err(|e| e.into_api("delete notification"))?;
    Ok(Json(SuccessResponse { success: true }))
}
