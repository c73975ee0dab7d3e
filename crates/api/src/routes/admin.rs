//! Admin back-office, mounted under `/api/admin`.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use unieats_database::{AuditLog, Cafeteria, CafeteriaApplication, Profile, Role};
use utoipa::ToSchema;

use crate::{
    routes::{
        applications::ApplicationResponse,
        auth::ProfileResponse,
        cafeterias::{CafeteriaResponse, CafeteriasResponse},
        models::{
            AdminOrdersQuery, ApplicationsQuery, AuditLogsQuery, CafeteriaStatusQuery,
            DashboardQuery, ReviewApplicationRequest, UpdateCafeteriaStatusRequest,
            UpdateUserStatusRequest, UsersQuery,
        },
        orders::OrdersResponse,
    },
    services::{
        admin as admin_service,
        applications::{self as application_service, ApprovedApplication},
        audit as audit_service,
        metrics::{self, AdminDashboard},
    },
    ApiError, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct UsersResponse {
    pub users: Vec<Profile>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApplicationsResponse {
    pub applications: Vec<CafeteriaApplication>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogsResponse {
    pub logs: Vec<AuditLog>,
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(UsersQuery),
    responses(
        (status = 200, description = "Profiles matching the filters", body = UsersResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UsersQuery>,
) -> Result<Json<UsersResponse>, ApiError> {
    state.require_role(&headers, &[Role::Admin]).await?;
    let users = admin_service::list_users(state.db_pool(), query)
        .await
        .map_err(|e| e.into_api("load users"))?;
    Ok(Json(UsersResponse { users }))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{user_id}/status",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "Profile public identifier")),
    request_body = UpdateUserStatusRequest,
    responses(
        (status = 200, description = "Profile status changed", body = ProfileResponse),
        (status = 400, description = "Admins cannot suspend themselves", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_user_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateUserStatusRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let admin = state.require_role(&headers, &[Role::Admin]).await?;
    let profile = admin_service::update_user_status(
        state.db_pool(),
        state.authenticator(),
        &admin,
        &user_id,
        req.status,
    )
    .await
    .map_err(|e| e.into_api("update user"))?;
    Ok(Json(ProfileResponse { profile }))
}

#[utoipa::path(
    get,
    path = "/api/admin/cafeterias",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(CafeteriaStatusQuery),
    responses(
        (status = 200, description = "Cafeterias in any status", body = CafeteriasResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_cafeterias(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CafeteriaStatusQuery>,
) -> Result<Json<CafeteriasResponse>, ApiError> {
    state.require_role(&headers, &[Role::Admin]).await?;
    let cafeterias: Vec<Cafeteria> = admin_service::list_cafeterias(state.db_pool(), query.status)
        .await
        .map_err(|e| e.into_api("load cafeterias"))?;
    Ok(Json(CafeteriasResponse { cafeterias }))
}

#[utoipa::path(
    patch,
    path = "/api/admin/cafeterias/{cafeteria_id}/status",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("cafeteria_id" = String, Path, description = "Cafeteria public identifier")),
    request_body = UpdateCafeteriaStatusRequest,
    responses(
        (status = 200, description = "Cafeteria status changed", body = CafeteriaResponse),
        (status = 404, description = "Cafeteria not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_cafeteria_status(
    State(state): State<AppState>,
    Path(cafeteria_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateCafeteriaStatusRequest>,
) -> Result<Json<CafeteriaResponse>, ApiError> {
    let admin = state.require_role(&headers, &[Role::Admin]).await?;
    let cafeteria =
        admin_service::update_cafeteria_status(state.db_pool(), &admin, &cafeteria_id, req.status)
            .await
            .map_err(|e| e.into_api("update cafeteria"))?;
    Ok(Json(CafeteriaResponse { cafeteria }))
}

#[utoipa::path(
    get,
    path = "/api/admin/applications",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(ApplicationsQuery),
    responses(
        (status = 200, description = "Cafeteria applications, newest first", body = ApplicationsResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_applications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ApplicationsQuery>,
) -> Result<Json<ApplicationsResponse>, ApiError> {
    state.require_role(&headers, &[Role::Admin]).await?;
    let applications = application_service::list(state.db_pool(), query.status)
        .await
        .map_err(|e| e.into_api("load applications"))?;
    Ok(Json(ApplicationsResponse { applications }))
}

#[utoipa::path(
    post,
    path = "/api/admin/applications/{application_id}/approve",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("application_id" = String, Path, description = "Application public identifier")),
    request_body = ReviewApplicationRequest,
    responses(
        (status = 200, description = "Application approved and cafeteria created", body = ApprovedApplication),
        (status = 400, description = "Application already reviewed or applicant has no account", body = crate::error::ErrorResponse),
        (status = 404, description = "Application not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Applicant already runs a cafeteria", body = crate::error::ErrorResponse)
    )
)]
pub async fn approve_application(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<ReviewApplicationRequest>>,
) -> Result<Json<ApprovedApplication>, ApiError> {
    let admin = state.require_role(&headers, &[Role::Admin]).await?;
    let notes = body.and_then(|Json(req)| req.notes);
    let approved = application_service::approve(state.db_pool(), &admin, &application_id, notes)
        .await
        .map_err(|e| e.into_api("approve application"))?;
    Ok(Json(approved))
}

#[utoipa::path(
    post,
    path = "/api/admin/applications/{application_id}/reject",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("application_id" = String, Path, description = "Application public identifier")),
    request_body = ReviewApplicationRequest,
    responses(
        (status = 200, description = "Application rejected", body = ApplicationResponse),
        (status = 400, description = "Application already reviewed", body = crate::error::ErrorResponse),
        (status = 404, description = "Application not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn reject_application(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<ReviewApplicationRequest>>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let admin = state.require_role(&headers, &[Role::Admin]).await?;
    let notes = body.and_then(|Json(req)| req.notes);
    let application = application_service::reject(state.db_pool(), &admin, &application_id, notes)
        .await
        .map_err(|e| e.into_api("reject application"))?;
    Ok(Json(ApplicationResponse { application }))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(AdminOrdersQuery),
    responses(
        (status = 200, description = "Orders across all cafeterias, newest first", body = OrdersResponse),
        (status = 404, description = "Cafeteria filter not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminOrdersQuery>,
) -> Result<Json<OrdersResponse>, ApiError> {
    state.require_role(&headers, &[Role::Admin]).await?;
    let orders = admin_service::list_orders(state.db_pool(), query)
        .await
        .map_err(|e| e.into_api("load orders"))?;
    Ok(Json(OrdersResponse { orders }))
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(DashboardQuery),
    responses(
        (status = 200, description = "Platform metrics over the requested window", body = AdminDashboard),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<AdminDashboard>, ApiError> {
    state.require_role(&headers, &[Role::Admin]).await?;
    let dashboard = metrics::admin_dashboard(state.db_pool(), query.days, state.dashboard())
        .await
        .map_err(|e| e.into_api("load dashboard"))?;
    Ok(Json(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/admin/audit-logs",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(AuditLogsQuery),
    responses(
        (status = 200, description = "Audit trail, newest first", body = AuditLogsResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AuditLogsQuery>,
) -> Result<Json<AuditLogsResponse>, ApiError> {
    state.require_role(&headers, &[Role::Admin]).await?;
    let logs = audit_service::list_audit_logs(
        state.db_pool(),
        query.entity_type.as_deref(),
        query.limit,
    )
    .await
    .map_err(|e| e.into_api("load audit logs"))?;
    Ok(Json(AuditLogsResponse { logs }))
}
