use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use unieats_database::{ChatMessage, Role, SupportTicket};
use utoipa::ToSchema;

use crate::{
    routes::models::{CreateTicketRequest, ReplyRequest, TicketsQuery, UpdateTicketRequest},
    services::support::{self as support_service, TicketThread},
    ApiError, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct TicketsResponse {
    pub tickets: Vec<SupportTicket>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TicketResponse {
    pub ticket: SupportTicket,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: ChatMessage,
}

#[utoipa::path(
    post,
    path = "/api/support-tickets",
    tag = "Support",
    security(("bearerAuth" = [])),
    request_body = CreateTicketRequest,
    responses(
        (status = 200, description = "Ticket opened", body = TicketThread),
        (status = 400, description = "Invalid ticket", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateTicketRequest>,
) -> Result<Json<TicketThread>, ApiError> {
    let (profile, _) = state.authenticate(&headers).await?;
    let thread = support_service::create_ticket(state.db_pool(), &profile, req)
        .await
        .map_err(|e| e.into_api("create support ticket"))?;
    Ok(Json(thread))
}

#[utoipa::path(
    get,
    path = "/api/support-tickets",
    tag = "Support",
    security(("bearerAuth" = [])),
    params(TicketsQuery),
    responses(
        (status = 200, description = "Own tickets, or every ticket for admins", body = TicketsResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_tickets(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TicketsQuery>,
) -> Result<Json<TicketsResponse>, ApiError> {
    let (profile, _) = state.authenticate(&headers).await?;
    let tickets = support_service::list_tickets(state.db_pool(), &profile, query)
        .await
        .map_err(|e| e.into_api("load support tickets"))?;
    Ok(Json(TicketsResponse { tickets }))
}

#[utoipa::path(
    get,
    path = "/api/support-tickets/{ticket_id}",
    tag = "Support",
    security(("bearerAuth" = [])),
    params(("ticket_id" = String, Path, description = "Ticket public identifier")),
    responses(
        (status = 200, description = "Ticket with its message thread", body = TicketThread),
        (status = 404, description = "Ticket not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<TicketThread>, ApiError> {
    let (profile, _) = state.authenticate(&headers).await?;
    let thread = support_service::get_ticket(state.db_pool(), &profile, &ticket_id)
        .await
        .map_err(|e| e.into_api("load support ticket"))?;
    Ok(Json(thread))
}

#[utoipa::path(
    post,
    path = "/api/support-tickets/{ticket_id}/messages",
    tag = "Support",
    security(("bearerAuth" = [])),
    params(("ticket_id" = String, Path, description = "Ticket public identifier")),
    request_body = ReplyRequest,
    responses(
        (status = 200, description = "Reply posted", body = MessageResponse),
        (status = 400, description = "Ticket is closed or message empty", body = crate::error::ErrorResponse),
        (status = 404, description = "Ticket not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn reply_to_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ReplyRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (profile, _) = state.authenticate(&headers).await?;
    let message = support_service::reply(state.db_pool(), &profile, &ticket_id, &req.content)
        .await
        .map_err(|e| e.into_api("send reply"))?;
    Ok(Json(MessageResponse { message }))
}

#[utoipa::path(
    patch,
    path = "/api/admin/support-tickets/{ticket_id}",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("ticket_id" = String, Path, description = "Ticket public identifier")),
    request_body = UpdateTicketRequest,
    responses(
        (status = 200, description = "Ticket updated", body = TicketResponse),
        (status = 400, description = "Invalid update", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
        (status = 404, description = "Ticket not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateTicketRequest>,
) -> Result<Json<TicketResponse>, ApiError> {
    let admin = state.require_role(&headers, &[Role::Admin]).await?;
    let ticket = support_service::update_ticket(state.db_pool(), &admin, &ticket_id, req)
        .await
        .map_err(|e| e.into_api("update support ticket"))?;
    Ok(Json(TicketResponse { ticket }))
}
