use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use unieats_database::Cafeteria;
use utoipa::ToSchema;

use crate::{
    routes::models::CafeteriaSearchQuery,
    services::cafeterias::{self as cafeteria_service, CafeteriaMenu},
    ApiError, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct CafeteriasResponse {
    pub cafeterias: Vec<Cafeteria>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CafeteriaResponse {
    pub cafeteria: Cafeteria,
}

#[utoipa::path(
    get,
    path = "/api/cafeterias",
    tag = "Cafeterias",
    params(CafeteriaSearchQuery),
    responses(
        (status = 200, description = "Active cafeterias", body = CafeteriasResponse),
        (status = 500, description = "Failed to load cafeterias", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_cafeterias(
    State(state): State<AppState>,
    Query(query): Query<CafeteriaSearchQuery>,
) -> Result<Json<CafeteriasResponse>, ApiError> {
    let cafeterias = cafeteria_service::list_active(state.db_pool(), query.search)
        .await
        .map_err(|e| e.into_api("load cafeterias"))?;
    Ok(Json(CafeteriasResponse { cafeterias }))
}

#[utoipa::path(
    get,
    path = "/api/cafeterias/{cafeteria_id}",
    tag = "Cafeterias",
    params(("cafeteria_id" = String, Path, description = "Cafeteria public identifier")),
    responses(
        (status = 200, description = "Cafeteria details", body = CafeteriaResponse),
        (status = 404, description = "Cafeteria not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_cafeteria(
    State(state): State<AppState>,
    Path(cafeteria_id): Path<String>,
) -> Result<Json<CafeteriaResponse>, ApiError> {
    let cafeteria = cafeteria_service::get_public(state.db_pool(), &cafeteria_id)
        .await
        .map_err(|e| e.into_api("load cafeteria"))?;
    Ok(Json(CafeteriaResponse { cafeteria }))
}

#[utoipa::path(
    get,
    path = "/api/cafeterias/{cafeteria_id}/menu",
    tag = "Cafeterias",
    params(("cafeteria_id" = String, Path, description = "Cafeteria public identifier")),
    responses(
        (status = 200, description = "Available menu items grouped by category", body = CafeteriaMenu),
        (status = 404, description = "Cafeteria not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_menu(
    State(state): State<AppState>,
    Path(cafeteria_id): Path<String>,
) -> Result<Json<CafeteriaMenu>, ApiError> {
    let menu = cafeteria_service::public_menu(state.db_pool(), &cafeteria_id)
        .await
        .map_err(|e| e.into_api("load menu"))?;
    Ok(Json(menu))
}
