use axum::{extract::State, Json};
use serde::Serialize;
use unieats_database::CafeteriaApplication;
use utoipa::ToSchema;

use crate::{
    routes::models::SubmitApplicationRequest, services::applications as application_service,
    ApiError, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ApplicationResponse {
    pub application: CafeteriaApplication,
}

#[utoipa::path(
    post,
    path = "/api/applications",
    tag = "Applications",
    request_body = SubmitApplicationRequest,
    responses(
        (status = 200, description = "Application received", body = ApplicationResponse),
        (status = 400, description = "Invalid application", body = crate::error::ErrorResponse),
        (status = 500, description = "Failed to submit application", body = crate::error::ErrorResponse)
    )
)]
pub async fn submit_application(
    State(state): State<AppState>,
    Json(req): Json<SubmitApplicationRequest>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let application = application_service::submit(state.db_pool(), req)
        .await
        .map_err(|e| e.into_api("submit application"))?;
    Ok(Json(ApplicationResponse { application }))
}
