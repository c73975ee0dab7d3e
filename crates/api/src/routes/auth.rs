use axum::{extract::State, http::HeaderMap, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use unieats_database::{NewProfile, Profile, Role};
use utoipa::ToSchema;

use crate::{
    routes::models::{ChangePasswordRequest, SignInRequest, SignUpRequest},
    util::require_bearer,
    ApiError, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub profile: Profile,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub profile: Profile,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignOutResponse {
    pub signed_out: bool,
}

#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    tag = "Auth",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "Student account created and signed in", body = SessionResponse),
        (status = 400, description = "Invalid sign-up payload", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let authenticator = state.authenticator();
    let profile = authenticator
        .register(
            &NewProfile {
                email: req.email,
                full_name: req.full_name,
                phone: req.phone,
                role: Role::Student,
            },
            &req.password,
        )
        .await?;

    let (profile, session) = authenticator
        .sign_in(&profile.email, &req.password, Role::Student)
        .await?;

    Ok(Json(SessionResponse {
        token: session.token,
        expires_at: session.expires_at,
        profile,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    tag = "Auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse),
        (status = 403, description = "Wrong surface for this account or account suspended", body = crate::error::ErrorResponse)
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (profile, session) = state
        .authenticator()
        .sign_in(&req.email, &req.password, req.role)
        .await
        .map_err(|err| {
            tracing::debug!(error = %err, role = %req.role, "sign-in rejected");
            ApiError::from(err)
        })?;

    Ok(Json(SessionResponse {
        token: session.token,
        expires_at: session.expires_at,
        profile,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/sign-out",
    tag = "Auth",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Session ended", body = SignOutResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SignOutResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let signed_out = state.authenticator().sign_out(&token).await?;
    Ok(Json(SignOutResponse { signed_out }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Current profile", body = ProfileResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, ApiError> {
    let (profile, _) = state.authenticate(&headers).await?;
    Ok(Json(ProfileResponse { profile }))
}

#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    tag = "Auth",
    security(("bearerAuth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ProfileResponse),
        (status = 400, description = "New password rejected", body = crate::error::ErrorResponse),
        (status = 401, description = "Current password is wrong", body = crate::error::ErrorResponse)
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let (profile, _) = state.authenticate(&headers).await?;
    state
        .authenticator()
        .change_password(profile.id, &req.current_password, &req.new_password)
        .await?;
    tracing::info!(profile = %profile.public_id, "password changed");
    Ok(Json(ProfileResponse { profile }))
}
