use axum::http::HeaderMap;
use sqlx::SqlitePool;
use unieats_auth::{AuthSession, Authenticator};
use unieats_config::{AppConfig, DashboardConfig, PricingConfig};
use unieats_database::{Profile, Role};

use crate::{util::require_bearer, ApiError};

#[derive(Clone)]
pub struct AppState {
    pool: SqlitePool,
    authenticator: Authenticator,
    pricing: PricingConfig,
    dashboard: DashboardConfig,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        authenticator: Authenticator,
        pricing: PricingConfig,
        dashboard: DashboardConfig,
    ) -> Self {
        Self {
            pool,
            authenticator,
            pricing,
            dashboard,
        }
    }

    pub fn from_config(pool: SqlitePool, config: &AppConfig) -> Self {
        let authenticator = Authenticator::new(pool.clone(), config.auth.clone());
        Self::new(pool, authenticator, config.pricing, config.dashboard)
    }

    pub fn db_pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    pub fn dashboard(&self) -> &DashboardConfig {
        &self.dashboard
    }

    /// Resolve the bearer token of a request into the signed-in profile.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<(Profile, AuthSession), ApiError> {
        let token = require_bearer(headers)?;
        self.authenticator
            .authenticate_token(&token)
            .await
            .map_err(ApiError::from)
    }

    /// Like [`AppState::authenticate`], but the profile must hold one of `roles`.
    pub async fn require_role(&self, headers: &HeaderMap, roles: &[Role]) -> Result<Profile, ApiError> {
        let (profile, _) = self.authenticate(headers).await?;
        if !roles.contains(&profile.role) {
            tracing::debug!(profile = %profile.public_id, role = %profile.role, "role not permitted");
            return Err(ApiError::forbidden("You do not have access to this resource"));
        }
        Ok(profile)
    }
}
