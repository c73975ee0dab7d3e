//! Audit log entity definitions

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// An audit log row joined with the acting profile's public id and name.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct AuditLog {
    pub id: i64,
    #[serde(skip_serializing)]
    pub actor_id: Option<i64>,
    pub actor_public_id: Option<String>,
    pub actor_name: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub details: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub actor_id: Option<i64>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub details: Option<serde_json::Value>,
}
