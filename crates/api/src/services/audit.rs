use serde_json::Value;
use sqlx::SqlitePool;
use unieats_database::{AuditLog, AuditLogRepository, NewAuditLog, Profile};

use super::error::ServiceError;

const MAX_AUDIT_ROWS: i64 = 500;

/// Record an administrative action. Failures are logged, never surfaced.
pub async fn record(
    pool: &SqlitePool,
    actor: &Profile,
    action: &str,
    entity_type: &str,
    entity_id: &str,
    details: Value,
) {
    let entry = NewAuditLog {
        actor_id: Some(actor.id),
        action: action.to_string(),
        entity_type: entity_type.to_string(),
        entity_id: entity_id.to_string(),
        details: Some(details),
    };
    if let Err(err) = AuditLogRepository::new(pool.clone()).record(&entry).await {
        tracing::warn!(error = %err, action, entity_type, entity_id, "failed to write audit log");
    }
}

pub async fn list_audit_logs(
    pool: &SqlitePool,
    entity_type: Option<&str>,
    limit: Option<i64>,
) -> Result<Vec<AuditLog>, ServiceError> {
    let limit = limit.unwrap_or(100).clamp(1, MAX_AUDIT_ROWS);
    let entity_type = entity_type.map(str::trim).filter(|t| !t.is_empty());
    let logs = AuditLogRepository::new(pool.clone())
        .list(entity_type, limit)
        .await?;
    Ok(logs)
}
