//! Audit log repository for database operations.

use sqlx::SqlitePool;

use crate::entities::{AuditLog, NewAuditLog};
use crate::ids::now_timestamp;
use crate::types::DatabaseResult;

/// Append-only store of administrative actions
#[derive(Clone)]
pub struct AuditLogRepository {
    pool: SqlitePool,
}

impl AuditLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record an action and return the new row id
    pub async fn record(&self, entry: &NewAuditLog) -> DatabaseResult<i64> {
        let details = entry.details.as_ref().map(|value| value.to_string());
        let result = sqlx::query(
            "INSERT INTO audit_logs (actor_id, action, entity_type, entity_id, details, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.actor_id)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(details)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Most recent entries first, optionally restricted to one entity type
    pub async fn list(&self, entity_type: Option<&str>, limit: i64) -> DatabaseResult<Vec<AuditLog>> {
        let logs = sqlx::query_as::<_, AuditLog>(
            "SELECT a.id, a.actor_id, p.public_id AS actor_public_id, p.full_name AS actor_name, a.action, a.entity_type, a.entity_id, a.details, a.created_at
             FROM audit_logs a LEFT JOIN profiles p ON p.id = a.actor_id
             WHERE (?1 IS NULL OR a.entity_type = ?1)
             ORDER BY a.created_at DESC, a.id DESC
             LIMIT ?2",
        )
        .bind(entity_type)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }
}
