//! Notification repository for database operations.

use sqlx::SqlitePool;

use crate::entities::{NewNotification, Notification};
use crate::ids::now_timestamp;
use crate::types::{DatabaseError, DatabaseResult, Page};

const NOTIFICATION_COLUMNS: &str = "SELECT id, user_id, kind, title, message, is_read, related_type, related_id, created_at FROM notifications";

/// Repository for notification database operations. Reads and writes are scoped to
/// the owning profile.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    /// Create a new notification repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new notification
    pub async fn create(&self, request: &NewNotification) -> DatabaseResult<Notification> {
        let result = sqlx::query(
            "INSERT INTO notifications (user_id, kind, title, message, is_read, related_type, related_id, created_at) VALUES (?, ?, ?, ?, 0, ?, ?, ?)",
        )
        .bind(request.user_id)
        .bind(&request.kind)
        .bind(&request.title)
        .bind(&request.message)
        .bind(&request.related_type)
        .bind(&request.related_id)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        let notification = sqlx::query_as::<_, Notification>(&format!(
            "{NOTIFICATION_COLUMNS} WHERE id = ?"
        ))
        .bind(result.last_insert_rowid())
        .fetch_optional(&self.pool)
        .await?;

        notification.ok_or_else(|| {
            DatabaseError::InternalError("created notification not found".to_string())
        })
    }

    /// Find notifications for a user, newest first
    pub async fn list_for_user(
        &self,
        user_id: i64,
        unread_only: bool,
        page: Page,
    ) -> DatabaseResult<Vec<Notification>> {
        let mut sql = format!("{NOTIFICATION_COLUMNS} WHERE user_id = ?");
        if unread_only {
            sql.push_str(" AND is_read = 0");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");

        let notifications = sqlx::query_as::<_, Notification>(&sql)
            .bind(user_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(notifications)
    }

    pub async fn unread_count(&self, user_id: i64) -> DatabaseResult<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Mark one notification as read. Returns false when it does not belong to the user.
    pub async fn mark_read(&self, user_id: i64, id: i64) -> DatabaseResult<bool> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark every unread notification as read, returning how many changed
    pub async fn mark_all_read(&self, user_id: i64) -> DatabaseResult<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(&self, user_id: i64, id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
