use serde::Serialize;
use sqlx::SqlitePool;
use unieats_database::{NewNotification, Notification, NotificationRepository, Page};
use utoipa::ToSchema;

use super::error::ServiceError;

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCount {
    pub unread: i64,
}

/// Deliver a notification without failing the caller; a lost notification is
/// logged and otherwise ignored.
pub async fn notify(pool: &SqlitePool, notification: NewNotification) {
    let repo = NotificationRepository::new(pool.clone());
    if let Err(err) = repo.create(&notification).await {
        tracing::warn!(
            error = %err,
            user_id = notification.user_id,
            kind = %notification.kind,
            "failed to store notification"
        );
    }
}

pub async fn list_notifications(
    pool: &SqlitePool,
    user_id: i64,
    unread_only: bool,
    page: Page,
) -> Result<Vec<Notification>, ServiceError> {
    let notifications = NotificationRepository::new(pool.clone())
        .list_for_user(user_id, unread_only, page)
        .await?;
    Ok(notifications)
}

pub async fn unread_count(pool: &SqlitePool, user_id: i64) -> Result<UnreadCount, ServiceError> {
    let unread = NotificationRepository::new(pool.clone())
        .unread_count(user_id)
        .await?;
    Ok(UnreadCount { unread })
}

pub async fn mark_read(pool: &SqlitePool, user_id: i64, id: i64) -> Result<(), ServiceError> {
    let updated = NotificationRepository::new(pool.clone())
        .mark_read(user_id, id)
        .await?;
    if !updated {
        return Err(ServiceError::not_found("Notification not found"));
    }
    Ok(())
}

pub async fn mark_all_read(pool: &SqlitePool, user_id: i64) -> Result<u64, ServiceError> {
    let updated = NotificationRepository::new(pool.clone())
        .mark_all_read(user_id)
        .await?;
    Ok(updated)
}

pub async fn delete_notification(pool: &SqlitePool, user_id: i64, id: i64) -> Result<(), ServiceError> {
    let deleted = NotificationRepository::new(pool.clone())
        .delete(user_id, id)
        .await?;
    if !deleted {
        return Err(ServiceError::not_found("Notification not found"));
    }
    Ok(())
}
