//! Notification entity definitions

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub related_type: Option<String>,
    pub related_id: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i64,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub related_type: Option<String>,
    pub related_id: Option<String>,
}

impl NewNotification {
    pub fn new(
        user_id: i64,
        kind: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            kind: kind.into(),
            title: title.into(),
            message: message.into(),
            related_type: None,
            related_id: None,
        }
    }

    pub fn related(
        mut self,
        related_type: impl Into<String>,
        related_id: impl Into<String>,
    ) -> Self {
        self.related_type = Some(related_type.into());
        self.related_id = Some(related_id.into());
        self
    }
}
