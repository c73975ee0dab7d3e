//! Cafeteria application entity definitions

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use std::str::FromStr;

use crate::types::DatabaseError;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct CafeteriaApplication {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    pub business_name: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub status: ApplicationStatus,
    pub review_notes: Option<String>,
    #[serde(skip_serializing)]
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<String>,
    #[serde(skip_serializing)]
    pub cafeteria_id: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub business_name: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(DatabaseError::validation(format!(
                "unknown application status '{other}'"
            ))),
        }
    }
}
