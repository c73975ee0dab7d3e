//! Cafeteria and menu entity definitions

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use std::str::FromStr;

use crate::types::DatabaseError;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Cafeteria {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    #[serde(skip_serializing)]
    pub owner_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub opening_hours: Option<String>,
    pub status: CafeteriaStatus,
    pub is_open: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Cafeteria {
    /// Whether students can currently place orders here.
    pub fn accepts_orders(&self) -> bool {
        self.status == CafeteriaStatus::Active && self.is_open
    }
}

#[derive(Debug, Clone)]
pub struct NewCafeteria {
    pub owner_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub opening_hours: Option<String>,
    pub status: CafeteriaStatus,
}

#[derive(Debug, Clone, Default)]
pub struct CafeteriaUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub opening_hours: Option<String>,
    pub is_open: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CafeteriaStatus {
    Pending,
    Active,
    Suspended,
}

impl CafeteriaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CafeteriaStatus::Pending => "pending",
            CafeteriaStatus::Active => "active",
            CafeteriaStatus::Suspended => "suspended",
        }
    }
}

impl FromStr for CafeteriaStatus {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CafeteriaStatus::Pending),
            "active" => Ok(CafeteriaStatus::Active),
            "suspended" => Ok(CafeteriaStatus::Suspended),
            other => Err(DatabaseError::validation(format!(
                "unknown cafeteria status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct MenuItem {
    pub id: i64,
    #[serde(skip_serializing)]
    pub cafeteria_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price_cents: i64,
    pub is_available: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price_cents: i64,
    pub is_available: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub is_available: Option<bool>,
}
