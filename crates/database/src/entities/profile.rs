//! Profile entity definitions

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use std::str::FromStr;

use crate::types::DatabaseError;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Profile {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub status: ProfileStatus,
    pub created_at: String,
    pub updated_at: String,
    pub last_sign_in_at: Option<String>,
}

impl Profile {
    pub fn is_suspended(&self) -> bool {
        self.status == ProfileStatus::Suspended
    }
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileFilter {
    pub role: Option<Role>,
    pub status: Option<ProfileStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    CafeteriaManager,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::CafeteriaManager, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::CafeteriaManager => "cafeteria_manager",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "cafeteria_manager" => Ok(Role::CafeteriaManager),
            "admin" => Ok(Role::Admin),
            other => Err(DatabaseError::validation(format!("unknown role '{other}'"))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    Active,
    Suspended,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::Active => "active",
            ProfileStatus::Suspended => "suspended",
        }
    }
}

impl FromStr for ProfileStatus {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProfileStatus::Active),
            "suspended" => Ok(ProfileStatus::Suspended),
            other => Err(DatabaseError::validation(format!(
                "unknown profile status '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_as_snake_case() {
        let json = serde_json::to_string(&Role::CafeteriaManager).unwrap();
        assert_eq!(json, "\"cafeteria_manager\"");
    }
}
