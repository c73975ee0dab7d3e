//! Support ticket and chat entity definitions

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use std::str::FromStr;

use super::profile::Role;
use crate::types::DatabaseError;

/// A support ticket joined with the requester's public id and name.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct SupportTicket {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    pub ticket_number: String,
    #[serde(skip_serializing)]
    pub requester_id: i64,
    pub requester_public_id: String,
    pub requester_name: String,
    pub requester_role: Role,
    pub subject: String,
    pub description: String,
    pub category: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    #[serde(skip_serializing)]
    pub assigned_to: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
    pub resolved_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub requester_id: i64,
    pub requester_role: Role,
    pub subject: String,
    pub description: String,
    pub category: String,
    pub priority: TicketPriority,
}

#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub requester_id: Option<i64>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TicketUpdate {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub assigned_to: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct ChatConversation {
    pub id: i64,
    #[serde(skip_serializing)]
    pub ticket_id: Option<i64>,
    #[serde(skip_serializing)]
    pub requester_id: i64,
    pub subject: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A chat message joined with the sender's public id and name.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct ChatMessage {
    pub id: i64,
    pub conversation_id: i64,
    #[serde(skip_serializing)]
    pub sender_id: i64,
    pub sender_public_id: String,
    pub sender_name: String,
    pub sender_role: Role,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn accepts_replies(&self) -> bool {
        *self != TicketStatus::Closed
    }
}

impl FromStr for TicketStatus {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TicketStatus::Open),
            "in_progress" => Ok(TicketStatus::InProgress),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(DatabaseError::validation(format!(
                "unknown ticket status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
            TicketPriority::Urgent => "urgent",
        }
    }
}

impl FromStr for TicketPriority {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TicketPriority::Low),
            "medium" => Ok(TicketPriority::Medium),
            "high" => Ok(TicketPriority::High),
            "urgent" => Ok(TicketPriority::Urgent),
            other => Err(DatabaseError::validation(format!(
                "unknown ticket priority '{other}'"
            ))),
        }
    }
}
