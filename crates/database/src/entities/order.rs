//! Order entity definitions

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use std::str::FromStr;

use crate::types::DatabaseError;

/// An order row joined with the names of the student and cafeteria it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Order {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    pub order_number: String,
    #[serde(skip_serializing)]
    pub student_id: i64,
    pub student_public_id: String,
    pub student_name: String,
    #[serde(skip_serializing)]
    pub cafeteria_id: i64,
    pub cafeteria_public_id: String,
    pub cafeteria_name: String,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    pub service_fee_cents: i64,
    pub commission_cents: i64,
    pub total_cents: i64,
    pub admin_revenue_cents: i64,
    pub cafeteria_revenue_cents: i64,
    pub pickup_time: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct OrderItem {
    pub id: i64,
    #[serde(skip_serializing)]
    pub order_id: i64,
    pub menu_item_id: Option<i64>,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

/// A sold line joined with its parent order status, used for best-seller rankings.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SoldLine {
    pub order_id: i64,
    pub status: OrderStatus,
    pub item_name: String,
    pub quantity: i64,
    pub line_total_cents: i64,
}

/// Monetary breakdown of an order. All figures are in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct RevenueSplit {
    pub subtotal_cents: i64,
    pub service_fee_cents: i64,
    pub commission_cents: i64,
    pub total_cents: i64,
    pub admin_revenue_cents: i64,
    pub cafeteria_revenue_cents: i64,
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub menu_item_id: i64,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl NewOrderLine {
    /// `None` when the product does not fit in an `i64`.
    pub fn line_total_cents(&self) -> Option<i64> {
        self.unit_price_cents.checked_mul(self.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub student_id: i64,
    pub cafeteria_id: i64,
    pub split: RevenueSplit,
    pub pickup_time: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<NewOrderLine>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub student_id: Option<i64>,
    pub cafeteria_id: Option<i64>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Forward progress runs pending → preparing → ready → completed; an order can
    /// only be cancelled before it is ready.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Preparing)
                | (OrderStatus::Preparing, OrderStatus::Ready)
                | (OrderStatus::Ready, OrderStatus::Completed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Preparing, OrderStatus::Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl FromStr for OrderStatus {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DatabaseError::validation(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
