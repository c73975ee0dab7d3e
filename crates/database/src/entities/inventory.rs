//! Inventory entity definitions

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct InventoryItem {
    pub id: i64,
    #[serde(skip_serializing)]
    pub cafeteria_id: i64,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub quantity: f64,
    pub reorder_level: f64,
    pub cost_per_unit_cents: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl InventoryItem {
    /// Stock at or below the reorder level counts as low.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub name: String,
    pub category: String,
    pub unit: String,
    pub quantity: f64,
    pub reorder_level: f64,
    pub cost_per_unit_cents: i64,
}

#[derive(Debug, Clone, Default)]
pub struct InventoryUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub quantity: Option<f64>,
    pub reorder_level: Option<f64>,
    pub cost_per_unit_cents: Option<i64>,
}
