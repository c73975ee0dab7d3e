//! Inventory repository for database operations.

use sqlx::SqlitePool;

use crate::entities::{InventoryItem, InventoryUpdate, NewInventoryItem};
use crate::ids::now_timestamp;
use crate::types::{DatabaseError, DatabaseResult};

const INVENTORY_COLUMNS: &str = "SELECT id, cafeteria_id, name, category, unit, quantity, reorder_level, cost_per_unit_cents, created_at, updated_at FROM inventory_items";

/// Repository for a cafeteria's stock records
#[derive(Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, cafeteria_id: i64) -> DatabaseResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(&format!(
            "{INVENTORY_COLUMNS} WHERE cafeteria_id = ? ORDER BY category ASC, name ASC, id ASC"
        ))
        .bind(cafeteria_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn find(
        &self,
        cafeteria_id: i64,
        item_id: i64,
    ) -> DatabaseResult<Option<InventoryItem>> {
        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            "{INVENTORY_COLUMNS} WHERE cafeteria_id = ? AND id = ?"
        ))
        .bind(cafeteria_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn create(
        &self,
        cafeteria_id: i64,
        item: &NewInventoryItem,
    ) -> DatabaseResult<InventoryItem> {
        let now = now_timestamp();
        let result = sqlx::query(
            "INSERT INTO inventory_items (cafeteria_id, name, category, unit, quantity, reorder_level, cost_per_unit_cents, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(cafeteria_id)
        .bind(&item.name)
        .bind(&item.category)
        .bind(&item.unit)
        .bind(item.quantity)
        .bind(item.reorder_level)
        .bind(item.cost_per_unit_cents)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find(cafeteria_id, result.last_insert_rowid())
            .await?
            .ok_or_else(|| DatabaseError::InternalError("created inventory item not found".into()))
    }

    pub async fn update(
        &self,
        cafeteria_id: i64,
        item_id: i64,
        update: &InventoryUpdate,
    ) -> DatabaseResult<Option<InventoryItem>> {
        let result = sqlx::query(
            "UPDATE inventory_items SET
                name = COALESCE(?, name),
                category = COALESCE(?, category),
                unit = COALESCE(?, unit),
                quantity = COALESCE(?, quantity),
                reorder_level = COALESCE(?, reorder_level),
                cost_per_unit_cents = COALESCE(?, cost_per_unit_cents),
                updated_at = ?
             WHERE cafeteria_id = ? AND id = ?",
        )
        .bind(&update.name)
        .bind(&update.category)
        .bind(&update.unit)
        .bind(update.quantity)
        .bind(update.reorder_level)
        .bind(update.cost_per_unit_cents)
        .bind(now_timestamp())
        .bind(cafeteria_id)
        .bind(item_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find(cafeteria_id, item_id).await
    }

    /// Add a signed delta to the stored quantity. The result may not drop below zero.
    pub async fn adjust(
        &self,
        cafeteria_id: i64,
        item_id: i64,
        delta: f64,
    ) -> DatabaseResult<Option<InventoryItem>> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(f64,)> = sqlx::query_as(
            "SELECT quantity FROM inventory_items WHERE cafeteria_id = ? AND id = ?",
        )
        .bind(cafeteria_id)
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((quantity,)) = current else {
            return Ok(None);
        };

        let next = quantity + delta;
        if next < 0.0 {
            return Err(DatabaseError::validation(format!(
                "adjustment would leave {next} in stock"
            )));
        }

        sqlx::query(
            "UPDATE inventory_items SET quantity = ?, updated_at = ? WHERE cafeteria_id = ? AND id = ?",
        )
        .bind(next)
        .bind(now_timestamp())
        .bind(cafeteria_id)
        .bind(item_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.find(cafeteria_id, item_id).await
    }

    pub async fn delete(&self, cafeteria_id: i64, item_id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE cafeteria_id = ? AND id = ?")
            .bind(cafeteria_id)
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Items at or below their reorder level, emptiest first
    pub async fn low_stock(&self, cafeteria_id: i64, limit: i64) -> DatabaseResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(&format!(
            "{INVENTORY_COLUMNS} WHERE cafeteria_id = ? AND quantity <= reorder_level ORDER BY quantity - reorder_level ASC, name ASC LIMIT ?"
        ))
        .bind(cafeteria_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn count_low_stock(&self, cafeteria_id: i64) -> DatabaseResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM inventory_items WHERE cafeteria_id = ? AND quantity <= reorder_level",
        )
        .bind(cafeteria_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
