//! Menu item repository for database operations.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::entities::{MenuItem, MenuItemUpdate, NewMenuItem};
use crate::ids::now_timestamp;
use crate::types::{DatabaseError, DatabaseResult};

const MENU_COLUMNS: &str = "SELECT id, cafeteria_id, name, description, category, price_cents, is_available, created_at, updated_at FROM menu_items";

/// Repository for menu items. Every lookup is scoped to a cafeteria.
#[derive(Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Items for a cafeteria ordered by category then name
    pub async fn list_for_cafeteria(
        &self,
        cafeteria_id: i64,
        available_only: bool,
    ) -> DatabaseResult<Vec<MenuItem>> {
        let mut sql = format!("{MENU_COLUMNS} WHERE cafeteria_id = ?");
        if available_only {
            sql.push_str(" AND is_available = 1");
        }
        sql.push_str(" ORDER BY category ASC, name ASC, id ASC");

        let items = sqlx::query_as::<_, MenuItem>(&sql)
            .bind(cafeteria_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn find(&self, cafeteria_id: i64, item_id: i64) -> DatabaseResult<Option<MenuItem>> {
        let item = sqlx::query_as::<_, MenuItem>(&format!(
            "{MENU_COLUMNS} WHERE cafeteria_id = ? AND id = ?"
        ))
        .bind(cafeteria_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    /// Fetch the subset of `item_ids` that belongs to the cafeteria
    pub async fn find_many(
        &self,
        cafeteria_id: i64,
        item_ids: &[i64],
    ) -> DatabaseResult<Vec<MenuItem>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(MENU_COLUMNS);
        builder
            .push(" WHERE cafeteria_id = ")
            .push_bind(cafeteria_id)
            .push(" AND id IN (");
        let mut separated = builder.separated(", ");
        for id in item_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let items = builder
            .build_query_as::<MenuItem>()
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn create(&self, cafeteria_id: i64, item: &NewMenuItem) -> DatabaseResult<MenuItem> {
        let now = now_timestamp();
        let result = sqlx::query(
            "INSERT INTO menu_items (cafeteria_id, name, description, category, price_cents, is_available, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(cafeteria_id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.category)
        .bind(item.price_cents)
        .bind(item.is_available)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find(cafeteria_id, result.last_insert_rowid())
            .await?
            .ok_or_else(|| DatabaseError::InternalError("created menu item not found".into()))
    }

    /// Apply a partial update. Returns `None` when the item is not on this cafeteria's menu.
    pub async fn update(
        &self,
        cafeteria_id: i64,
        item_id: i64,
        update: &MenuItemUpdate,
    ) -> DatabaseResult<Option<MenuItem>> {
        let result = sqlx::query(
            "UPDATE menu_items SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                category = COALESCE(?, category),
                price_cents = COALESCE(?, price_cents),
                is_available = COALESCE(?, is_available),
                updated_at = ?
             WHERE cafeteria_id = ? AND id = ?",
        )
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.category)
        .bind(update.price_cents)
        .bind(update.is_available)
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

    pub async fn set_availability(
        &self,
        cafeteria_id: i64,
        item_id: i64,
        is_available: bool,
    ) -> DatabaseResult<Option<MenuItem>> {
        self.update(
            cafeteria_id,
            item_id,
            &MenuItemUpdate {
                is_available: Some(is_available),
                ..MenuItemUpdate::default()
            },
        )
        .await
    }

    /// Delete an item. Past order lines keep their name and price snapshot.
    pub async fn delete(&self, cafeteria_id: i64, item_id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM menu_items WHERE cafeteria_id = ? AND id = ?")
            .bind(cafeteria_id)
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
