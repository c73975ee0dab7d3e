//! Order repository for database operations.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::entities::{NewOrder, Order, OrderFilter, OrderItem, OrderStatus, SoldLine};
use crate::ids::{format_timestamp, new_public_id, order_number};
use crate::types::{DatabaseError, DatabaseResult, Page};

const ORDER_COLUMNS: &str = "SELECT o.id, o.public_id, o.order_number, o.student_id, s.public_id AS student_public_id, s.full_name AS student_name, o.cafeteria_id, c.public_id AS cafeteria_public_id, c.name AS cafeteria_name, o.status, o.subtotal_cents, o.service_fee_cents, o.commission_cents, o.total_cents, o.admin_revenue_cents, o.cafeteria_revenue_cents, o.pickup_time, o.notes, o.created_at, o.updated_at FROM orders o JOIN profiles s ON s.id = o.student_id JOIN cafeterias c ON c.id = o.cafeteria_id";

/// Repository for orders and their line items
#[derive(Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an order and all of its lines in a single transaction
    pub async fn create(&self, order: &NewOrder) -> DatabaseResult<Order> {
        if order.lines.is_empty() {
            return Err(DatabaseError::validation("an order needs at least one item"));
        }

        let now = Utc::now();
        let created_at = format_timestamp(now);
        let public_id = new_public_id();
        let split = order.split;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO orders (public_id, order_number, student_id, cafeteria_id, status, subtotal_cents, service_fee_cents, commission_cents, total_cents, admin_revenue_cents, cafeteria_revenue_cents, pickup_time, notes, created_at, updated_at) VALUES (?, ?, ?, ?, 'pending', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(order_number(now))
        .bind(order.student_id)
        .bind(order.cafeteria_id)
        .bind(split.subtotal_cents)
        .bind(split.service_fee_cents)
        .bind(split.commission_cents)
        .bind(split.total_cents)
        .bind(split.admin_revenue_cents)
        .bind(split.cafeteria_revenue_cents)
        .bind(&order.pickup_time)
        .bind(&order.notes)
        .bind(&created_at)
        .bind(&created_at)
        .execute(&mut *tx)
        .await?;

        let order_id = result.last_insert_rowid();
        for line in &order.lines {
            let line_total = line
                .line_total_cents()
                .ok_or_else(|| DatabaseError::validation("Order line total is too large"))?;
            sqlx::query(
                "INSERT INTO order_items (order_id, menu_item_id, item_name, quantity, unit_price_cents, line_total_cents) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(line.menu_item_id)
            .bind(&line.item_name)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line_total)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.find_by_id(order_id)
            .await?
            .ok_or_else(|| DatabaseError::InternalError("created order not found".into()))
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!("{ORDER_COLUMNS} WHERE o.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<Order>> {
        let order =
            sqlx::query_as::<_, Order>(&format!("{ORDER_COLUMNS} WHERE o.public_id = ?"))
                .bind(public_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(order)
    }

    /// Line items of an order in insertion order
    pub async fn items_for(&self, order_id: i64) -> DatabaseResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, menu_item_id, item_name, quantity, unit_price_cents, line_total_cents FROM order_items WHERE order_id = ? ORDER BY id ASC",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// List orders matching the filter, newest first
    pub async fn list(&self, filter: &OrderFilter, page: Page) -> DatabaseResult<Vec<Order>> {
        let mut builder = QueryBuilder::<Sqlite>::new(ORDER_COLUMNS);
        builder.push(" WHERE 1 = 1");

        if let Some(student_id) = filter.student_id {
            builder.push(" AND o.student_id = ").push_bind(student_id);
        }
        if let Some(cafeteria_id) = filter.cafeteria_id {
            builder.push(" AND o.cafeteria_id = ").push_bind(cafeteria_id);
        }
        if let Some(status) = filter.status {
            builder.push(" AND o.status = ").push_bind(status);
        }

        builder
            .push(" ORDER BY o.created_at DESC, o.id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let orders = builder
            .build_query_as::<Order>()
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    /// Move an order from `from` to `to`. Returns `None` when the stored status no
    /// longer matches `from`, so concurrent updates cannot skip a step.
    pub async fn update_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> DatabaseResult<Option<Order>> {
        let result = sqlx::query(
            "UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(to)
        .bind(format_timestamp(Utc::now()))
        .bind(id)
        .bind(from)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    /// All orders created at or after `since`, optionally for one cafeteria, oldest first
    pub async fn list_since(
        &self,
        cafeteria_id: Option<i64>,
        since: &str,
    ) -> DatabaseResult<Vec<Order>> {
        let mut builder = QueryBuilder::<Sqlite>::new(ORDER_COLUMNS);
        builder.push(" WHERE o.created_at >= ").push_bind(since.to_owned());
        if let Some(cafeteria_id) = cafeteria_id {
            builder.push(" AND o.cafeteria_id = ").push_bind(cafeteria_id);
        }
        builder.push(" ORDER BY o.created_at ASC, o.id ASC");

        let orders = builder
            .build_query_as::<Order>()
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    /// Order lines sold by a cafeteria since `since`
    pub async fn sold_lines_since(
        &self,
        cafeteria_id: i64,
        since: &str,
    ) -> DatabaseResult<Vec<SoldLine>> {
        let lines = sqlx::query_as::<_, SoldLine>(
            "SELECT oi.order_id, o.status, oi.item_name, oi.quantity, oi.line_total_cents
             FROM order_items oi JOIN orders o ON o.id = oi.order_id
             WHERE o.cafeteria_id = ? AND o.created_at >= ?
             ORDER BY oi.id ASC",
        )
        .bind(cafeteria_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }
}
