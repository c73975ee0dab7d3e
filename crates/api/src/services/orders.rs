use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use unieats_config::PricingConfig;
use unieats_database::{
    Cafeteria, CafeteriaRepository, MenuRepository, NewNotification, NewOrder, NewOrderLine,
    Order, OrderFilter, OrderItem, OrderRepository, OrderStatus, Page, Profile,
};
use utoipa::ToSchema;

use super::{error::ServiceError, notifications, pricing};
use crate::routes::models::{OrderLineRequest, PlaceOrderRequest};
use crate::util::clean;

pub const MIN_QUANTITY: i64 = 1;
pub const MAX_QUANTITY: i64 = 50;
const MAX_NOTES_LEN: usize = 500;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Collapse repeated menu items into one line each, keeping first-seen order.
fn merge_lines(lines: &[OrderLineRequest]) -> Result<Vec<(i64, i64)>, ServiceError> {
    let mut merged: Vec<(i64, i64)> = Vec::new();
    let mut positions: HashMap<i64, usize> = HashMap::new();

    for line in lines {
        if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&line.quantity) {
            return Err(ServiceError::bad_request(format!(
                "Quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY}"
            )));
        }
        match positions.get(&line.menu_item_id) {
            Some(&index) => merged[index].1 += line.quantity,
            None => {
                positions.insert(line.menu_item_id, merged.len());
                merged.push((line.menu_item_id, line.quantity));
            }
        }
    }

    if merged.iter().any(|(_, quantity)| *quantity > MAX_QUANTITY) {
        return Err(ServiceError::bad_request(format!(
            "Quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY}"
        )));
    }
    Ok(merged)
}

async fn with_items(repo: &OrderRepository, order: Order) -> Result<OrderDetail, ServiceError> {
    let items = repo.items_for(order.id).await?;
    Ok(OrderDetail { order, items })
}

/// Place an order for `student`. Prices are copied from the current menu and the
/// revenue split is fixed at placement time.
pub async fn place_order(
    pool: &SqlitePool,
    pricing_config: &PricingConfig,
    student: &Profile,
    req: PlaceOrderRequest,
) -> Result<OrderDetail, ServiceError> {
    if req.items.is_empty() {
        return Err(ServiceError::bad_request("An order needs at least one item"));
    }
    let requested = merge_lines(&req.items)?;

    let notes = clean(req.notes);
    if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES_LEN) {
        return Err(ServiceError::bad_request(format!(
            "Notes must be at most {MAX_NOTES_LEN} characters"
        )));
    }

    let cafeteria = CafeteriaRepository::new(pool.clone())
        .find_by_public_id(req.cafeteria_id.trim())
        .await?
        .ok_or_else(|| ServiceError::not_found("Cafeteria not found"))?;
    if !cafeteria.accepts_orders() {
        return Err(ServiceError::bad_request("This cafeteria is not accepting orders right now"));
    }

    let ids: Vec<i64> = requested.iter().map(|(id, _)| *id).collect();
    let menu: HashMap<i64, _> = MenuRepository::new(pool.clone())
        .find_many(cafeteria.id, &ids)
        .await?
        .into_iter()
        .map(|item| (item.id, item))
        .collect();

    let mut lines = Vec::with_capacity(requested.len());
    for (menu_item_id, quantity) in requested {
        let item = menu
            .get(&menu_item_id)
            .filter(|item| item.is_available)
            .ok_or_else(|| {
                ServiceError::bad_request(format!("Menu item {menu_item_id} is not available"))
            })?;
        lines.push(NewOrderLine {
            menu_item_id,
            item_name: item.name.clone(),
            quantity,
            unit_price_cents: item.price_cents,
        });
    }

    let subtotal = lines.iter().try_fold(0_i64, |acc, line| {
        line.line_total_cents().and_then(|total| acc.checked_add(total))
    });
    let split = subtotal
        .and_then(|subtotal| pricing::revenue_split(subtotal, pricing_config))
        .ok_or_else(|| ServiceError::bad_request("Order total is too large"))?;

    let repo = OrderRepository::new(pool.clone());
    let order = repo
        .create(&NewOrder {
            student_id: student.id,
            cafeteria_id: cafeteria.id,
            split,
            pickup_time: clean(req.pickup_time),
            notes,
            lines,
        })
        .await?;

    tracing::info!(
        order = %order.order_number,
        cafeteria = %cafeteria.public_id,
        total_cents = order.total_cents,
        "order placed"
    );

    notifications::notify(
        pool,
        NewNotification::new(
            cafeteria.owner_id,
            "order_placed",
            "New order",
            format!("Order {} was placed by {}", order.order_number, order.student_name),
        )
        .related("order", order.public_id.clone()),
    )
    .await;

    with_items(&repo, order).await
}

pub async fn list_student_orders(
    pool: &SqlitePool,
    student: &Profile,
    status: Option<OrderStatus>,
    page: Page,
) -> Result<Vec<Order>, ServiceError> {
    let filter = OrderFilter {
        student_id: Some(student.id),
        status,
        ..OrderFilter::default()
    };
    let orders = OrderRepository::new(pool.clone()).list(&filter, page).await?;
    Ok(orders)
}

async fn student_order(
    repo: &OrderRepository,
    student: &Profile,
    public_id: &str,
) -> Result<Order, ServiceError> {
    repo.find_by_public_id(public_id)
        .await?
        .filter(|order| order.student_id == student.id)
        .ok_or_else(|| ServiceError::not_found("Order not found"))
}

pub async fn get_student_order(
    pool: &SqlitePool,
    student: &Profile,
    public_id: &str,
) -> Result<OrderDetail, ServiceError> {
    let repo = OrderRepository::new(pool.clone());
    let order = student_order(&repo, student, public_id).await?;
    with_items(&repo, order).await
}

/// Students may withdraw an order until the kitchen starts on it.
pub async fn cancel_order(
    pool: &SqlitePool,
    student: &Profile,
    public_id: &str,
) -> Result<Order, ServiceError> {
    let repo = OrderRepository::new(pool.clone());
    let order = student_order(&repo, student, public_id).await?;
    if order.status != OrderStatus::Pending {
        return Err(ServiceError::bad_request("Only pending orders can be cancelled"));
    }

    let cancelled = repo
        .update_status(order.id, OrderStatus::Pending, OrderStatus::Cancelled)
        .await?
        .ok_or_else(|| ServiceError::conflict("The order was updated in the meantime"))?;

    if let Some(cafeteria) = CafeteriaRepository::new(pool.clone())
        .find_by_id(cancelled.cafeteria_id)
        .await?
    {
        notifications::notify(
            pool,
            NewNotification::new(
                cafeteria.owner_id,
                "order_cancelled",
                "Order cancelled",
                format!("Order {} was cancelled by the student", cancelled.order_number),
            )
            .related("order", cancelled.public_id.clone()),
        )
        .await;
    }

    Ok(cancelled)
}

pub async fn list_cafeteria_orders(
    pool: &SqlitePool,
    cafeteria: &Cafeteria,
    status: Option<OrderStatus>,
    page: Page,
) -> Result<Vec<Order>, ServiceError> {
    let filter = OrderFilter {
        cafeteria_id: Some(cafeteria.id),
        status,
        ..OrderFilter::default()
    };
    let orders = OrderRepository::new(pool.clone()).list(&filter, page).await?;
    Ok(orders)
}

/// Advance an order of `cafeteria` along the status machine and tell the student.
pub async fn update_cafeteria_order_status(
    pool: &SqlitePool,
    cafeteria: &Cafeteria,
    public_id: &str,
    next: OrderStatus,
) -> Result<Order, ServiceError> {
    let repo = OrderRepository::new(pool.clone());
    let order = repo
        .find_by_public_id(public_id)
        .await?
        .filter(|order| order.cafeteria_id == cafeteria.id)
        .ok_or_else(|| ServiceError::not_found("Order not found"))?;

    if !order.status.can_transition_to(next) {
        return Err(ServiceError::bad_request(format!(
            "Cannot move an order from {} to {}",
            order.status, next
        )));
    }

    let updated = repo
        .update_status(order.id, order.status, next)
        .await?
        .ok_or_else(|| ServiceError::conflict("The order was updated in the meantime"))?;

    tracing::info!(order = %updated.order_number, from = %order.status, to = %next, "order status changed");

    let (title, message) = match next {
        OrderStatus::Preparing => ("Order in preparation", "is being prepared"),
        OrderStatus::Ready => ("Order ready", "is ready for pickup"),
        OrderStatus::Completed => ("Order completed", "has been completed"),
        OrderStatus::Cancelled => ("Order cancelled", "was cancelled by the cafeteria"),
        OrderStatus::Pending => ("Order updated", "was updated"),
    };
    notifications::notify(
        pool,
        NewNotification::new(
            updated.student_id,
            "order_status",
            title,
            format!("Your order {} {}", updated.order_number, message),
        )
        .related("order", updated.public_id.clone()),
    )
    .await;

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(menu_item_id: i64, quantity: i64) -> OrderLineRequest {
        OrderLineRequest {
            menu_item_id,
            quantity,
        }
    }

    #[test]
    fn merge_combines_repeated_items() {
        let merged = merge_lines(&[line(3, 1), line(1, 2), line(3, 4)]).unwrap();
        assert_eq!(merged, vec![(3, 5), (1, 2)]);
    }

    #[test]
    fn merge_rejects_out_of_range_quantities() {
        assert!(merge_lines(&[line(1, 0)]).is_err());
        assert!(merge_lines(&[line(1, 51)]).is_err());
        assert!(merge_lines(&[line(1, -2)]).is_err());
        assert!(merge_lines(&[line(1, 30), line(1, 30)]).is_err());
        assert!(merge_lines(&[line(1, 50)]).is_ok());
    }
}
