//! Dashboard metrics computed from the orders inside a trailing window of days.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use unieats_config::DashboardConfig;
use unieats_database::{
    ids::format_timestamp, ApplicationRepository, Cafeteria, InventoryRepository, Order,
    OrderRepository, OrderStatus, ProfileRepository, Role, SoldLine, SupportRepository,
};
use utoipa::ToSchema;

use super::error::ServiceError;

pub const TOP_ITEMS_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct MetricTotals {
    pub order_count: i64,
    pub completed_orders: i64,
    pub cancelled_orders: i64,
    pub gross_cents: i64,
    pub subtotal_cents: i64,
    pub admin_revenue_cents: i64,
    pub cafeteria_revenue_cents: i64,
    pub average_order_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyMetrics {
    /// UTC calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub order_count: i64,
    pub gross_cents: i64,
    pub admin_revenue_cents: i64,
    pub cafeteria_revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CafeteriaMetrics {
    pub cafeteria_id: String,
    pub cafeteria_name: String,
    pub order_count: i64,
    pub gross_cents: i64,
    pub admin_revenue_cents: i64,
    pub cafeteria_revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TopItem {
    pub item_name: String,
    pub quantity: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrderMetrics {
    pub window_days: u32,
    pub from: String,
    pub to: String,
    pub totals: MetricTotals,
    pub by_status: Vec<StatusCount>,
    pub daily: Vec<DailyMetrics>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CafeteriaDashboard {
    pub cafeteria_id: String,
    pub cafeteria_name: String,
    pub metrics: OrderMetrics,
    pub top_items: Vec<TopItem>,
    pub low_stock_items: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoleCount {
    pub role: Role,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminDashboard {
    pub metrics: OrderMetrics,
    pub by_cafeteria: Vec<CafeteriaMetrics>,
    pub users_by_role: Vec<RoleCount>,
    pub pending_applications: i64,
    pub open_tickets: i64,
}

/// First day of a window of `days` days ending today (inclusive).
pub fn window_start(today: NaiveDate, days: u32) -> NaiveDate {
    today - Duration::days(i64::from(days.max(1)) - 1)
}

fn counts_as_revenue(order: &Order) -> bool {
    order.status != OrderStatus::Cancelled
}

fn order_date(order: &Order) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(&order.created_at)
        .ok()
        .map(|at| at.with_timezone(&Utc).date_naive())
}

fn average(total: i64, count: i64) -> i64 {
    if count == 0 {
        0
    } else {
        (total + count / 2) / count
    }
}

/// Aggregate `orders` over the days `from..=to`. Cancelled orders are counted
/// per status but contribute nothing to revenue figures.
pub fn aggregate(orders: &[Order], from: NaiveDate, to: NaiveDate) -> OrderMetrics {
    let mut totals = MetricTotals::default();
    let mut status_counts: HashMap<OrderStatus, i64> = HashMap::new();
    let mut daily: BTreeMap<NaiveDate, DailyMetrics> = BTreeMap::new();

    let mut day = from;
    while day <= to {
        daily.insert(
            day,
            DailyMetrics {
                date: day.format("%Y-%m-%d").to_string(),
                order_count: 0,
                gross_cents: 0,
                admin_revenue_cents: 0,
                cafeteria_revenue_cents: 0,
            },
        );
        day += Duration::days(1);
    }

    let mut revenue_orders = 0;
    for order in orders {
        totals.order_count += 1;
        *status_counts.entry(order.status).or_default() += 1;
        match order.status {
            OrderStatus::Completed => totals.completed_orders += 1,
            OrderStatus::Cancelled => totals.cancelled_orders += 1,
            _ => {}
        }

        let bucket = order_date(order).and_then(|date| daily.get_mut(&date));
        let revenue = counts_as_revenue(order);
        if revenue {
            revenue_orders += 1;
            totals.gross_cents += order.total_cents;
            totals.subtotal_cents += order.subtotal_cents;
            totals.admin_revenue_cents += order.admin_revenue_cents;
            totals.cafeteria_revenue_cents += order.cafeteria_revenue_cents;
        }

        if let Some(bucket) = bucket {
            bucket.order_count += 1;
            if revenue {
                bucket.gross_cents += order.total_cents;
                bucket.admin_revenue_cents += order.admin_revenue_cents;
                bucket.cafeteria_revenue_cents += order.cafeteria_revenue_cents;
            }
        }
    }
    totals.average_order_cents = average(totals.gross_cents, revenue_orders);

    let by_status = OrderStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: status_counts.get(&status).copied().unwrap_or(0),
        })
        .collect();

    let window_days = u32::try_from((to - from).num_days() + 1).unwrap_or(0);

    OrderMetrics {
        window_days,
        from: from.format("%Y-%m-%d").to_string(),
        to: to.format("%Y-%m-%d").to_string(),
        totals,
        by_status,
        daily: daily.into_values().collect(),
    }
}

/// Per-cafeteria revenue, highest gross first, ties by name.
pub fn by_cafeteria(orders: &[Order]) -> Vec<CafeteriaMetrics> {
    let mut grouped: HashMap<i64, CafeteriaMetrics> = HashMap::new();
    for order in orders {
        let entry = grouped
            .entry(order.cafeteria_id)
            .or_insert_with(|| CafeteriaMetrics {
                cafeteria_id: order.cafeteria_public_id.clone(),
                cafeteria_name: order.cafeteria_name.clone(),
                order_count: 0,
                gross_cents: 0,
                admin_revenue_cents: 0,
                cafeteria_revenue_cents: 0,
            });
        entry.order_count += 1;
        if counts_as_revenue(order) {
            entry.gross_cents += order.total_cents;
            entry.admin_revenue_cents += order.admin_revenue_cents;
            entry.cafeteria_revenue_cents += order.cafeteria_revenue_cents;
        }
    }

    let mut rows: Vec<_> = grouped.into_values().collect();
    rows.sort_by(|a, b| {
        b.gross_cents
            .cmp(&a.gross_cents)
            .then_with(|| a.cafeteria_name.cmp(&b.cafeteria_name))
    });
    rows
}

/// Best sellers by quantity, ignoring lines of cancelled orders.
pub fn top_items(lines: &[SoldLine], limit: usize) -> Vec<TopItem> {
    let mut grouped: HashMap<&str, TopItem> = HashMap::new();
    for line in lines.iter().filter(|l| l.status != OrderStatus::Cancelled) {
        let entry = grouped.entry(line.item_name.as_str()).or_insert_with(|| TopItem {
            item_name: line.item_name.clone(),
            quantity: 0,
            revenue_cents: 0,
        });
        entry.quantity += line.quantity;
        entry.revenue_cents += line.line_total_cents;
    }

    let mut items: Vec<_> = grouped.into_values().collect();
    items.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| b.revenue_cents.cmp(&a.revenue_cents))
            .then_with(|| a.item_name.cmp(&b.item_name))
    });
    items.truncate(limit);
    items
}

fn window_bounds(now: DateTime<Utc>, days: u32) -> (NaiveDate, NaiveDate, String) {
    let today = now.date_naive();
    let from = window_start(today, days);
    let since = from
        .and_hms_opt(0, 0, 0)
        .map(|start| format_timestamp(start.and_utc()))
        .unwrap_or_default();
    (from, today, since)
}

pub async fn cafeteria_dashboard(
    pool: &SqlitePool,
    cafeteria: &Cafeteria,
    requested_days: Option<u32>,
    config: &DashboardConfig,
) -> Result<CafeteriaDashboard, ServiceError> {
    let days = config.window(requested_days);
    let (from, to, since) = window_bounds(Utc::now(), days);

    let orders = OrderRepository::new(pool.clone());
    let rows = orders.list_since(Some(cafeteria.id), &since).await?;
    let lines = orders.sold_lines_since(cafeteria.id, &since).await?;
    let low_stock_items = InventoryRepository::new(pool.clone())
        .count_low_stock(cafeteria.id)
        .await?;

    Ok(CafeteriaDashboard {
        cafeteria_id: cafeteria.public_id.clone(),
        cafeteria_name: cafeteria.name.clone(),
        metrics: aggregate(&rows, from, to),
        top_items: top_items(&lines, TOP_ITEMS_LIMIT),
        low_stock_items,
    })
}

pub async fn admin_dashboard(
    pool: &SqlitePool,
    requested_days: Option<u32>,
    config: &DashboardConfig,
) -> Result<AdminDashboard, ServiceError> {
    let days = config.window(requested_days);
    let (from, to, since) = window_bounds(Utc::now(), days);

    let rows = OrderRepository::new(pool.clone())
        .list_since(None, &since)
        .await?;
    let users_by_role = ProfileRepository::new(pool.clone())
        .count_by_role()
        .await?
        .into_iter()
        .map(|(role, count)| RoleCount { role, count })
        .collect();
    let pending_applications = ApplicationRepository::new(pool.clone())
        .count_pending()
        .await?;
    let open_tickets = SupportRepository::new(pool.clone())
        .count_unresolved()
        .await?;

    Ok(AdminDashboard {
        metrics: aggregate(&rows, from, to),
        by_cafeteria: by_cafeteria(&rows),
        users_by_role,
        pending_applications,
        open_tickets,
    })
}
