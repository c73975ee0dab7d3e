//! Operator commands that work directly against the configured database.

use std::fmt;

use anyhow::{bail, Context};
use sqlx::SqlitePool;
use unieats_api::routes::models::{CreateTicketRequest, OrderLineRequest, PlaceOrderRequest};
use unieats_api::services::{orders, support};
use unieats_config::AppConfig;
use unieats_database::{
    CafeteriaRepository, CafeteriaStatus, InventoryRepository, MenuRepository, NewCafeteria,
    NewInventoryItem, NewMenuItem, NewProfile, OrderFilter, OrderRepository, Page, Profile,
    ProfileFilter, ProfileRepository, Role, TicketPriority,
};
use unieats_runtime::BackendServices;

pub const DEMO_PASSWORD: &str = "unieats-demo";

/// Child tables first so foreign keys never block a delete.
const TABLES: [&str; 14] = [
    "chat_messages",
    "chat_conversations",
    "support_tickets",
    "notifications",
    "audit_logs",
    "order_items",
    "orders",
    "inventory_items",
    "menu_items",
    "cafeteria_applications",
    "cafeterias",
    "sessions",
    "user_identities",
    "profiles",
];

#[derive(Debug)]
pub struct SeedSummary {
    pub profiles: usize,
    pub cafeteria: String,
    pub menu_items: usize,
    pub inventory_items: usize,
    pub order_number: String,
    pub ticket_number: String,
}

impl fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Database seeded with demo data:")?;
        writeln!(f, "- {} profiles (password: {DEMO_PASSWORD})", self.profiles)?;
        writeln!(f, "- cafeteria {}", self.cafeteria)?;
        writeln!(f, "- {} menu items", self.menu_items)?;
        writeln!(f, "- {} inventory items", self.inventory_items)?;
        writeln!(f, "- order {}", self.order_number)?;
        writeln!(f, "- support ticket {}", self.ticket_number)?;
        write!(f, "Run 'dump-data' to see the inserted data")
    }
}

pub async fn create_admin(
    services: &BackendServices,
    email: &str,
    password: &str,
    name: &str,
) -> anyhow::Result<Profile> {
    let admin = services
        .authenticator
        .register(
            &NewProfile {
                email: email.to_string(),
                full_name: name.to_string(),
                phone: None,
                role: Role::Admin,
            },
            password,
        )
        .await
        .with_context(|| format!("failed to create admin {email}"))?;
    Ok(admin)
}

/// Populate an empty database with one account per role, an active cafeteria
/// with menu and stock, a pending order and an open support ticket.
pub async fn seed_data(
    services: &BackendServices,
    config: &AppConfig,
) -> anyhow::Result<SeedSummary> {
    let pool = &services.db_pool;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
        .fetch_one(pool)
        .await
        .context("failed to count profiles")?;
    if existing > 0 {
        bail!("database already contains {existing} profiles; run clear-data first");
    }

    let mut profiles = Vec::new();
    for (email, name, role) in [
        ("admin@unieats.local", "Campus Admin", Role::Admin),
        ("manager@unieats.local", "Morgan Manager", Role::CafeteriaManager),
        ("student@unieats.local", "Sam Student", Role::Student),
    ] {
        let profile = services
            .authenticator
            .register(
                &NewProfile {
                    email: email.to_string(),
                    full_name: name.to_string(),
                    phone: None,
                    role,
                },
                DEMO_PASSWORD,
            )
            .await
            .with_context(|| format!("failed to register {email}"))?;
        profiles.push(profile);
    }
    let manager = &profiles[1];
    let student = &profiles[2];

    let cafeteria = CafeteriaRepository::new(pool.clone())
        .create(&NewCafeteria {
            owner_id: manager.id,
            name: "Main Hall Kitchen".to_string(),
            description: Some("Hot meals and fresh salads".to_string()),
            location: Some("Main Hall, ground floor".to_string()),
            opening_hours: Some("Mon-Fri 08:00-20:00".to_string()),
            status: CafeteriaStatus::Active,
        })
        .await
        .context("failed to create demo cafeteria")?;

    let menu = MenuRepository::new(pool.clone());
    let mut menu_items = Vec::new();
    for (name, category, price_cents) in [
        ("Veggie Burger", "mains", 850),
        ("Chicken Curry", "mains", 925),
        ("Garden Salad", "salads", 600),
        ("Iced Tea", "drinks", 250),
    ] {
        let item = menu
            .create(
                cafeteria.id,
                &NewMenuItem {
                    name: name.to_string(),
                    description: None,
                    category: category.to_string(),
                    price_cents,
                    is_available: true,
                },
            )
            .await
            .with_context(|| format!("failed to create menu item {name}"))?;
        menu_items.push(item);
    }

    let inventory = InventoryRepository::new(pool.clone());
    let stock = [
        ("Burger buns", "bakery", "unit", 40.0, 20.0, 35),
        ("Rice", "dry goods", "kg", 3.0, 5.0, 180),
        ("Lettuce", "produce", "head", 12.0, 6.0, 90),
    ];
    for (name, category, unit, quantity, reorder_level, cost_per_unit_cents) in stock {
        inventory
            .create(
                cafeteria.id,
                &NewInventoryItem {
                    name: name.to_string(),
                    category: category.to_string(),
                    unit: unit.to_string(),
                    quantity,
                    reorder_level,
                    cost_per_unit_cents,
                },
            )
            .await
            .with_context(|| format!("failed to create inventory item {name}"))?;
    }

    let order = orders::place_order(
        pool,
        &config.pricing,
        student,
        PlaceOrderRequest {
            cafeteria_id: cafeteria.public_id.clone(),
            items: vec![
                OrderLineRequest {
                    menu_item_id: menu_items[0].id,
                    quantity: 2,
                },
                OrderLineRequest {
                    menu_item_id: menu_items[3].id,
                    quantity: 1,
                },
            ],
            pickup_time: None,
            notes: Some("Extra napkins please".to_string()),
        },
    )
    .await
    .context("failed to place demo order")?;

    let ticket = support::create_ticket(
        pool,
        student,
        CreateTicketRequest {
            subject: "Allergen information".to_string(),
            description: "Does the veggie burger contain nuts?".to_string(),
            category: Some("menu".to_string()),
            priority: Some(TicketPriority::Low),
        },
    )
    .await
    .context("failed to open demo support ticket")?;

    Ok(SeedSummary {
        profiles: profiles.len(),
        cafeteria: cafeteria.name,
        menu_items: menu_items.len(),
        inventory_items: stock.len(),
        order_number: order.order.order_number,
        ticket_number: ticket.ticket.ticket_number,
    })
}

/// Delete every row of the application tables, returning the per-table counts.
pub async fn clear_data(pool: &SqlitePool) -> anyhow::Result<Vec<(&'static str, u64)>> {
    let mut tx = pool.begin().await.context("failed to open transaction")?;
    let mut deleted = Vec::with_capacity(TABLES.len());

    for table in TABLES {
        let result = sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to delete {table}"))?;
        deleted.push((table, result.rows_affected()));
    }

    tx.commit().await.context("failed to commit clear-data")?;
    Ok(deleted)
}

pub async fn dump_data(pool: &SqlitePool) -> anyhow::Result<()> {
    println!("=== TABLES ===");
    for table in TABLES.iter().rev() {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count {table}"))?;
        println!("{table:<25} {count:>8}");
    }

    let profiles = ProfileRepository::new(pool.clone())
        .list(&ProfileFilter::default(), Page::new(Some(Page::MAX_LIMIT), None))
        .await
        .context("failed to fetch profiles")?;

    println!("\n=== PROFILES ===");
    if profiles.is_empty() {
        println!("No profiles found in database");
    } else {
        println!(
            "{:<26} {:<30} {:<25} {:<18} {:<10}",
            "Public ID", "Email", "Name", "Role", "Status"
        );
        println!("{}", "-".repeat(113));
        for profile in profiles {
            println!(
                "{:<26} {:<30} {:<25} {:<18} {:<10}",
                profile.public_id,
                profile.email,
                profile.full_name,
                profile.role.as_str(),
                profile.status.as_str()
            );
        }
    }

    let cafeterias = CafeteriaRepository::new(pool.clone())
        .list(None, None)
        .await
        .context("failed to fetch cafeterias")?;

    println!("\n=== CAFETERIAS ===");
    if cafeterias.is_empty() {
        println!("No cafeterias found in database");
    } else {
        println!(
            "{:<26} {:<30} {:<10} {:<6} {:<30}",
            "Public ID", "Name", "Status", "Open", "Location"
        );
        println!("{}", "-".repeat(106));
        for cafeteria in cafeterias {
            println!(
                "{:<26} {:<30} {:<10} {:<6} {:<30}",
                cafeteria.public_id,
                cafeteria.name,
                cafeteria.status.as_str(),
                cafeteria.is_open,
                cafeteria.location.as_deref().unwrap_or("NULL")
            );
        }
    }

    let orders = OrderRepository::new(pool.clone())
        .list(&OrderFilter::default(), Page::new(Some(Page::MAX_LIMIT), None))
        .await
        .context("failed to fetch orders")?;

    println!("\n=== ORDERS ===");
    if orders.is_empty() {
        println!("No orders found in database");
    } else {
        println!(
            "{:<22} {:<25} {:<25} {:<10} {:>10} {:>10} {:>10}",
            "Order", "Student", "Cafeteria", "Status", "Total", "Platform", "Cafeteria"
        );
        println!("{}", "-".repeat(118));
        for order in orders {
            println!(
                "{:<22} {:<25} {:<25} {:<10} {:>10} {:>10} {:>10}",
                order.order_number,
                order.student_name,
                order.cafeteria_name,
                order.status.as_str(),
                order.total_cents,
                order.admin_revenue_cents,
                order.cafeteria_revenue_cents
            );
        }
    }

    Ok(())
}
