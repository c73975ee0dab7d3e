//! Public cafeteria browsing and the owner back-office (profile, menu, inventory).

use serde::Serialize;
use sqlx::SqlitePool;
use unieats_database::{
    Cafeteria, CafeteriaRepository, CafeteriaStatus, CafeteriaUpdate, InventoryItem,
    InventoryRepository, InventoryUpdate, MenuItem, MenuItemUpdate, MenuRepository,
    NewInventoryItem, NewMenuItem, Profile,
};
use utoipa::ToSchema;

use super::error::ServiceError;
use crate::routes::models::{
    CreateInventoryItemRequest, CreateMenuItemRequest, UpdateCafeteriaRequest,
    UpdateInventoryItemRequest, UpdateMenuItemRequest,
};
use crate::util::clean;

const DEFAULT_MENU_CATEGORY: &str = "general";
const DEFAULT_INVENTORY_UNIT: &str = "unit";

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MenuCategory {
    pub category: String,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CafeteriaMenu {
    pub cafeteria: Cafeteria,
    pub categories: Vec<MenuCategory>,
}

/// Group items into categories. Items must already be sorted by category.
pub fn group_by_category(items: Vec<MenuItem>) -> Vec<MenuCategory> {
    let mut categories: Vec<MenuCategory> = Vec::new();
    for item in items {
        match categories.last_mut() {
            Some(group) if group.category == item.category => group.items.push(item),
            _ => categories.push(MenuCategory {
                category: item.category.clone(),
                items: vec![item],
            }),
        }
    }
    categories
}

pub async fn list_active(
    pool: &SqlitePool,
    search: Option<String>,
) -> Result<Vec<Cafeteria>, ServiceError> {
    let search = clean(search);
    let cafeterias = CafeteriaRepository::new(pool.clone())
        .list(Some(CafeteriaStatus::Active), search.as_deref())
        .await?;
    Ok(cafeterias)
}

async fn active_cafeteria(pool: &SqlitePool, public_id: &str) -> Result<Cafeteria, ServiceError> {
    CafeteriaRepository::new(pool.clone())
        .find_by_public_id(public_id)
        .await?
        .filter(|c| c.status == CafeteriaStatus::Active)
        .ok_or_else(|| ServiceError::not_found("Cafeteria not found"))
}

pub async fn get_public(pool: &SqlitePool, public_id: &str) -> Result<Cafeteria, ServiceError> {
    active_cafeteria(pool, public_id).await
}

pub async fn public_menu(pool: &SqlitePool, public_id: &str) -> Result<CafeteriaMenu, ServiceError> {
    let cafeteria = active_cafeteria(pool, public_id).await?;
    let items = MenuRepository::new(pool.clone())
        .list_for_cafeteria(cafeteria.id, true)
        .await?;
    Ok(CafeteriaMenu {
        cafeteria,
        categories: group_by_category(items),
    })
}

/// The cafeteria run by `owner`. Managers without one are refused.
pub async fn owned_cafeteria(pool: &SqlitePool, owner: &Profile) -> Result<Cafeteria, ServiceError> {
    CafeteriaRepository::new(pool.clone())
        .find_by_owner(owner.id)
        .await?
        .ok_or_else(|| ServiceError::forbidden("No cafeteria is linked to this account"))
}

fn non_blank(field: &str, value: Option<String>) -> Result<Option<String>, ServiceError> {
    match value {
        Some(v) if v.trim().is_empty() => {
            Err(ServiceError::bad_request(format!("{field} cannot be empty")))
        }
        Some(v) => Ok(Some(v.trim().to_string())),
        None => Ok(None),
    }
}

pub async fn update_profile(
    pool: &SqlitePool,
    cafeteria: &Cafeteria,
    req: UpdateCafeteriaRequest,
) -> Result<Cafeteria, ServiceError> {
    let update = CafeteriaUpdate {
        name: non_blank("Name", req.name)?,
        description: req.description.map(|d| d.trim().to_string()),
        location: req.location.map(|l| l.trim().to_string()),
        opening_hours: req.opening_hours.map(|h| h.trim().to_string()),
        is_open: req.is_open,
    };
    let updated = CafeteriaRepository::new(pool.clone())
        .update_profile(cafeteria.id, &update)
        .await?;
    tracing::info!(cafeteria = %updated.public_id, is_open = updated.is_open, "cafeteria profile updated");
    Ok(updated)
}

/// Highest accepted menu price (100 000.00). Mirrored by the schema CHECK.
pub const MAX_PRICE_CENTS: i64 = 10_000_000;

fn check_price(price_cents: i64) -> Result<(), ServiceError> {
    if price_cents < 0 {
        return Err(ServiceError::bad_request("Price cannot be negative"));
    }
    if price_cents > MAX_PRICE_CENTS {
        return Err(ServiceError::bad_request(format!(
            "Price cannot exceed {MAX_PRICE_CENTS} cents"
        )));
    }
    Ok(())
}

pub async fn list_menu(pool: &SqlitePool, cafeteria: &Cafeteria) -> Result<Vec<MenuItem>, ServiceError> {
    let items = MenuRepository::new(pool.clone())
        .list_for_cafeteria(cafeteria.id, false)
        .await?;
    Ok(items)
}

pub async fn create_menu_item(
    pool: &SqlitePool,
    cafeteria: &Cafeteria,
    req: CreateMenuItemRequest,
) -> Result<MenuItem, ServiceError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ServiceError::bad_request("Name is required"));
    }
    check_price(req.price_cents)?;

    let item = MenuRepository::new(pool.clone())
        .create(
            cafeteria.id,
            &NewMenuItem {
                name,
                description: clean(req.description),
                category: clean(req.category).unwrap_or_else(|| DEFAULT_MENU_CATEGORY.to_string()),
                price_cents: req.price_cents,
                is_available: req.is_available.unwrap_or(true),
            },
        )
        .await?;
    Ok(item)
}

pub async fn update_menu_item(
    pool: &SqlitePool,
    cafeteria: &Cafeteria,
    item_id: i64,
    req: UpdateMenuItemRequest,
) -> Result<MenuItem, ServiceError> {
    if let Some(price) = req.price_cents {
        check_price(price)?;
    }
    let update = MenuItemUpdate {
        name: non_blank("Name", req.name)?,
        description: req.description.map(|d| d.trim().to_string()),
        category: non_blank("Category", req.category)?,
        price_cents: req.price_cents,
        is_available: req.is_available,
    };
    MenuRepository::new(pool.clone())
        .update(cafeteria.id, item_id, &update)
        .await?
        .ok_or_else(|| ServiceError::not_found("Menu item not found"))
}

pub async fn set_menu_availability(
    pool: &SqlitePool,
    cafeteria: &Cafeteria,
    item_id: i64,
    is_available: bool,
) -> Result<MenuItem, ServiceError> {
    MenuRepository::new(pool.clone())
        .set_availability(cafeteria.id, item_id, is_available)
        .await?
        .ok_or_else(|| ServiceError::not_found("Menu item not found"))
}

pub async fn delete_menu_item(
    pool: &SqlitePool,
    cafeteria: &Cafeteria,
    item_id: i64,
) -> Result<(), ServiceError> {
    let deleted = MenuRepository::new(pool.clone())
        .delete(cafeteria.id, item_id)
        .await?;
    if !deleted {
        return Err(ServiceError::not_found("Menu item not found"));
    }
    Ok(())
}

fn check_amount(field: &str, value: f64) -> Result<(), ServiceError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ServiceError::bad_request(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

pub async fn list_inventory(
    pool: &SqlitePool,
    cafeteria: &Cafeteria,
) -> Result<Vec<InventoryItem>, ServiceError> {
    let items = InventoryRepository::new(pool.clone())
        .list(cafeteria.id)
        .await?;
    Ok(items)
}

pub async fn create_inventory_item(
    pool: &SqlitePool,
    cafeteria: &Cafeteria,
    req: CreateInventoryItemRequest,
) -> Result<InventoryItem, ServiceError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ServiceError::bad_request("Name is required"));
    }
    check_amount("Quantity", req.quantity)?;
    let reorder_level = req.reorder_level.unwrap_or(0.0);
    check_amount("Reorder level", reorder_level)?;
    let cost_per_unit_cents = req.cost_per_unit_cents.unwrap_or(0);
    check_price(cost_per_unit_cents)?;

    let item = InventoryRepository::new(pool.clone())
        .create(
            cafeteria.id,
            &NewInventoryItem {
                name,
                category: clean(req.category).unwrap_or_else(|| DEFAULT_MENU_CATEGORY.to_string()),
                unit: clean(req.unit).unwrap_or_else(|| DEFAULT_INVENTORY_UNIT.to_string()),
                quantity: req.quantity,
                reorder_level,
                cost_per_unit_cents,
            },
        )
        .await?;
    Ok(item)
}

pub async fn update_inventory_item(
    pool: &SqlitePool,
    cafeteria: &Cafeteria,
    item_id: i64,
    req: UpdateInventoryItemRequest,
) -> Result<InventoryItem, ServiceError> {
    if let Some(quantity) = req.quantity {
        check_amount("Quantity", quantity)?;
    }
    if let Some(level) = req.reorder_level {
        check_amount("Reorder level", level)?;
    }
    if let Some(cost) = req.cost_per_unit_cents {
        check_price(cost)?;
    }
    let update = InventoryUpdate {
        name: non_blank("Name", req.name)?,
        category: non_blank("Category", req.category)?,
        unit: non_blank("Unit", req.unit)?,
        quantity: req.quantity,
        reorder_level: req.reorder_level,
        cost_per_unit_cents: req.cost_per_unit_cents,
    };
    InventoryRepository::new(pool.clone())
        .update(cafeteria.id, item_id, &update)
        .await?
        .ok_or_else(|| ServiceError::not_found("Inventory item not found"))
}

pub async fn adjust_inventory(
    pool: &SqlitePool,
    cafeteria: &Cafeteria,
    item_id: i64,
    delta: f64,
) -> Result<InventoryItem, ServiceError> {
    if !delta.is_finite() {
        return Err(ServiceError::bad_request("Adjustment must be a number"));
    }
    InventoryRepository::new(pool.clone())
        .adjust(cafeteria.id, item_id, delta)
        .await?
        .ok_or_else(|| ServiceError::not_found("Inventory item not found"))
}

pub async fn delete_inventory_item(
    pool: &SqlitePool,
    cafeteria: &Cafeteria,
    item_id: i64,
) -> Result<(), ServiceError> {
    let deleted = InventoryRepository::new(pool.clone())
        .delete(cafeteria.id, item_id)
        .await?;
    if !deleted {
        return Err(ServiceError::not_found("Inventory item not found"));
    }
    Ok(())
}

pub async fn low_stock(
    pool: &SqlitePool,
    cafeteria: &Cafeteria,
    limit: u32,
) -> Result<Vec<InventoryItem>, ServiceError> {
    let items = InventoryRepository::new(pool.clone())
        .low_stock(cafeteria.id, i64::from(limit))
        .await?;
    Ok(items)
}
