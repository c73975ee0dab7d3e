//! Admin back-office: user and cafeteria moderation, platform-wide order listing.

use serde_json::json;
use sqlx::SqlitePool;
use unieats_auth::Authenticator;
use unieats_database::{
    Cafeteria, CafeteriaRepository, CafeteriaStatus, NewNotification, Order, OrderFilter,
    OrderRepository, Page, Profile, ProfileFilter, ProfileRepository, ProfileStatus,
};

use super::{audit, error::ServiceError, notifications};
use crate::routes::models::{AdminOrdersQuery, UsersQuery};
use crate::util::clean;

pub async fn list_users(pool: &SqlitePool, query: UsersQuery) -> Result<Vec<Profile>, ServiceError> {
    let filter = ProfileFilter {
        role: query.role,
        status: query.status,
        search: clean(query.search),
    };
    let users = ProfileRepository::new(pool.clone())
        .list(&filter, Page::new(query.limit, query.offset))
        .await?;
    Ok(users)
}

/// Suspend or reactivate a profile. Suspension also ends every open session.
pub async fn update_user_status(
    pool: &SqlitePool,
    authenticator: &Authenticator,
    admin: &Profile,
    public_id: &str,
    status: ProfileStatus,
) -> Result<Profile, ServiceError> {
    let profiles = ProfileRepository::new(pool.clone());
    let target = profiles
        .find_by_public_id(public_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User not found"))?;

    if target.id == admin.id && status == ProfileStatus::Suspended {
        return Err(ServiceError::bad_request("You cannot suspend your own account"));
    }

    let updated = profiles.set_status(target.id, status).await?;
    let revoked = if status == ProfileStatus::Suspended {
        authenticator.revoke_sessions_for(updated.id).await?
    } else {
        0
    };

    tracing::info!(profile = %updated.public_id, status = %status.as_str(), revoked, "profile status changed");

    let action = match status {
        ProfileStatus::Suspended => "user.suspended",
        ProfileStatus::Active => "user.reactivated",
    };
    audit::record(
        pool,
        admin,
        action,
        "profile",
        &updated.public_id,
        json!({
            "email": updated.email,
            "from_status": target.status,
            "status": updated.status,
            "sessions_revoked": revoked,
        }),
    )
    .await;

    Ok(updated)
}

pub async fn list_cafeterias(
    pool: &SqlitePool,
    status: Option<CafeteriaStatus>,
) -> Result<Vec<Cafeteria>, ServiceError> {
    let cafeterias = CafeteriaRepository::new(pool.clone())
        .list(status, None)
        .await?;
    Ok(cafeterias)
}

pub async fn update_cafeteria_status(
    pool: &SqlitePool,
    admin: &Profile,
    public_id: &str,
    status: CafeteriaStatus,
) -> Result<Cafeteria, ServiceError> {
    let repo = CafeteriaRepository::new(pool.clone());
    let cafeteria = repo
        .find_by_public_id(public_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Cafeteria not found"))?;

    let updated = repo.set_status(cafeteria.id, status).await?;

    audit::record(
        pool,
        admin,
        "cafeteria.status_changed",
        "cafeteria",
        &updated.public_id,
        json!({
            "name": updated.name,
            "from_status": cafeteria.status,
            "status": updated.status,
        }),
    )
    .await;

    if cafeteria.status != updated.status {
        notifications::notify(
            pool,
            NewNotification::new(
                updated.owner_id,
                "cafeteria_status",
                "Cafeteria status changed",
                format!("{} is now {}", updated.name, updated.status.as_str()),
            )
            .related("cafeteria", updated.public_id.clone()),
        )
        .await;
    }

    Ok(updated)
}

pub async fn list_orders(pool: &SqlitePool, query: AdminOrdersQuery) -> Result<Vec<Order>, ServiceError> {
    let cafeteria_id = match clean(query.cafeteria_id) {
        Some(public_id) => Some(
            CafeteriaRepository::new(pool.clone())
                .find_by_public_id(&public_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Cafeteria not found"))?
                .id,
        ),
        None => None,
    };

    let filter = OrderFilter {
        student_id: None,
        cafeteria_id,
        status: query.status,
    };
    let orders = OrderRepository::new(pool.clone())
        .list(&filter, Page::new(query.limit, query.offset))
        .await?;
    Ok(orders)
}
