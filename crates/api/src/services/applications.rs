use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;
use unieats_auth::normalize_email;
use unieats_database::{
    ApplicationRepository, ApplicationStatus, Cafeteria, CafeteriaApplication, DatabaseError,
    NewApplication, NewNotification, Page, Profile, ProfileFilter, ProfileRepository,
    ProfileStatus, Role,
};
use utoipa::ToSchema;

use super::{audit, error::ServiceError, notifications};
use crate::routes::models::SubmitApplicationRequest;
use crate::util::clean;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApprovedApplication {
    pub application: CafeteriaApplication,
    pub cafeteria: Cafeteria,
}

fn required(field: &str, value: &str) -> Result<String, ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::bad_request(format!("{field} is required")));
    }
    Ok(value.to_string())
}

pub async fn submit(
    pool: &SqlitePool,
    req: SubmitApplicationRequest,
) -> Result<CafeteriaApplication, ServiceError> {
    let contact_email = normalize_email(&req.contact_email);
    let valid_email = contact_email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid_email {
        return Err(ServiceError::bad_request("A valid contact email is required"));
    }

    let application = ApplicationRepository::new(pool.clone())
        .create(&NewApplication {
            business_name: required("Business name", &req.business_name)?,
            contact_name: required("Contact name", &req.contact_name)?,
            contact_email,
            contact_phone: clean(req.contact_phone),
            location: clean(req.location),
            description: clean(req.description),
        })
        .await?;

    tracing::info!(application = %application.public_id, "cafeteria application submitted");

    let admins = ProfileRepository::new(pool.clone())
        .list(
            &ProfileFilter {
                role: Some(Role::Admin),
                status: Some(ProfileStatus::Active),
                search: None,
            },
            Page::new(Some(Page::MAX_LIMIT), None),
        )
        .await?;
    for admin in admins {
        notifications::notify(
            pool,
            NewNotification::new(
                admin.id,
                "application_submitted",
                "New cafeteria application",
                format!("{} applied to join UniEats", application.business_name),
            )
            .related("cafeteria_application", application.public_id.clone()),
        )
        .await;
    }

    Ok(application)
}

pub async fn list(
    pool: &SqlitePool,
    status: Option<ApplicationStatus>,
) -> Result<Vec<CafeteriaApplication>, ServiceError> {
    let applications = ApplicationRepository::new(pool.clone()).list(status).await?;
    Ok(applications)
}

async fn pending_application(
    repo: &ApplicationRepository,
    public_id: &str,
) -> Result<CafeteriaApplication, ServiceError> {
    let application = repo
        .find_by_public_id(public_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Application not found"))?;
    if application.status != ApplicationStatus::Pending {
        return Err(ServiceError::bad_request("Only pending applications can be reviewed"));
    }
    Ok(application)
}

/// Approve an application: the profile registered under the contact email
/// becomes the owner of a new active cafeteria.
pub async fn approve(
    pool: &SqlitePool,
    admin: &Profile,
    public_id: &str,
    notes: Option<String>,
) -> Result<ApprovedApplication, ServiceError> {
    let repo = ApplicationRepository::new(pool.clone());
    let application = pending_application(&repo, public_id).await?;

    let owner = ProfileRepository::new(pool.clone())
        .find_by_email(&application.contact_email)
        .await?
        .ok_or_else(|| {
            ServiceError::bad_request(format!(
                "No account is registered with {}; the applicant must sign up first",
                application.contact_email
            ))
        })?;
    if owner.role == Role::Admin {
        return Err(ServiceError::bad_request("Admin accounts cannot own a cafeteria"));
    }
    if owner.is_suspended() {
        return Err(ServiceError::bad_request("The applicant's account is suspended"));
    }

    let notes = clean(notes);
    let (application, cafeteria) = repo
        .approve(application.id, admin.id, owner.id, notes.as_deref())
        .await
        .map_err(|err| match err {
            DatabaseError::Duplicate(_) => {
                ServiceError::conflict("The applicant already runs a cafeteria")
            }
            other => ServiceError::from(other),
        })?;

    tracing::info!(
        application = %application.public_id,
        cafeteria = %cafeteria.public_id,
        owner = %owner.public_id,
        "cafeteria application approved"
    );

    audit::record(
        pool,
        admin,
        "application.approved",
        "cafeteria_application",
        &application.public_id,
        json!({
            "business_name": application.business_name,
            "cafeteria_id": cafeteria.public_id,
            "owner_id": owner.public_id,
            "notes": notes,
        }),
    )
    .await;

    notifications::notify(
        pool,
        NewNotification::new(
            owner.id,
            "application_approved",
            "Application approved",
            format!("{} is now live on UniEats", cafeteria.name),
        )
        .related("cafeteria", cafeteria.public_id.clone()),
    )
    .await;

    Ok(ApprovedApplication {
        application,
        cafeteria,
    })
}

pub async fn reject(
    pool: &SqlitePool,
    admin: &Profile,
    public_id: &str,
    notes: Option<String>,
) -> Result<CafeteriaApplication, ServiceError> {
    let repo = ApplicationRepository::new(pool.clone());
    let application = pending_application(&repo, public_id).await?;

    let notes = clean(notes);
    let application = repo
        .reject(application.id, admin.id, notes.as_deref())
        .await?;

    audit::record(
        pool,
        admin,
        "application.rejected",
        "cafeteria_application",
        &application.public_id,
        json!({ "business_name": application.business_name, "notes": notes }),
    )
    .await;

    if let Some(applicant) = ProfileRepository::new(pool.clone())
        .find_by_email(&application.contact_email)
        .await?
    {
        notifications::notify(
            pool,
            NewNotification::new(
                applicant.id,
                "application_rejected",
                "Application not approved",
                format!("The application for {} was not approved", application.business_name),
            )
            .related("cafeteria_application", application.public_id.clone()),
        )
        .await;
    }

    Ok(application)
}
