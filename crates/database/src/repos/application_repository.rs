//! Cafeteria application repository for database operations.

use sqlx::SqlitePool;

use crate::entities::{
    ApplicationStatus, Cafeteria, CafeteriaApplication, CafeteriaStatus, NewApplication, Role,
};
use crate::ids::{new_public_id, now_timestamp};
use crate::types::{DatabaseError, DatabaseResult};

const APPLICATION_COLUMNS: &str = "SELECT id, public_id, business_name, contact_name, contact_email, contact_phone, location, description, status, review_notes, reviewed_by, reviewed_at, cafeteria_id, created_at FROM cafeteria_applications";

/// Repository for vendor onboarding applications
#[derive(Clone)]
pub struct ApplicationRepository {
    pool: SqlitePool,
}

impl ApplicationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, application: &NewApplication) -> DatabaseResult<CafeteriaApplication> {
        let public_id = new_public_id();
        sqlx::query(
            "INSERT INTO cafeteria_applications (public_id, business_name, contact_name, contact_email, contact_phone, location, description, status, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?)",
        )
        .bind(&public_id)
        .bind(&application.business_name)
        .bind(&application.contact_name)
        .bind(&application.contact_email)
        .bind(&application.contact_phone)
        .bind(&application.location)
        .bind(&application.description)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        self.find_by_public_id(&public_id)
            .await?
            .ok_or_else(|| DatabaseError::InternalError("created application not found".into()))
    }

    pub async fn find_by_public_id(
        &self,
        public_id: &str,
    ) -> DatabaseResult<Option<CafeteriaApplication>> {
        let application = sqlx::query_as::<_, CafeteriaApplication>(&format!(
            "{APPLICATION_COLUMNS} WHERE public_id = ?"
        ))
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(application)
    }

    /// Applications newest first, optionally filtered by status
    pub async fn list(
        &self,
        status: Option<ApplicationStatus>,
    ) -> DatabaseResult<Vec<CafeteriaApplication>> {
        let applications = sqlx::query_as::<_, CafeteriaApplication>(&format!(
            "{APPLICATION_COLUMNS} WHERE (?1 IS NULL OR status = ?1) ORDER BY created_at DESC, id DESC"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(applications)
    }

    pub async fn count_pending(&self) -> DatabaseResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM cafeteria_applications WHERE status = 'pending'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Approve a pending application in one transaction: create an active cafeteria
    /// for `owner_id`, promote a student owner to `cafeteria_manager` and record the
    /// review. Fails with `ValidationError` if the application was already reviewed
    /// and with `Duplicate` if the owner already runs a cafeteria.
    pub async fn approve(
        &self,
        application_id: i64,
        reviewer_id: i64,
        owner_id: i64,
        notes: Option<&str>,
    ) -> DatabaseResult<(CafeteriaApplication, Cafeteria)> {
        let now = now_timestamp();
        let mut tx = self.pool.begin().await?;

        let application = sqlx::query_as::<_, CafeteriaApplication>(&format!(
            "{APPLICATION_COLUMNS} WHERE id = ?"
        ))
        .bind(application_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DatabaseError::not_found("application"))?;

        if application.status != ApplicationStatus::Pending {
            return Err(DatabaseError::validation("application has already been reviewed"));
        }

        let owned: Option<(i64,)> = sqlx::query_as("SELECT id FROM cafeterias WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await?;
        if owned.is_some() {
            return Err(DatabaseError::Duplicate("profile already owns a cafeteria".into()));
        }

        let cafeteria_public_id = new_public_id();
        let cafeteria = sqlx::query(
            "INSERT INTO cafeterias (public_id, owner_id, name, description, location, status, is_open, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(&cafeteria_public_id)
        .bind(owner_id)
        .bind(&application.business_name)
        .bind(&application.description)
        .bind(&application.location)
        .bind(CafeteriaStatus::Active)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
        let cafeteria_id = cafeteria.last_insert_rowid();

        sqlx::query("UPDATE profiles SET role = ?, updated_at = ? WHERE id = ? AND role = ?")
            .bind(Role::CafeteriaManager)
            .bind(&now)
            .bind(owner_id)
            .bind(Role::Student)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE cafeteria_applications SET status = 'approved', review_notes = ?, reviewed_by = ?, reviewed_at = ?, cafeteria_id = ? WHERE id = ?",
        )
        .bind(notes)
        .bind(reviewer_id)
        .bind(&now)
        .bind(cafeteria_id)
        .bind(application_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let application = self
            .find_by_public_id(&application.public_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("application"))?;
        let cafeteria = sqlx::query_as::<_, Cafeteria>(
            "SELECT id, public_id, owner_id, name, description, location, opening_hours, status, is_open, created_at, updated_at FROM cafeterias WHERE id = ?",
        )
        .bind(cafeteria_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((application, cafeteria))
    }

    /// Reject a pending application with optional reviewer notes
    pub async fn reject(
        &self,
        application_id: i64,
        reviewer_id: i64,
        notes: Option<&str>,
    ) -> DatabaseResult<CafeteriaApplication> {
        let result = sqlx::query(
            "UPDATE cafeteria_applications SET status = 'rejected', review_notes = ?, reviewed_by = ?, reviewed_at = ? WHERE id = ? AND status = 'pending'",
        )
        .bind(notes)
        .bind(reviewer_id)
        .bind(now_timestamp())
        .bind(application_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::validation("application has already been reviewed"));
        }

        sqlx::query_as::<_, CafeteriaApplication>(&format!("{APPLICATION_COLUMNS} WHERE id = ?"))
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("application"))
    }
}
