//! Profile repository for database operations.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::entities::{Profile, ProfileFilter, ProfileStatus, Role};
use crate::ids::now_timestamp;
use crate::types::{DatabaseError, DatabaseResult, Page};

pub(crate) const PROFILE_COLUMNS: &str = "SELECT id, public_id, email, full_name, phone, role, status, created_at, updated_at, last_sign_in_at FROM profiles";

/// Repository for profile database operations
#[derive(Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    /// Create a new profile repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find profile by row id
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!("{PROFILE_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    /// Find profile by public id
    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<Profile>> {
        let profile =
            sqlx::query_as::<_, Profile>(&format!("{PROFILE_COLUMNS} WHERE public_id = ?"))
                .bind(public_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(profile)
    }

    /// Find profile by email, ignoring case
    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "{PROFILE_COLUMNS} WHERE lower(email) = lower(?)"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    /// List profiles matching the filter, newest first
    pub async fn list(&self, filter: &ProfileFilter, page: Page) -> DatabaseResult<Vec<Profile>> {
        let mut builder = QueryBuilder::<Sqlite>::new(PROFILE_COLUMNS);
        builder.push(" WHERE 1 = 1");

        if let Some(role) = filter.role {
            builder.push(" AND role = ").push_bind(role);
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            builder
                .push(" AND (lower(full_name) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR lower(email) LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let profiles = builder
            .build_query_as::<Profile>()
            .fetch_all(&self.pool)
            .await?;
        Ok(profiles)
    }

    /// Change a profile's status and return the updated row
    pub async fn set_status(&self, id: i64, status: ProfileStatus) -> DatabaseResult<Profile> {
        let result = sqlx::query("UPDATE profiles SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(now_timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("profile"));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("profile"))
    }

    /// Number of profiles per role. Roles without profiles are reported as zero.
    pub async fn count_by_role(&self) -> DatabaseResult<Vec<(Role, i64)>> {
        let rows: Vec<(Role, i64)> =
            sqlx::query_as("SELECT role, COUNT(*) FROM profiles GROUP BY role")
                .fetch_all(&self.pool)
                .await?;

        Ok(Role::ALL
            .into_iter()
            .map(|role| {
                let count = rows
                    .iter()
                    .find(|(r, _)| *r == role)
                    .map(|(_, count)| *count)
                    .unwrap_or(0);
                (role, count)
            })
            .collect())
    }
}
