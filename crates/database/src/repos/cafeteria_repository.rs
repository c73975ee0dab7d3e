//! Cafeteria repository for database operations.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::entities::{Cafeteria, CafeteriaStatus, CafeteriaUpdate, NewCafeteria};
use crate::ids::{new_public_id, now_timestamp};
use crate::types::{DatabaseError, DatabaseResult};

const CAFETERIA_COLUMNS: &str = "SELECT id, public_id, owner_id, name, description, location, opening_hours, status, is_open, created_at, updated_at FROM cafeterias";

/// Repository for cafeteria database operations
#[derive(Clone)]
pub struct CafeteriaRepository {
    pool: SqlitePool,
}

impl CafeteriaRepository {
    /// Create a new cafeteria repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a cafeteria for an owner. Each owner can hold at most one cafeteria.
    pub async fn create(&self, request: &NewCafeteria) -> DatabaseResult<Cafeteria> {
        let now = now_timestamp();
        let public_id = new_public_id();

        sqlx::query(
            "INSERT INTO cafeterias (public_id, owner_id, name, description, location, opening_hours, status, is_open, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(&public_id)
        .bind(request.owner_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.location)
        .bind(&request.opening_hours)
        .bind(request.status)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_by_public_id(&public_id)
            .await?
            .ok_or_else(|| DatabaseError::InternalError("created cafeteria not found".into()))
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Cafeteria>> {
        let cafeteria =
            sqlx::query_as::<_, Cafeteria>(&format!("{CAFETERIA_COLUMNS} WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(cafeteria)
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<Cafeteria>> {
        let cafeteria =
            sqlx::query_as::<_, Cafeteria>(&format!("{CAFETERIA_COLUMNS} WHERE public_id = ?"))
                .bind(public_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(cafeteria)
    }

    /// Find the cafeteria owned by a profile
    pub async fn find_by_owner(&self, owner_id: i64) -> DatabaseResult<Option<Cafeteria>> {
        let cafeteria =
            sqlx::query_as::<_, Cafeteria>(&format!("{CAFETERIA_COLUMNS} WHERE owner_id = ?"))
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(cafeteria)
    }

    /// List cafeterias ordered by name
    pub async fn list(
        &self,
        status: Option<CafeteriaStatus>,
        search: Option<&str>,
    ) -> DatabaseResult<Vec<Cafeteria>> {
        let mut builder = QueryBuilder::<Sqlite>::new(CAFETERIA_COLUMNS);
        builder.push(" WHERE 1 = 1");

        if let Some(status) = status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            builder
                .push(" AND (lower(name) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR lower(COALESCE(location, '')) LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        builder.push(" ORDER BY name ASC, id ASC");

        let cafeterias = builder
            .build_query_as::<Cafeteria>()
            .fetch_all(&self.pool)
            .await?;
        Ok(cafeterias)
    }

    /// Apply a partial update; absent fields keep their stored value
    pub async fn update_profile(
        &self,
        id: i64,
        update: &CafeteriaUpdate,
    ) -> DatabaseResult<Cafeteria> {
        let result = sqlx::query(
            "UPDATE cafeterias SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                location = COALESCE(?, location),
                opening_hours = COALESCE(?, opening_hours),
                is_open = COALESCE(?, is_open),
                updated_at = ?
             WHERE id = ?",
        )
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.location)
        .bind(&update.opening_hours)
        .bind(update.is_open)
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("cafeteria"));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("cafeteria"))
    }

    pub async fn set_status(&self, id: i64, status: CafeteriaStatus) -> DatabaseResult<Cafeteria> {
        let result = sqlx::query("UPDATE cafeterias SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(now_timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("cafeteria"));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("cafeteria"))
    }
}
