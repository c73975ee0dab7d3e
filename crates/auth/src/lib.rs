use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use rand::RngCore;
use regex::Regex;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};
use unieats_config::AuthConfig;
use unieats_database::ids::{format_timestamp, new_public_id};
use unieats_database::{DatabaseError, NewProfile, Profile, ProfileRepository, Role};

const PASSWORD_PROVIDER: &str = "password";
const MAX_SESSION_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Verified against when an email has no identity, so an unknown account costs
/// the same argon2 work as a wrong password.
static UNKNOWN_ACCOUNT_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_secret("unieats-unknown-account").ok());

#[derive(Clone)]
pub struct Authenticator {
    pool: SqlitePool,
    profiles: ProfileRepository,
    session_ttl: Duration,
    min_password_length: usize,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user already exists")]
    UserExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account does not have the requested role")]
    RoleMismatch,
    #[error("account is suspended")]
    AccountSuspended,
    #[error("{0}")]
    Validation(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("repository error: {0}")]
    Repository(#[from] DatabaseError),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("session not found")]
    SessionNotFound,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid session token")]
    InvalidSession,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: AuthConfig) -> Self {
        let ttl_seconds = i64::try_from(config.session_ttl_seconds)
            .unwrap_or(i64::MAX)
            .min(MAX_SESSION_TTL_SECONDS);
        let session_ttl = Duration::seconds(ttl_seconds);

        Self {
            profiles: ProfileRepository::new(pool.clone()),
            pool,
            session_ttl,
            min_password_length: config.min_password_length,
        }
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// Create a profile with a password identity. Both rows are written in one
    /// transaction so a failed registration leaves nothing behind.
    pub async fn register(&self, profile: &NewProfile, password: &str) -> Result<Profile, AuthError> {
        let email = normalize_email(&profile.email);
        let full_name = profile.full_name.trim();

        if !EMAIL_RE.is_match(&email) {
            return Err(AuthError::Validation("a valid email address is required".into()));
        }
        if full_name.is_empty() {
            return Err(AuthError::Validation("full name is required".into()));
        }
        self.validate_password(password)?;

        let existing = sqlx::query("SELECT id FROM profiles WHERE lower(email) = ?")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;

        if existing.is_some() {
            return Err(AuthError::UserExists);
        }

        let now = format_timestamp(Utc::now());
        let password_hash = hash_secret(password)?;

        // A concurrent registration can still win between the check above and
        // these inserts; the UNIQUE constraints decide.
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO profiles (public_id, email, full_name, phone, role, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 'active', ?, ?)",
        )
        .bind(new_public_id())
        .bind(&email)
        .bind(full_name)
        .bind(profile.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()))
        .bind(profile.role)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(registration_error)?;
        let user_id = inserted.last_insert_rowid();

        sqlx::query(
            "INSERT INTO user_identities (user_id, provider, provider_uid, secret, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(PASSWORD_PROVIDER)
        .bind(&email)
        .bind(password_hash)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(registration_error)?;

        tx.commit().await?;

        let profile = self.fetch_profile(user_id).await?;
        info!(profile = %profile.public_id, role = %profile.role, "registered profile");
        Ok(profile)
    }

    /// Sign in through a surface that only admits `expected_role`.
    ///
    /// The password is verified before role and status so that neither leaks to
    /// someone guessing credentials.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        expected_role: Role,
    ) -> Result<(Profile, AuthSession), AuthError> {
        let identity = sqlx::query(
            "SELECT user_id, secret FROM user_identities WHERE provider = ? AND provider_uid = ?",
        )
        .bind(PASSWORD_PROVIDER)
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = identity else {
            if let Some(hash) = UNKNOWN_ACCOUNT_HASH.as_deref() {
                let _ = verify_password(password, hash);
            }
            return Err(AuthError::InvalidCredentials);
        };

        let user_id: i64 = row.try_get("user_id")?;
        let secret: String = row.try_get("secret")?;
        verify_password(password, &secret)?;

        let profile = self.fetch_profile(user_id).await?;
        if profile.role != expected_role {
            debug!(profile = %profile.public_id, expected = %expected_role, "role mismatch on sign-in");
            return Err(AuthError::RoleMismatch);
        }
        if profile.is_suspended() {
            return Err(AuthError::AccountSuspended);
        }

        let session = self.issue_session(user_id).await?;

        sqlx::query("UPDATE profiles SET last_sign_in_at = ? WHERE id = ?")
            .bind(format_timestamp(Utc::now()))
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let profile = self.fetch_profile(user_id).await?;
        Ok((profile, session))
    }

    pub async fn authenticate_token(&self, token: &str) -> Result<(Profile, AuthSession), AuthError> {
        let row = sqlx::query("SELECT user_id, expires_at FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(AuthError::SessionNotFound);
        };

        let user_id: i64 = row.try_get("user_id")?;
        let expires_at: String = row.try_get("expires_at")?;

        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .map_err(|_| AuthError::InvalidSession)?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            sqlx::query("DELETE FROM sessions WHERE token = ?")
                .bind(token)
                .execute(&self.pool)
                .await?;
            return Err(AuthError::SessionExpired);
        }

        let profile = self.fetch_profile(user_id).await?;
        if profile.is_suspended() {
            return Err(AuthError::AccountSuspended);
        }

        let session = AuthSession {
            token: token.to_owned(),
            user_id,
            expires_at,
        };

        Ok((profile, session))
    }

    /// Remove a session. Returns false when the token was unknown.
    pub async fn sign_out(&self, token: &str) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop every session of a profile, e.g. after it was suspended.
    pub async fn revoke_sessions_for(&self, user_id: i64) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            info!(user_id, revoked = result.rows_affected(), "revoked sessions");
        }
        Ok(result.rows_affected())
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let secret = sqlx::query_scalar::<_, Option<String>>(
            "SELECT secret FROM user_identities WHERE user_id = ? AND provider = ?",
        )
        .bind(user_id)
        .bind(PASSWORD_PROVIDER)
        .fetch_optional(&self.pool)
        .await?
        .flatten();

        let Some(secret) = secret else {
            return Err(AuthError::InvalidCredentials);
        };
        verify_password(current_password, &secret)?;
        self.validate_password(new_password)?;

        let password_hash = hash_secret(new_password)?;
        sqlx::query(
            "UPDATE user_identities SET secret = ?, updated_at = ? WHERE user_id = ? AND provider = ?",
        )
        .bind(password_hash)
        .bind(format_timestamp(Utc::now()))
        .bind(user_id)
        .bind(PASSWORD_PROVIDER)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_profile(&self, id: i64) -> Result<Profile, AuthError> {
        self.profiles
            .find_by_id(id)
            .await?
            .ok_or(AuthError::InvalidSession)
    }

    async fn issue_session(&self, user_id: i64) -> Result<AuthSession, AuthError> {
        let token = self.generate_session_token();
        let now = Utc::now();
        let expires_at = now + self.session_ttl;

        sqlx::query(
            "INSERT INTO sessions (user_id, token, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&token)
        .bind(format_timestamp(now))
        .bind(format_timestamp(expires_at))
        .execute(&self.pool)
        .await?;

        Ok(AuthSession {
            token,
            user_id,
            expires_at,
        })
    }

    fn validate_password(&self, password: &str) -> Result<(), AuthError> {
        if password.chars().count() < self.min_password_length {
            return Err(AuthError::Validation(format!(
                "password must be at least {} characters",
                self.min_password_length
            )));
        }
        Ok(())
    }

    fn generate_session_token(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

fn hash_secret(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn registration_error(err: sqlx::Error) -> AuthError {
    if err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
    {
        AuthError::UserExists
    } else {
        AuthError::Database(err)
    }
}

fn verify_password(password: &str, secret: &str) -> Result<(), AuthError> {
    let stored_hash = PasswordHash::new(secret)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &stored_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ana@Campus.EDU "), "ana@campus.edu");
    }

    #[test]
    fn email_pattern_rejects_obvious_garbage() {
        assert!(EMAIL_RE.is_match("ana@campus.edu"));
        assert!(!EMAIL_RE.is_match("ana@campus"));
        assert!(!EMAIL_RE.is_match("ana campus@edu.org"));
        assert!(!EMAIL_RE.is_match("@campus.edu"));
    }
}
