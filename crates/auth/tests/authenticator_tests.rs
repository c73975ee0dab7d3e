use std::collections::HashSet;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row, SqlitePool,
};
use std::str::FromStr;
use std::time::Instant;
use tempfile::TempDir;
use unieats_auth::{AuthError, Authenticator};
use unieats_config::AuthConfig;
use unieats_database::{NewProfile, Profile, ProfileStatus, Role, MIGRATOR};

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

const PASSWORD: &str = "s3cret-pass";

fn default_auth_config() -> AuthConfig {
    AuthConfig {
        session_ttl_seconds: 3_600,
        min_password_length: 8,
    }
}

fn new_profile(email: &str, role: Role) -> NewProfile {
    NewProfile {
        email: email.to_string(),
        full_name: "Alice Example".to_string(),
        phone: None,
        role,
    }
}

struct TestContext {
    pool: SqlitePool,
    authenticator: Authenticator,
    _temp_dir: TempDir,
    config: AuthConfig,
}

impl TestContext {
    async fn new(config: AuthConfig) -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("auth.sqlite");
        let db_url = format!("sqlite://{}", db_path.display());

        let mut options = SqliteConnectOptions::from_str(&db_url)?;
        options = options.create_if_missing(true);
        options = options.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        MIGRATOR.run(&pool).await?;

        let authenticator = Authenticator::new(pool.clone(), config.clone());

        Ok(Self {
            pool,
            authenticator,
            _temp_dir: temp_dir,
            config,
        })
    }

    async fn new_default() -> TestResult<Self> {
        Self::new(default_auth_config()).await
    }

    fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    async fn register(&self, email: &str, role: Role) -> TestResult<Profile> {
        Ok(self
            .authenticator()
            .register(&new_profile(email, role), PASSWORD)
            .await?)
    }

    async fn suspend(&self, profile_id: i64) -> TestResult {
        sqlx::query("UPDATE profiles SET status = 'suspended' WHERE id = ?")
            .bind(profile_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}

#[tokio::test]
async fn register_persists_profile_and_password_identity() -> TestResult {
    let ctx = TestContext::new_default().await?;

    let profile = ctx.register("  Alice@Example.com ", Role::Student).await?;
    assert_eq!(profile.email, "alice@example.com");
    assert_eq!(profile.role, Role::Student);
    assert_eq!(profile.status, ProfileStatus::Active);

    let identity =
        sqlx::query("SELECT provider, provider_uid, secret FROM user_identities WHERE user_id = ?")
            .bind(profile.id)
            .fetch_one(ctx.pool())
            .await?;

    let provider: String = identity.get("provider");
    let provider_uid: String = identity.get("provider_uid");
    let secret: String = identity.get("secret");

    assert_eq!(provider, "password");
    assert_eq!(provider_uid, "alice@example.com");
    assert!(secret.starts_with("$argon2"), "secret must be an argon2 hash");

    Ok(())
}

#[tokio::test]
async fn register_rejects_duplicate_email_case_insensitively() -> TestResult {
    let ctx = TestContext::new_default().await?;
    ctx.register("alice@example.com", Role::Student).await?;

    let err = ctx
        .authenticator()
        .register(&new_profile("ALICE@example.com", Role::Student), PASSWORD)
        .await
        .expect_err("expected duplicate email to fail");
    assert!(matches!(err, AuthError::UserExists));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
        .fetch_one(ctx.pool())
        .await?;
    assert_eq!(count, 1, "no additional profiles should be created");

    Ok(())
}

#[tokio::test]
async fn register_maps_unique_conflicts_to_user_exists() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let other = ctx.register("bob@example.com", Role::Student).await?;

    // An identity for carol that slips past the profile lookup, as a
    // concurrent registration would.
    sqlx::query(
        "INSERT INTO user_identities (user_id, provider, provider_uid, secret, created_at, updated_at) VALUES (?, 'password', 'carol@example.com', NULL, '2024-09-01T00:00:00Z', '2024-09-01T00:00:00Z')",
    )
    .bind(other.id)
    .execute(ctx.pool())
    .await?;

    let err = ctx
        .authenticator()
        .register(&new_profile("carol@example.com", Role::Student), PASSWORD)
        .await
        .expect_err("expected the identity conflict to fail");
    assert!(matches!(err, AuthError::UserExists), "got {err:?}");

    let carol: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE email = 'carol@example.com'")
            .fetch_one(ctx.pool())
            .await?;
    assert_eq!(carol, 0, "the failed registration must roll back its profile");

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_yield_one_profile() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let profile = new_profile("dana@example.com", Role::Student);

    let (a, b, c) = tokio::join!(
        ctx.authenticator().register(&profile, PASSWORD),
        ctx.authenticator().register(&profile, PASSWORD),
        ctx.authenticator().register(&profile, PASSWORD),
    );

    let results = [a, b, c];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(err, AuthError::UserExists), "got {err:?}");
    }

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
        .fetch_one(ctx.pool())
        .await?;
    assert_eq!(count, 1);

    Ok(())
}

#[tokio::test]
async fn register_validates_input() -> TestResult {
    let ctx = TestContext::new_default().await?;

    let short = ctx
        .authenticator()
        .register(&new_profile("alice@example.com", Role::Student), "short")
        .await
        .expect_err("short password should fail");
    assert!(matches!(short, AuthError::Validation(_)));

    let bad_email = ctx
        .authenticator()
        .register(&new_profile("not-an-email", Role::Student), PASSWORD)
        .await
        .expect_err("invalid email should fail");
    assert!(matches!(bad_email, AuthError::Validation(_)));

    let mut nameless = new_profile("alice@example.com", Role::Student);
    nameless.full_name = "   ".into();
    let err = ctx
        .authenticator()
        .register(&nameless, PASSWORD)
        .await
        .expect_err("blank name should fail");
    assert!(matches!(err, AuthError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn sign_in_returns_session_for_matching_role() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let profile = ctx.register("alice@example.com", Role::Student).await?;

    let (signed_in, session) = ctx
        .authenticator()
        .sign_in("alice@example.com", PASSWORD, Role::Student)
        .await?;
    assert_eq!(signed_in.id, profile.id);
    assert!(signed_in.last_sign_in_at.is_some());

    let ttl = Duration::seconds(ctx.config.session_ttl_seconds as i64);
    let remaining = session.expires_at - Utc::now();
    assert!(
        (remaining - ttl).num_seconds().abs() <= 2,
        "session ttl should respect configuration"
    );

    let stored_expires: String =
        sqlx::query_scalar("SELECT expires_at FROM sessions WHERE token = ?")
            .bind(&session.token)
            .fetch_one(ctx.pool())
            .await?;
    let parsed = DateTime::parse_from_rfc3339(&stored_expires)?.with_timezone(&Utc);
    assert_eq!(parsed.timestamp(), session.expires_at.timestamp());

    Ok(())
}

#[tokio::test]
async fn sign_in_rejects_incorrect_secret_and_unknown_email() -> TestResult {
    let ctx = TestContext::new_default().await?;
    ctx.register("alice@example.com", Role::Student).await?;

    let err = ctx
        .authenticator()
        .sign_in("alice@example.com", "bad-secret", Role::Student)
        .await
        .expect_err("expected invalid password");
    assert!(matches!(err, AuthError::InvalidCredentials));

    let err = ctx
        .authenticator()
        .sign_in("unknown@example.com", PASSWORD, Role::Student)
        .await
        .expect_err("expected unknown email to fail");
    assert!(matches!(err, AuthError::InvalidCredentials));

    let session_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(ctx.pool())
        .await?;
    assert_eq!(session_count, 0, "no sessions should be issued on failure");

    Ok(())
}

#[tokio::test]
async fn unknown_email_costs_a_password_verification() -> TestResult {
    let ctx = TestContext::new_default().await?;
    ctx.register("alice@example.com", Role::Student).await?;

    let started = Instant::now();
    let err = ctx
        .authenticator()
        .sign_in("alice@example.com", "bad-secret", Role::Student)
        .await
        .expect_err("expected invalid password");
    let wrong_password = started.elapsed();
    assert!(matches!(err, AuthError::InvalidCredentials));

    let started = Instant::now();
    let err = ctx
        .authenticator()
        .sign_in("nobody@example.com", "bad-secret", Role::Student)
        .await
        .expect_err("expected unknown email to fail");
    let unknown_email = started.elapsed();
    assert!(matches!(err, AuthError::InvalidCredentials));

    assert!(
        unknown_email * 4 >= wrong_password,
        "unknown email took {unknown_email:?}, wrong password took {wrong_password:?}"
    );

    Ok(())
}

#[tokio::test]
async fn sign_in_is_scoped_to_the_expected_role() -> TestResult {
    let ctx = TestContext::new_default().await?;
    ctx.register("alice@example.com", Role::Student).await?;

    let err = ctx
        .authenticator()
        .sign_in("alice@example.com", PASSWORD, Role::Admin)
        .await
        .expect_err("student must not sign in to the admin surface");
    assert!(matches!(err, AuthError::RoleMismatch));

    Ok(())
}

#[tokio::test]
async fn suspended_profile_cannot_sign_in() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let profile = ctx.register("chef@example.com", Role::CafeteriaManager).await?;
    ctx.suspend(profile.id).await?;

    let err = ctx
        .authenticator()
        .sign_in("chef@example.com", PASSWORD, Role::CafeteriaManager)
        .await
        .expect_err("suspended profile must be rejected");
    assert!(matches!(err, AuthError::AccountSuspended));

    let wrong_password = ctx
        .authenticator()
        .sign_in("chef@example.com", "wrong-password", Role::CafeteriaManager)
        .await
        .expect_err("bad password is reported before suspension");
    assert!(matches!(wrong_password, AuthError::InvalidCredentials));

    Ok(())
}

#[tokio::test]
async fn authenticate_token_returns_profile_and_session_for_active_token() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let profile = ctx.register("alice@example.com", Role::Student).await?;
    let (_, session) = ctx
        .authenticator()
        .sign_in("alice@example.com", PASSWORD, Role::Student)
        .await?;

    let (resolved, resolved_session) = ctx
        .authenticator()
        .authenticate_token(&session.token)
        .await?;

    assert_eq!(resolved.id, profile.id);
    assert_eq!(resolved_session.token, session.token);
    Ok(())
}

#[tokio::test]
async fn authenticate_token_rejects_sessions_of_suspended_profiles() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let profile = ctx.register("alice@example.com", Role::Student).await?;
    let (_, session) = ctx
        .authenticator()
        .sign_in("alice@example.com", PASSWORD, Role::Student)
        .await?;

    ctx.suspend(profile.id).await?;

    let err = ctx
        .authenticator()
        .authenticate_token(&session.token)
        .await
        .expect_err("suspended profile must not authenticate");
    assert!(matches!(err, AuthError::AccountSuspended));
    Ok(())
}

#[tokio::test]
async fn authenticate_token_deletes_expired_sessions() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let profile = ctx.register("alice@example.com", Role::Student).await?;

    let token = "expired-token";
    let created_at = (Utc::now() - Duration::hours(2)).to_rfc3339();
    let expires_at = (Utc::now() - Duration::hours(1)).to_rfc3339();

    sqlx::query(
        "INSERT INTO sessions (user_id, token, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(profile.id)
    .bind(token)
    .bind(&created_at)
    .bind(&expires_at)
    .execute(ctx.pool())
    .await?;

    let err = ctx
        .authenticator()
        .authenticate_token(token)
        .await
        .expect_err("expired token should be rejected");
    assert!(matches!(err, AuthError::SessionExpired));

    let remaining: Option<i64> = sqlx::query_scalar("SELECT 1 FROM sessions WHERE token = ?")
        .bind(token)
        .fetch_optional(ctx.pool())
        .await?;
    assert!(
        remaining.is_none(),
        "expired session should be removed from the database"
    );

    Ok(())
}

#[tokio::test]
async fn authenticate_token_rejects_unknown_token() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let err = ctx
        .authenticator()
        .authenticate_token("missing-token")
        .await
        .expect_err("unknown token should not authenticate");
    assert!(matches!(err, AuthError::SessionNotFound));
    Ok(())
}

#[tokio::test]
async fn sign_out_and_revocation_remove_sessions() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let profile = ctx.register("alice@example.com", Role::Student).await?;

    let mut tokens = Vec::new();
    for _ in 0..3 {
        let (_, session) = ctx
            .authenticator()
            .sign_in("alice@example.com", PASSWORD, Role::Student)
            .await?;
        tokens.push(session.token);
    }

    assert!(ctx.authenticator().sign_out(&tokens[0]).await?);
    assert!(!ctx.authenticator().sign_out(&tokens[0]).await?);

    let revoked = ctx.authenticator().revoke_sessions_for(profile.id).await?;
    assert_eq!(revoked, 2);

    let err = ctx
        .authenticator()
        .authenticate_token(&tokens[1])
        .await
        .expect_err("revoked session should not authenticate");
    assert!(matches!(err, AuthError::SessionNotFound));
    Ok(())
}

#[tokio::test]
async fn change_password_requires_current_secret() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let profile = ctx.register("alice@example.com", Role::Student).await?;

    let err = ctx
        .authenticator()
        .change_password(profile.id, "wrong-password", "brand-new-pass")
        .await
        .expect_err("wrong current password should fail");
    assert!(matches!(err, AuthError::InvalidCredentials));

    ctx.authenticator()
        .change_password(profile.id, PASSWORD, "brand-new-pass")
        .await?;

    let old = ctx
        .authenticator()
        .sign_in("alice@example.com", PASSWORD, Role::Student)
        .await
        .expect_err("old password should no longer work");
    assert!(matches!(old, AuthError::InvalidCredentials));

    ctx.authenticator()
        .sign_in("alice@example.com", "brand-new-pass", Role::Student)
        .await?;
    Ok(())
}

#[tokio::test]
async fn session_tokens_are_unique_and_urlsafe() -> TestResult {
    let ctx = TestContext::new_default().await?;
    ctx.register("alice@example.com", Role::Student).await?;

    let mut tokens = HashSet::new();
    for _ in 0..5 {
        let (_, session) = ctx
            .authenticator()
            .sign_in("alice@example.com", PASSWORD, Role::Student)
            .await?;
        assert!(
            URL_SAFE_NO_PAD.decode(session.token.as_bytes()).is_ok(),
            "token should be URL safe base64"
        );
        assert!(
            tokens.insert(session.token.clone()),
            "tokens should be unique per session"
        );
    }
    Ok(())
}

#[tokio::test]
async fn identical_passwords_get_distinct_hashes() -> TestResult {
    let ctx = TestContext::new_default().await?;
    let first = ctx.register("alice@example.com", Role::Student).await?;
    let second = ctx.register("bob@example.com", Role::Student).await?;

    let first_secret: String =
        sqlx::query_scalar("SELECT secret FROM user_identities WHERE user_id = ?")
            .bind(first.id)
            .fetch_one(ctx.pool())
            .await?;
    let second_secret: String =
        sqlx::query_scalar("SELECT secret FROM user_identities WHERE user_id = ?")
            .bind(second.id)
            .fetch_one(ctx.pool())
            .await?;

    assert_ne!(
        first_secret, second_secret,
        "argon2 salts must randomise identical passwords"
    );
    argon2::password_hash::PasswordHash::new(&first_secret)?;
    Ok(())
}
