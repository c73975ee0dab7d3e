//! Test plan for the `unieats-config` crate.
//!
//! These tests exercise the configuration loader across default handling,
//! file discovery, environment overrides, and validation behaviour.

use std::fs;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;

use unieats_config::{load, AppConfig, AuthConfig, HttpConfig, PricingConfig};

const ENV_VARS_TO_RESET: &[&str] = &[
    "UNIEATS_CONFIG",
    "UNIEATS__AUTH__SESSION_TTL_SECONDS",
    "UNIEATS__AUTH__MIN_PASSWORD_LENGTH",
    "UNIEATS__DATABASE__MAX_CONNECTIONS",
    "UNIEATS__DATABASE__URL",
    "UNIEATS__HTTP__ADDRESS",
    "UNIEATS__HTTP__PORT",
    "UNIEATS__PRICING__SERVICE_FEE_BPS",
    "UNIEATS__PRICING__COMMISSION_BPS",
    "UNIEATS__DASHBOARD__DEFAULT_WINDOW_DAYS",
];

struct TestContext {
    vars: Vec<(String, Option<String>)>,
    original_dir: Option<PathBuf>,
}

impl TestContext {
    fn new() -> Self {
        Self {
            vars: Vec::new(),
            original_dir: None,
        }
    }

    fn reset_environment(&mut self) {
        for key in ENV_VARS_TO_RESET {
            self.remove_var(key);
        }
    }

    fn set_var(&mut self, key: &str, value: impl AsRef<str>) {
        let previous = std::env::var(key).ok();
        std::env::set_var(key, value.as_ref());
        self.vars.push((key.to_string(), previous));
    }

    fn remove_var(&mut self, key: &str) {
        let previous = std::env::var(key).ok();
        std::env::remove_var(key);
        self.vars.push((key.to_string(), previous));
    }

    fn set_current_dir(&mut self, dir: &Path) {
        if self.original_dir.is_none() {
            self.original_dir =
                Some(std::env::current_dir().expect("failed to capture current directory"));
        }
        std::env::set_current_dir(dir).expect("failed to set current directory");
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if let Some(original) = self.original_dir.take() {
            let _ = std::env::set_current_dir(original);
        }

        while let Some((key, value)) = self.vars.pop() {
            match value {
                Some(val) => std::env::set_var(&key, val),
                None => std::env::remove_var(&key),
            }
        }
    }
}

fn write_config_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create config directories");
    }
    fs::write(path, contents).expect("failed to write config file");
}

fn isolated() -> (TempDir, TestContext) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());
    (temp_dir, ctx)
}

#[test]
#[serial]
fn load_uses_default_values_when_no_files_found() {
    let (_temp_dir, _ctx) = isolated();

    let config = load().expect("configuration load should succeed without files");
    let defaults = AppConfig::default();

    assert_eq!(config.http.address, defaults.http.address);
    assert_eq!(config.http.port, defaults.http.port);
    assert_eq!(config.database.url, defaults.database.url);
    assert_eq!(
        config.database.max_connections,
        defaults.database.max_connections
    );
    assert_eq!(config.auth.session_ttl_seconds, defaults.auth.session_ttl_seconds);
    assert_eq!(config.pricing.service_fee_bps, 400);
    assert_eq!(config.pricing.commission_bps, 1_000);
    assert_eq!(config.dashboard.default_window_days, 30);
}

#[test]
#[serial]
fn load_picks_first_available_file_in_search_order() {
    let (temp_dir, _ctx) = isolated();

    write_config_file(
        temp_dir.path(),
        "unieats.toml",
        r#"
        [http]
        port = 4242
        "#,
    );
    write_config_file(
        temp_dir.path(),
        "config/unieats.toml",
        r#"
        [http]
        port = 5151
        "#,
    );

    let config = load().expect("configuration load should pick the first file");
    assert_eq!(config.http.port, 4242);
}

#[test]
#[serial]
fn load_merges_partial_file_with_defaults() {
    let (temp_dir, _ctx) = isolated();

    write_config_file(
        temp_dir.path(),
        "unieats.toml",
        r#"
        [database]
        max_connections = 50

        [pricing]
        commission_bps = 1200
        "#,
    );

    let config = load().expect("configuration load should succeed");
    let defaults = AppConfig::default();

    assert_eq!(config.database.max_connections, 50);
    assert_eq!(config.database.url, defaults.database.url);
    assert_eq!(config.http.port, defaults.http.port);
    assert_eq!(config.pricing.commission_bps, 1_200);
    assert_eq!(config.pricing.service_fee_bps, 400);
}

#[test]
#[serial]
fn load_applies_environment_overrides() {
    let (temp_dir, mut ctx) = isolated();

    write_config_file(
        temp_dir.path(),
        "unieats.toml",
        r#"
        [http]
        port = 3030
        "#,
    );

    ctx.set_var("UNIEATS__HTTP__PORT", "9090");
    ctx.set_var("UNIEATS__PRICING__SERVICE_FEE_BPS", "250");

    let config = load().expect("configuration load should honour env overrides");
    assert_eq!(config.http.port, 9090);
    assert_eq!(config.pricing.service_fee_bps, 250);
}

#[test]
#[serial]
fn load_reads_file_named_by_unieats_config() {
    let (temp_dir, mut ctx) = isolated();

    write_config_file(
        temp_dir.path(),
        "elsewhere/custom.toml",
        r#"
        [database]
        url = "sqlite://custom.db"
        "#,
    );
    ctx.set_var(
        "UNIEATS_CONFIG",
        temp_dir.path().join("elsewhere/custom.toml").display().to_string(),
    );

    let config = load().expect("explicit config file should load");
    assert_eq!(config.database.url, "sqlite://custom.db");
}

#[test]
#[serial]
fn load_clamps_session_ttl_to_i64_maximum() {
    let (_temp_dir, mut ctx) = isolated();

    let oversized = (i64::MAX as u128 + 42).to_string();
    ctx.set_var("UNIEATS__AUTH__SESSION_TTL_SECONDS", &oversized);

    let config = load().expect("configuration load should succeed with oversized TTL");
    assert_eq!(
        config.auth.session_ttl_seconds,
        i64::MAX as u64,
        "session TTL should be clamped to i64::MAX"
    );
}

#[test]
#[serial]
fn load_rejects_rates_above_one_hundred_percent() {
    let (_temp_dir, mut ctx) = isolated();

    ctx.set_var("UNIEATS__PRICING__COMMISSION_BPS", "20000");

    let error = load().expect_err("a 200% commission must be rejected");
    assert!(error.to_string().contains("basis points"));
}

#[test]
#[serial]
fn load_errors_on_invalid_toml_contents() {
    let (temp_dir, _ctx) = isolated();

    write_config_file(
        temp_dir.path(),
        "unieats.toml",
        r#"
        [http]
        port = "not-a-number
        "#,
    );

    let error = load().expect_err("invalid TOML should cause load to fail");
    let message = error.to_string();
    assert!(
        message.contains("invalid configuration") || message.contains("unable to build configuration"),
        "unexpected error message: {message}"
    );
}

#[test]
fn auth_config_defaults() {
    let defaults = AuthConfig::default();
    assert_eq!(defaults.session_ttl_seconds, 86_400);
    assert_eq!(defaults.min_password_length, 8);
}

#[test]
fn pricing_config_defaults() {
    let defaults = PricingConfig::default();
    assert_eq!(defaults.service_fee_bps, 400);
    assert_eq!(defaults.commission_bps, 1_000);
}

#[test]
fn http_config_defaults_match_expected_host_and_port() {
    let defaults = HttpConfig::default();
    assert_eq!(defaults.address, "127.0.0.1");
    assert_eq!(defaults.port, 8080);
}
