use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "unieats.toml",
    "config/unieats.toml",
    "crates/config/unieats.toml",
    "../unieats.toml",
    "../config/unieats.toml",
    "backend/unieats.toml",
    "backend/config/unieats.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://unieats.db".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_session_ttl")]
    pub session_ttl_seconds: u64,
    #[serde(default = "AuthConfig::default_min_password_length")]
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: Self::default_session_ttl(),
            min_password_length: Self::default_min_password_length(),
        }
    }
}

impl AuthConfig {
    const fn default_session_ttl() -> u64 {
        86_400
    }

    const fn default_min_password_length() -> usize {
        8
    }
}

/// Platform fee settings, expressed in basis points (1/100 of a percent).
///
/// ```
/// use unieats_config::PricingConfig;
///
/// let pricing = PricingConfig::default();
/// assert_eq!(pricing.service_fee_bps, 400);
/// assert_eq!(pricing.commission_bps, 1_000);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Fee added on top of the subtotal and paid by the student.
    #[serde(default = "PricingConfig::default_service_fee")]
    pub service_fee_bps: u32,
    /// Share of the subtotal withheld from the cafeteria.
    #[serde(default = "PricingConfig::default_commission")]
    pub commission_bps: u32,
}

impl PricingConfig {
    const fn default_service_fee() -> u32 {
        400
    }

    const fn default_commission() -> u32 {
        1_000
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            service_fee_bps: Self::default_service_fee(),
            commission_bps: Self::default_commission(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "DashboardConfig::default_window")]
    pub default_window_days: u32,
    #[serde(default = "DashboardConfig::default_max_window")]
    pub max_window_days: u32,
    #[serde(default = "DashboardConfig::default_low_stock_limit")]
    pub low_stock_limit: u32,
}

impl DashboardConfig {
    const fn default_window() -> u32 {
        30
    }

    const fn default_max_window() -> u32 {
        365
    }

    const fn default_low_stock_limit() -> u32 {
        50
    }

    /// Clamp a requested window to `1..=max_window_days`, falling back to the default.
    pub fn window(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_window_days)
            .clamp(1, self.max_window_days.max(1))
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_window_days: Self::default_window(),
            max_window_days: Self::default_max_window(),
            low_stock_limit: Self::default_low_stock_limit(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use unieats_config::load;
///
/// std::env::remove_var("UNIEATS_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let session_ttl = i64::try_from(defaults.auth.session_ttl_seconds).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default("auth.session_ttl_seconds", session_ttl)?
        .set_default(
            "auth.min_password_length",
            defaults.auth.min_password_length as i64,
        )?
        .set_default(
            "pricing.service_fee_bps",
            i64::from(defaults.pricing.service_fee_bps),
        )?
        .set_default(
            "pricing.commission_bps",
            i64::from(defaults.pricing.commission_bps),
        )?
        .set_default(
            "dashboard.default_window_days",
            i64::from(defaults.dashboard.default_window_days),
        )?
        .set_default(
            "dashboard.max_window_days",
            i64::from(defaults.dashboard.max_window_days),
        )?
        .set_default(
            "dashboard.low_stock_limit",
            i64::from(defaults.dashboard.low_stock_limit),
        )?;

    let environment_overrides = config::Environment::with_prefix("UNIEATS").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("UNIEATS_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via UNIEATS_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.auth.session_ttl_seconds > i64::MAX as u64 {
        config.auth.session_ttl_seconds = i64::MAX as u64;
    }

    if config.pricing.service_fee_bps > 10_000 || config.pricing.commission_bps > 10_000 {
        anyhow::bail!("pricing rates must not exceed 10000 basis points");
    }

    debug!(?config, "loaded backend configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_window_is_clamped() {
        let dashboard = DashboardConfig::default();
        assert_eq!(dashboard.window(None), 30);
        assert_eq!(dashboard.window(Some(0)), 1);
        assert_eq!(dashboard.window(Some(7)), 7);
        assert_eq!(dashboard.window(Some(10_000)), 365);
    }
}
