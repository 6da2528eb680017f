//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use quill_infra::JwtConfig;

use crate::telemetry::TelemetryConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Absent means the in-memory store.
    pub database: Option<DatabaseSettings>,
    pub jwt: JwtConfig,
    /// Absent means first-admin creation is disabled.
    pub admin_creation_key: Option<String>,
    pub environment: String,
    pub rate_limit: RateLimitSettings,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window: Duration,
    /// Key clients on `X-Forwarded-For` instead of the socket peer.
    pub trust_proxy: bool,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
            trust_proxy: false,
        }
    }
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = non_empty("DATABASE_URL").map(|url| DatabaseSettings {
            url,
            max_connections: parsed("DB_MAX_CONNECTIONS", 100),
            min_connections: parsed("DB_MIN_CONNECTIONS", 10),
        });

        let jwt_defaults = JwtConfig::default();
        let jwt = JwtConfig {
            secret: non_empty("JWT_SECRET").unwrap_or(jwt_defaults.secret),
            expiration_hours: parsed("JWT_EXPIRATION_HOURS", jwt_defaults.expiration_hours),
            issuer: non_empty("JWT_ISSUER").unwrap_or(jwt_defaults.issuer),
        };

        let rate_defaults = RateLimitSettings::default();
        let rate_limit = RateLimitSettings {
            max_requests: parsed("RATE_LIMIT_MAX_REQUESTS", rate_defaults.max_requests),
            window: Duration::from_secs(parsed(
                "RATE_LIMIT_WINDOW_SECS",
                rate_defaults.window.as_secs(),
            )),
            trust_proxy: parsed("TRUST_PROXY", rate_defaults.trust_proxy),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parsed("PORT", 5000),
            database,
            jwt,
            admin_creation_key: non_empty("ADMIN_CREATION_KEY"),
            environment: env::var("RUST_ENV").unwrap_or_else(|_| "production".to_string()),
            rate_limit,
            telemetry: TelemetryConfig::from_env(),
        }
    }

    /// Development mode exposes internal error messages in responses.
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}
