//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use blogicum_infra::database::DatabaseConfig;
use blogicum_infra::{JwtConfig, RateLimitConfig};

/// Page sizes of the three post listings.
#[derive(Debug, Clone, Copy)]
pub struct PaginationConfig {
    pub posts_per_page: u64,
    pub category_per_page: u64,
    pub profile_per_page: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            posts_per_page: 10,
            category_per_page: 10,
            profile_per_page: 10,
        }
    }
}

/// Session cookie settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionConfig {
    /// Mark the cookie `Secure`. Enable behind HTTPS.
    pub cookie_secure: bool,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub pagination: PaginationConfig,
    pub templates_dir: String,
    pub jwt: JwtConfig,
    pub session: SessionConfig,
    pub login_rate_limit: RateLimitConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: None,
            pagination: PaginationConfig::default(),
            templates_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/templates").to_string(),
            jwt: JwtConfig::default(),
            session: SessionConfig::default(),
            login_rate_limit: RateLimitConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        // A page size of zero would make every listing empty.
        let page_size = |key: &str, default: u64| env_or(key, default).max(1);
        let pagination = PaginationConfig {
            posts_per_page: page_size("POSTS_PER_PAGE", defaults.pagination.posts_per_page),
            category_per_page: page_size("CATEGORY_PER_PAGE", defaults.pagination.category_per_page),
            profile_per_page: page_size("PROFILE_PER_PAGE", defaults.pagination.profile_per_page),
        };

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            database: DatabaseConfig::from_env(),
            pagination,
            templates_dir: env::var("TEMPLATES_DIR").unwrap_or(defaults.templates_dir),
            jwt: JwtConfig::from_env(),
            session: SessionConfig {
                cookie_secure: env_or("COOKIE_SECURE", false),
            },
            login_rate_limit: RateLimitConfig::from_env(),
        }
    }
}

/// Parse `key` from the environment, falling back to `default` when it is
/// unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
