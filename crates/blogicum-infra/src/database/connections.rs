#[cfg(feature = "postgres")]
use std::time::Duration;

#[cfg(feature = "postgres")]
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DbConn, DbErr};

/// Where the blog database lives and how large its pool may grow.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    /// `DATABASE_URL` plus the `DB_*_CONNECTIONS` pool bounds. `None`
    /// without a URL.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty())?;
        let bound = |key: &str, default: u32| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };
        Some(Self {
            url,
            max_connections: bound("DB_MAX_CONNECTIONS", 100),
            min_connections: bound("DB_MIN_CONNECTIONS", 10),
        })
    }

    /// The URL with its password masked, for logs.
    pub fn redacted_url(&self) -> String {
        let Some((scheme, rest)) = self.url.split_once("://") else {
            return self.url.clone();
        };
        let Some((credentials, host)) = rest.rsplit_once('@') else {
            return self.url.clone();
        };
        match credentials.split_once(':') {
            Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
            None => self.url.clone(),
        }
    }
}

/// Connection pool shared by every PostgreSQL repository.
///
/// ```ignore
/// let connections = DatabaseConnections::init(&config).await?;
/// let posts = PostgresPostRepository::new(connections.main.clone());
/// ```
#[cfg(feature = "postgres")]
pub struct DatabaseConnections {
    pub main: DbConn,
}

#[cfg(feature = "postgres")]
impl DatabaseConnections {
    /// Open the pool and make one round trip, so a wrong URL fails at startup.
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DbErr> {
        tracing::info!(url = %config.redacted_url(), "Connecting to blog database");

        let mut opts = ConnectOptions::new(&config.url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(false);

        let main = Database::connect(opts).await?;
        main.execute_unprepared("SELECT 1").await?;
        tracing::info!(
            max_connections = config.max_connections,
            "Blog database connected"
        );

        Ok(Self { main })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            max_connections: 5,
            min_connections: 1,
        }
    }

    #[test]
    fn test_password_is_masked() {
        assert_eq!(
            config("postgres://blog:s3cr3t@db:5432/blogicum").redacted_url(),
            "postgres://blog:***@db:5432/blogicum"
        );
    }

    #[test]
    fn test_url_without_password_is_unchanged() {
        assert_eq!(
            config("postgres://db:5432/blogicum").redacted_url(),
            "postgres://db:5432/blogicum"
        );
        assert_eq!(
            config("postgres://blog@db/blogicum").redacted_url(),
            "postgres://blog@db/blogicum"
        );
    }
}
