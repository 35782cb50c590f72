//! Application state - shared across all handlers.

use std::sync::Arc;

use tera::Tera;

use blogicum_core::error::RepoError;
use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PasswordService, PostRepository,
    RateLimitError, RateLimiter, SessionTokens, UserRepository,
};
use blogicum_infra::{Argon2PasswordService, InMemoryRateLimiter, InMemoryStore, JwtSessionTokens};

#[cfg(feature = "postgres")]
use blogicum_infra::database::{
    DatabaseConnections, PostgresCategoryRepository, PostgresCommentRepository,
    PostgresLocationRepository, PostgresPostRepository, PostgresUserRepository,
};

use crate::config::{AppConfig, PaginationConfig, SessionConfig};

/// Failures that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to load templates: {0}")]
    Templates(#[from] tera::Error),

    #[error("invalid login rate limit: {0}")]
    RateLimit(#[from] RateLimitError),

    #[error("failed to seed in-memory store: {0}")]
    Seed(#[from] RepoError),
}

/// Which backend the repositories run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Storage {
    Postgres,
    Memory,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub sessions: Arc<dyn SessionTokens>,
    pub passwords: Arc<dyn PasswordService>,
    pub login_limiter: Arc<dyn RateLimiter>,
    pub templates: Arc<Tera>,
    pub storage: Storage,
    pub pagination: PaginationConfig,
    pub session: SessionConfig,
}

impl AppState {
    /// Build the application state, backed by PostgreSQL when
    /// `DATABASE_URL` is set and reachable.
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        #[cfg(feature = "postgres")]
        {
            if let Some(db_config) = &config.database {
                match DatabaseConnections::init(db_config).await {
                    Ok(connections) => {
                        let db = connections.main;
                        tracing::info!("Using PostgreSQL repositories");
                        return Self::assemble(
                            config,
                            Storage::Postgres,
                            Arc::new(PostgresUserRepository::new(db.clone())),
                            Arc::new(PostgresCategoryRepository::new(db.clone())),
                            Arc::new(PostgresLocationRepository::new(db.clone())),
                            Arc::new(PostgresPostRepository::new(db.clone())),
                            Arc::new(PostgresCommentRepository::new(db)),
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            "Failed to connect to database. Using in-memory fallback."
                        );
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            }
        }

        #[cfg(not(feature = "postgres"))]
        tracing::info!("Running without postgres feature - using in-memory store");

        let store = InMemoryStore::new();
        store.seed_defaults().await?;
        Self::in_memory(store, config)
    }

    /// State backed entirely by `store`.
    pub fn in_memory(store: InMemoryStore, config: &AppConfig) -> Result<Self, StartupError> {
        Self::assemble(
            config,
            Storage::Memory,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
        )
    }

    fn assemble(
        config: &AppConfig,
        storage: Storage,
        users: Arc<dyn UserRepository>,
        categories: Arc<dyn CategoryRepository>,
        locations: Arc<dyn LocationRepository>,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Result<Self, StartupError> {
        let templates = Tera::new(&format!("{}/**/*.html", config.templates_dir))?;
        tracing::debug!(
            count = templates.get_template_names().count(),
            "Templates loaded"
        );

        let state = Self {
            users,
            categories,
            locations,
            posts,
            comments,
            sessions: Arc::new(JwtSessionTokens::new(config.jwt.clone())),
            passwords: Arc::new(Argon2PasswordService::new()),
            login_limiter: Arc::new(InMemoryRateLimiter::new(
                config.login_rate_limit.clone(),
            )?),
            templates: Arc::new(templates),
            storage,
            pagination: config.pagination,
            session: config.session,
        };

        tracing::info!(?storage, "Application state initialized");
        Ok(state)
    }
}
