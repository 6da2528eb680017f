//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{PostRepository, RateLimiter, UserRepository};
use quill_core::services::{BlogService, UserService};
use quill_infra::{
    Argon2PasswordService, InMemoryPostRepository, InMemoryUserRepository, JwtConfig,
    JwtTokenService,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub blogs: Arc<BlogService>,
    /// `None` disables throttling.
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,
    /// Which store backs the repositories, for the banner and health check.
    pub storage: &'static str,
}

type Repositories = (Arc<dyn UserRepository>, Arc<dyn PostRepository>);

impl AppState {
    /// Build the application state with the implementations `config` selects.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let (users, posts, storage) = repositories(config).await?;
        let rate_limiter = rate_limiter(config)?;

        tracing::info!(storage, "Application state initialized");
        Ok(Self::assemble(
            users,
            posts,
            storage,
            config.jwt.clone(),
            config.admin_creation_key.clone(),
            rate_limiter,
        ))
    }

    /// State over fresh in-memory stores with throttling disabled.
    pub fn in_memory(jwt: JwtConfig, admin_creation_key: Option<String>) -> Self {
        let (users, posts) = in_memory_repositories();
        Self::assemble(users, posts, "memory", jwt, admin_creation_key, None)
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    fn assemble(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        storage: &'static str,
        jwt: JwtConfig,
        admin_creation_key: Option<String>,
        rate_limiter: Option<Arc<dyn RateLimiter>>,
    ) -> Self {
        let passwords = Arc::new(Argon2PasswordService::new());
        let tokens = Arc::new(JwtTokenService::new(jwt));

        let user_service = UserService::new(
            users.clone(),
            posts.clone(),
            passwords,
            tokens,
            admin_creation_key,
        );
        let blog_service = BlogService::new(posts, users);

        Self {
            users: Arc::new(user_service),
            blogs: Arc::new(blog_service),
            rate_limiter,
            storage,
        }
    }
}

fn in_memory_repositories() -> Repositories {
    (
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(InMemoryPostRepository::new()),
    )
}

#[cfg(feature = "postgres")]
async fn repositories(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn UserRepository>, Arc<dyn PostRepository>, &'static str)> {
    use anyhow::Context;
    use quill_infra::database::{DatabaseConfig, connect};
    use quill_infra::{PostgresPostRepository, PostgresUserRepository};

    let Some(settings) = &config.database else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        let (users, posts) = in_memory_repositories();
        return Ok((users, posts, "memory"));
    };

    let db_config = DatabaseConfig {
        max_connections: settings.max_connections,
        min_connections: settings.min_connections,
        ..DatabaseConfig::new(settings.url.clone())
    };
    let conn = connect(&db_config)
        .await
        .context("Failed to connect to database")?;

    Ok((
        Arc::new(PostgresUserRepository::new(conn.clone())),
        Arc::new(PostgresPostRepository::new(conn)),
        "postgres",
    ))
}

#[cfg(not(feature = "postgres"))]
async fn repositories(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn UserRepository>, Arc<dyn PostRepository>, &'static str)> {
    if config.database.is_some() {
        tracing::warn!("DATABASE_URL ignored - built without the postgres feature");
    }
    let (users, posts) = in_memory_repositories();
    Ok((users, posts, "memory"))
}

#[cfg(feature = "rate-limit")]
fn rate_limiter(config: &AppConfig) -> anyhow::Result<Option<Arc<dyn RateLimiter>>> {
    use quill_infra::{InMemoryRateLimiter, RateLimitConfig};

    let limiter = InMemoryRateLimiter::new(RateLimitConfig {
        max_requests: config.rate_limit.max_requests,
        window: config.rate_limit.window,
    })?;
    tracing::info!(
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window.as_secs(),
        "Rate limiting enabled"
    );
    Ok(Some(Arc::new(limiter)))
}

#[cfg(not(feature = "rate-limit"))]
fn rate_limiter(_config: &AppConfig) -> anyhow::Result<Option<Arc<dyn RateLimiter>>> {
    Ok(None)
}
