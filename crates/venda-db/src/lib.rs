//! # venda-db
//!
//! PostgreSQL persistence layer for venda: connection pooling, the job queue
//! repository, product and notification stores, embedded migrations, and
//! fixtures for schema-isolated integration tests.
//!
//! The job queue lives in an ordinary table; producers and the worker
//! coordinate through it alone. See [`jobs::PgJobRepository`] for the claim
//! protocol.

pub mod jobs;
pub mod notifications;
pub mod pool;
pub mod products;
pub mod test_fixtures;

pub use jobs::PgJobRepository;
pub use notifications::PgNotificationRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use products::PgProductRepository;

// Re-export core so downstream crates need a single import path.
pub use venda_core::*;

use sqlx::PgPool;

/// Aggregated handle to every repository plus the underlying pool.
pub struct Database {
    /// Underlying connection pool.
    pub pool: PgPool,
    /// Job queue repository.
    pub jobs: PgJobRepository,
    /// Product store (implements the inventory capability).
    pub products: PgProductRepository,
    /// Notification store.
    pub notifications: PgNotificationRepository,
}

impl Database {
    /// Create a Database from an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            jobs: PgJobRepository::new(pool.clone()),
            products: PgProductRepository::new(pool.clone()),
            notifications: PgNotificationRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect with default pool configuration.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Connect with custom pool configuration.
    pub async fn connect_with_config(database_url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(database_url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations from the workspace `migrations/` directory.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
