//! Application state

use std::sync::Arc;
use mobileorder_core::Result;
use mobileorder_database::{
    sqlx::{Pool, Sqlite},
    Database,
};
use mobileorder_scheduler::Scheduler;
use tokio::sync::RwLock;
use tracing::info;

use crate::{auth::TokenKeys, config::Config, rate_limiter::RateLimiter};

/// Shared application state
///
/// This struct implements Clone to allow it to be used as Axum state
/// All fields are wrapped in Arc for efficient cloning
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: Pool<Sqlite>,
    pub tokens: Arc<TokenKeys>,
    pub rate_limiter: Arc<RateLimiter>,
    pub scheduler: Arc<RwLock<Option<Scheduler>>>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config, database: &Database) -> Self {
        let tokens = TokenKeys::new(&config.secret, config.token_ttl_hours);

        Self {
            config: Arc::new(config),
            pool: database.pool().clone(),
            tokens: Arc::new(tokens),
            rate_limiter: Arc::new(RateLimiter::new()),
            scheduler: Arc::new(RwLock::new(None)),
        }
    }

    /// Register housekeeping jobs and start the scheduler
    pub async fn start_scheduler(&self) -> Result<()> {
        let mut scheduler_lock = self.scheduler.write().await;
        let scheduler = Scheduler::new();

        let limiter = self.rate_limiter.clone();
        scheduler
            .add_task(
                "rate_limiter_cleanup",
                &self.config.cleanup_schedule,
                move || {
                    limiter.cleanup();
                    Ok(())
                },
            )
            .await?;

        info!(tasks = scheduler.task_count().await, "Starting scheduler");
        scheduler.start().await?;

        *scheduler_lock = Some(scheduler);
        Ok(())
    }

    /// Stop background jobs
    pub async fn shutdown(&self) {
        if let Some(scheduler) = self.scheduler.write().await.take() {
            scheduler.shutdown().await;
        }
    }

    /// State backed by a fresh in-memory database
    #[cfg(test)]
    pub async fn for_tests() -> Self {
        let database = Database::in_memory().await.unwrap();
        Self::new(Config::new("test-secret"), &database)
    }
}
