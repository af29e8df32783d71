// Database module - data access over PostgreSQL plus change publication

use color_eyre::{eyre::ensure, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::realtime::ChangeFeed;

pub mod models;
pub use models::*;

mod answer;
mod migrations;
mod question;
mod user;

const MAX_CONNECTIONS: u32 = 10;

/// Database handle. Writes that other users care about are published on the
/// attached [`ChangeFeed`] after they commit.
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
    feed: ChangeFeed,
}

impl Db {
    pub async fn new(url: &str, feed: ChangeFeed) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await?;

        let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await?;
        ensure!(one == 1, "connection check failed");

        migrations::run(&pool).await?;

        tracing::info!("database connection has been verified");

        Ok(Self { pool, feed })
    }

    /// Handle whose pool connects on first use. Skips the connection check and
    /// migrations.
    pub fn lazy(url: &str, feed: ChangeFeed) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_lazy(url)?;
        Ok(Self { pool, feed })
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub async fn migration_applied(&self, version: &str) -> Result<bool> {
        let applied: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = $1)",
        )
        .bind(version)
        .fetch_one(&self.pool)
        .await?;

        Ok(applied)
    }
}
