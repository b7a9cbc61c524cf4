//! Postgres access: pool bootstrap, embedded migrations and one repo per table.

use anyhow::{Context, Result};
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

pub mod availability_repo;
pub mod championship_repo;
pub mod game_repo;
pub mod intention_repo;
pub mod models;
pub mod player_repo;
pub mod session_repo;
pub mod stat_repo;
pub mod team_repo;
pub mod terms_repo;
pub mod user_repo;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Opens the pool, retrying while Postgres is still starting up.
pub async fn connect(database_url: &str, max_connections: u32, attempts: usize) -> Result<PgPool> {
    let strategy = ExponentialBackoff::from_millis(2)
        .factor(250)
        .max_delay(Duration::from_secs(10))
        .map(jitter)
        .take(attempts);

    Retry::spawn(strategy, || async {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .inspect_err(|e| log::warn!("waiting for Postgres: {e}"))
    })
    .await
    .context("connecting to Postgres")
}
