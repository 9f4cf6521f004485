pub mod error;
pub mod models;
pub mod tables;

mod catches;
mod feedings;
mod pools;
mod readings;
mod reports;
mod sensors;
mod users;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

pub use error::{StoreError, StoreResult};

/// Opens (creating on demand) the single-file database.
pub async fn create_pool(path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create database directory {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open database {}", path.display()))?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// 00:00 UTC of `date`.
pub(crate) fn day_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Half-open `[start 00:00, day after end 00:00)` covering both dates.
pub(crate) fn period_bounds(
    start: NaiveDate,
    end: NaiveDate,
) -> StoreResult<(DateTime<Utc>, DateTime<Utc>)> {
    if start > end {
        return Err(StoreError::validation("period start must not be after period end"));
    }
    let upper = end.succ_opt().unwrap_or(end);
    Ok((day_start(start), day_start(upper)))
}

/// Repository over the farm database.
///
/// Owns a pool handle; connections are acquired per statement, so clones are
/// cheap and may be shared across tasks. Operations live in the per-entity
/// submodules.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
    password_cost: u32,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            password_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Overrides the bcrypt cost used when hashing new passwords.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the administrator account unless a user with that name exists.
    pub async fn seed_admin(&self, username: &str, password: &str) -> StoreResult<()> {
        let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ?1")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        if existing > 0 {
            return Ok(());
        }

        let (role_id,): (i64,) =
            sqlx::query_as("SELECT id FROM roles WHERE is_admin = 1 ORDER BY id LIMIT 1")
                .fetch_one(&self.pool)
                .await?;

        self.add_user(&models::NewUser {
            username: username.to_owned(),
            password: password.to_owned(),
            first_name: "Administrator".to_owned(),
            last_name: "System".to_owned(),
            patronymic: None,
            role_id,
        })
        .await?;

        info!(username = %username, "Seeded administrator account");
        Ok(())
    }
}
