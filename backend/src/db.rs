use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, Pool, Postgres};

use crate::error::SagipResult;

pub type DbPool = Pool<Postgres>;

pub fn init_pool_with_options(opts: PgConnectOptions) -> DbPool {
    // Lazy: the first query opens the first connection.
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .idle_timeout(std::time::Duration::from_secs(120))
        .max_lifetime(std::time::Duration::from_secs(300))
        .connect_lazy_with(opts)
}

pub async fn init_database(
    pool: &DbPool,
    admin_email: &str,
    admin_password: &str,
) -> SagipResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    ensure_seeds(pool, admin_email, admin_password).await?;
    tracing::info!("Database ready");
    Ok(())
}

/// Creates the default admin account when the users table is empty.
async fn ensure_seeds(
    pool: &DbPool,
    admin_email: &str,
    admin_password: &str,
) -> SagipResult<()> {
    let user_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if user_count.0 > 0 {
        return Ok(());
    }

    let hash = bcrypt::hash(admin_password, bcrypt::DEFAULT_COST)?;
    sqlx::query(
        "INSERT INTO users (email, password_hash, role) VALUES ($1, $2, 'admin') ON CONFLICT (email) DO NOTHING",
    )
    .bind(admin_email)
    .bind(hash)
    .execute(pool)
    .await?;
    tracing::info!("Default admin created (email: {})", admin_email);
    Ok(())
}

/// Full user row, only used for credential checks.
#[derive(Debug, FromRow)]
pub struct UserCredentials {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DetectionLog {
    pub id: i32,
    pub pest_name: Option<String>,
    pub image_path: Option<String>,
    pub date_detected: NaiveDateTime,
    pub email: String,
    pub user_id: i32,
}
