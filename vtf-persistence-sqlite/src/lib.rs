use log::info;
use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use vtf_server_domain::{ServiceError, ServiceResult};

pub mod tiers;
pub mod users;
pub mod verification;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    email TEXT NOT NULL UNIQUE,
    nickname TEXT NOT NULL UNIQUE,
    valorant_nickname TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    preferred_position TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'USER',
    tier TEXT NOT NULL DEFAULT '미배정',
    agent_stats TEXT NOT NULL DEFAULT '[]',
    league_point INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS tiers (
    name TEXT PRIMARY KEY NOT NULL,
    color TEXT NOT NULL,
    position INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS tier_members (
    user_id TEXT PRIMARY KEY NOT NULL,
    tier_name TEXT NOT NULL REFERENCES tiers(name),
    nickname TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS verification_codes (
    email TEXT PRIMARY KEY NOT NULL,
    code TEXT NOT NULL,
    expires_at INTEGER NOT NULL
);
"#;

/// Opens the database named by `VTF_DB`, creating the file if needed.
pub fn create_db_pool() -> ServiceResult<Pool<Sqlite>> {
    let db_path = std::env::var("VTF_DB")
        .map_err(|_| ServiceError::Internal("VTF_DB env var not set".to_string()))?;

    let conn_options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);

    Ok(SqlitePoolOptions::new()
        .max_connections(5)
        .connect_lazy_with(conn_options))
}

pub async fn create_schema(pool: &Pool<Sqlite>) -> ServiceResult<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
    info!("Database schema ready");
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> Pool<Sqlite> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    create_schema(&pool).await.expect("Failed to create schema");
    pool
}
