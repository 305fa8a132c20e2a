use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};
use vtf_server_domain::{ServiceError, ServiceResult, verification::CodeStore};

/// Pending verification codes, expiry stored as unix milliseconds.
pub struct SqliteCodeStore {
    pool: Pool<Sqlite>,
}

impl SqliteCodeStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CodeStore for SqliteCodeStore {
    async fn put_code(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO verification_codes (email, code, expires_at) VALUES (?, ?, ?)",
        )
        .bind(email)
        .bind(code)
        .bind(expires_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn take_code(&self, email: &str, code: &str, now: DateTime<Utc>) -> ServiceResult<bool> {
        let result = sqlx::query(
            "DELETE FROM verification_codes WHERE email = ? AND code = ? AND expires_at > ?",
        )
        .bind(email)
        .bind(code)
        .bind(now.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove_code(&self, email: &str) -> ServiceResult<()> {
        sqlx::query("DELETE FROM verification_codes WHERE email = ?")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(())
    }
}
