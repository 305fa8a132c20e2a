use chrono::{DateTime, Utc};
use sqlx::{
    Pool, Row, Sqlite,
    sqlite::{SqliteQueryResult, SqliteRow},
};
use vtf_core::{AgentStat, Position};
use vtf_server_domain::{
    ServiceError, ServiceResult,
    user::{Role, User, UserRepository},
};

pub struct SqliteUserRepository {
    pool: Pool<Sqlite>,
}

impl SqliteUserRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn user_from_row(row: &SqliteRow) -> ServiceResult<User> {
        let internal = |e: sqlx::Error| ServiceError::Internal(e.to_string());

        let position: String = row.try_get("preferred_position").map_err(internal)?;
        let role: String = row.try_get("role").map_err(internal)?;
        let agent_stats: String = row.try_get("agent_stats").map_err(internal)?;
        let league_point: i64 = row.try_get("league_point").map_err(internal)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(internal)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(internal)?;

        Ok(User {
            id: row.try_get("id").map_err(internal)?,
            email: row.try_get("email").map_err(internal)?,
            nickname: row.try_get("nickname").map_err(internal)?,
            valorant_nickname: row.try_get("valorant_nickname").map_err(internal)?,
            password_hash: row.try_get("password_hash").map_err(internal)?,
            preferred_position: position
                .parse::<Position>()
                .map_err(ServiceError::Internal)?,
            role: role.parse::<Role>().map_err(ServiceError::Internal)?,
            tier: row.try_get("tier").map_err(internal)?,
            agent_stats: serde_json::from_str::<Vec<AgentStat>>(&agent_stats)
                .map_err(|e| ServiceError::Internal(format!("Corrupt agent stats: {}", e)))?,
            league_point: u32::try_from(league_point).unwrap_or(0),
            created_at,
            updated_at,
        })
    }

    async fn get_user_by(&self, column: &str, value: &str) -> ServiceResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT * FROM users WHERE {} = ?", column))
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        row.as_ref().map(Self::user_from_row).transpose()
    }
}

fn unique_violation(e: sqlx::Error) -> ServiceError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            ServiceError::BadRequest("User already exists".to_string())
        }
        _ => ServiceError::Internal(e.to_string()),
    }
}

fn ensure_updated(id: &str, result: SqliteQueryResult) -> ServiceResult<()> {
    if result.rows_affected() == 0 {
        return ServiceError::not_found(format!("User {} not found", id));
    }
    Ok(())
}

#[async_trait::async_trait]
impl UserRepository for SqliteUserRepository {
    async fn get_user_by_id(&self, id: &str) -> ServiceResult<Option<User>> {
        self.get_user_by("id", id).await
    }

    async fn get_user_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        self.get_user_by("email", email).await
    }

    async fn get_user_by_nickname(&self, nickname: &str) -> ServiceResult<Option<User>> {
        self.get_user_by("nickname", nickname).await
    }

    async fn get_user_by_valorant_nickname(&self, name: &str) -> ServiceResult<Option<User>> {
        self.get_user_by("valorant_nickname", name).await
    }

    async fn create_user(&self, user: &User) -> ServiceResult<()> {
        let agent_stats = serde_json::to_string(&user.agent_stats)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        let fields = [
            "id",
            "email",
            "nickname",
            "valorant_nickname",
            "password_hash",
            "preferred_position",
            "role",
            "tier",
            "agent_stats",
            "league_point",
            "created_at",
            "updated_at",
        ];

        sqlx::query(&format!(
            "INSERT INTO users ({}) VALUES ({})",
            fields.join(", "),
            fields.iter().map(|_| "?").collect::<Vec<_>>().join(", ")
        ))
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.nickname)
        .bind(&user.valorant_nickname)
        .bind(&user.password_hash)
        .bind(user.preferred_position.label())
        .bind(user.role.as_str())
        .bind(&user.tier)
        .bind(agent_stats)
        .bind(i64::from(user.league_point))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unique_violation)?;

        Ok(())
    }

    async fn get_users(&self) -> ServiceResult<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        rows.iter().map(Self::user_from_row).collect()
    }

    async fn update_agent_stats(
        &self,
        id: &str,
        agent_stats: &[AgentStat],
        league_point: u32,
    ) -> ServiceResult<()> {
        let agent_stats = serde_json::to_string(agent_stats)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        let result = sqlx::query(
            "UPDATE users SET agent_stats = ?, league_point = ?, updated_at = ? WHERE id = ?",
        )
        .bind(agent_stats)
        .bind(i64::from(league_point))
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
        ensure_updated(id, result)
    }

    async fn update_tier(&self, id: &str, tier: &str) -> ServiceResult<()> {
        let result = sqlx::query("UPDATE users SET tier = ?, updated_at = ? WHERE id = ?")
            .bind(tier)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        ensure_updated(id, result)
    }

    async fn update_profile(&self, user: &User) -> ServiceResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        let result = sqlx::query(
            "UPDATE users SET nickname = ?, valorant_nickname = ?, preferred_position = ?, \
             updated_at = ? WHERE id = ?",
        )
        .bind(&user.nickname)
        .bind(&user.valorant_nickname)
        .bind(user.preferred_position.label())
        .bind(Utc::now())
        .bind(&user.id)
        .execute(&mut *tx)
        .await
        .map_err(unique_violation)?;
        ensure_updated(&user.id, result)?;
        sqlx::query("UPDATE tier_members SET nickname = ? WHERE user_id = ?")
            .bind(&user.nickname)
            .bind(&user.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        tx.commit()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> ServiceResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        sqlx::query("DELETE FROM tier_members WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        ensure_updated(id, result)?;
        tx.commit()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(())
    }
}
