use sqlx::{Pool, Row, Sqlite};
use vtf_server_domain::{
    ServiceError, ServiceResult,
    tier::{Tier, TierMember, TierRepository},
};

pub struct SqliteTierRepository {
    pool: Pool<Sqlite>,
}

impl SqliteTierRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn tier_exists(&self, name: &str) -> ServiceResult<bool> {
        let row: Option<(String,)> = sqlx::query_as("SELECT name FROM tiers WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn members_of(&self, name: &str) -> ServiceResult<Vec<TierMember>> {
        let rows = sqlx::query(
            "SELECT user_id, nickname FROM tier_members WHERE tier_name = ? ORDER BY rowid",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
        rows.iter()
            .map(|row| {
                Ok(TierMember {
                    user_id: row.try_get("user_id")?,
                    nickname: row.try_get("nickname")?,
                })
            })
            .collect::<sqlx::Result<Vec<_>>>()
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }
}

#[async_trait::async_trait]
impl TierRepository for SqliteTierRepository {
    async fn get_tiers(&self) -> ServiceResult<Vec<Tier>> {
        let rows: Vec<(String, String, i64)> =
            sqlx::query_as("SELECT name, color, position FROM tiers ORDER BY position")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| ServiceError::Internal(e.to_string()))?;

        let mut tiers = Vec::with_capacity(rows.len());
        for (name, color, position) in rows {
            let members = self.members_of(&name).await?;
            tiers.push(Tier {
                name,
                color,
                position: u32::try_from(position).unwrap_or(0),
                members,
            });
        }
        Ok(tiers)
    }

    async fn get_tier(&self, name: &str) -> ServiceResult<Option<Tier>> {
        let row: Option<(String, String, i64)> =
            sqlx::query_as("SELECT name, color, position FROM tiers WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| ServiceError::Internal(e.to_string()))?;
        let Some((name, color, position)) = row else {
            return Ok(None);
        };
        let members = self.members_of(&name).await?;
        Ok(Some(Tier {
            name,
            color,
            position: u32::try_from(position).unwrap_or(0),
            members,
        }))
    }

    async fn create_tier(&self, tier: &Tier) -> ServiceResult<()> {
        sqlx::query("INSERT INTO tiers (name, color, position) VALUES (?, ?, ?)")
            .bind(&tier.name)
            .bind(&tier.color)
            .bind(i64::from(tier.position))
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        for member in &tier.members {
            self.assign_member(&tier.name, member).await?;
        }
        Ok(())
    }

    async fn assign_member(&self, tier_name: &str, member: &TierMember) -> ServiceResult<()> {
        if !self.tier_exists(tier_name).await? {
            return ServiceError::not_found(format!("Tier {} not found", tier_name));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        sqlx::query("DELETE FROM tier_members WHERE user_id = ?")
            .bind(&member.user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        sqlx::query("INSERT INTO tier_members (user_id, tier_name, nickname) VALUES (?, ?, ?)")
            .bind(&member.user_id)
            .bind(tier_name)
            .bind(&member.nickname)
            .execute(&mut *tx)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        tx.commit()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn remove_member(&self, tier_name: &str, user_id: &str) -> ServiceResult<()> {
        if !self.tier_exists(tier_name).await? {
            return ServiceError::not_found(format!("Tier {} not found", tier_name));
        }
        sqlx::query("DELETE FROM tier_members WHERE tier_name = ? AND user_id = ?")
            .bind(tier_name)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_pool;

    fn member(user_id: &str) -> TierMember {
        TierMember {
            user_id: user_id.to_string(),
            nickname: format!("nick-{}", user_id),
        }
    }

    async fn repo_with_tiers() -> SqliteTierRepository {
        let repo = SqliteTierRepository::new(test_pool().await);
        // inserted out of order
        for (name, position) in [("2티어", 1), ("1티어", 0)] {
            repo.create_tier(&Tier::new(name, "#FFFFFF", position))
                .await
                .unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn test_tiers_ordered_by_position() {
        let repo = repo_with_tiers().await;
        let tiers = repo.get_tiers().await.unwrap();
        let names: Vec<&str> = tiers.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["1티어", "2티어"]);
        assert!(repo.get_tier("3티어").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_member_in_at_most_one_tier() {
        let repo = repo_with_tiers().await;
        repo.assign_member("1티어", &member("u1")).await.unwrap();
        repo.assign_member("1티어", &member("u2")).await.unwrap();
        repo.assign_member("2티어", &member("u1")).await.unwrap();

        let first = repo.get_tier("1티어").await.unwrap().unwrap();
        let second = repo.get_tier("2티어").await.unwrap().unwrap();
        assert_eq!(first.members, vec![member("u2")]);
        assert_eq!(second.members, vec![member("u1")]);
    }

    #[tokio::test]
    async fn test_remove_member() {
        let repo = repo_with_tiers().await;
        repo.assign_member("1티어", &member("u1")).await.unwrap();
        repo.remove_member("1티어", "u1").await.unwrap();
        assert!(repo.get_tier("1티어").await.unwrap().unwrap().members.is_empty());
        assert!(matches!(
            repo.remove_member("9티어", "u1").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            repo.assign_member("9티어", &member("u1")).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
