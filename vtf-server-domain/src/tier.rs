use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};
use vtf_core::UNASSIGNED_TIER;

use crate::{ServiceError, ServiceResult, user::ArcUserRepository};

/// Names and colors of the tiers created on startup, in display order.
pub const DEFAULT_TIERS: [(&str, &str); 5] = [
    ("1티어", "#FF9999"),
    ("2티어", "#FFB266"),
    ("3티어", "#FFE5B2"),
    ("4티어", "#FFFF99"),
    ("5티어", "#B2FFB2"),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierMember {
    pub user_id: String,
    pub nickname: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tier {
    pub name: String,
    pub color: String,
    pub position: u32,
    #[serde(rename = "agents")]
    pub members: Vec<TierMember>,
}

impl Tier {
    pub fn new(name: impl Into<String>, color: impl Into<String>, position: u32) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            position,
            members: Vec::new(),
        }
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }
}

pub type ArcTierRepository = Arc<Box<dyn TierRepository + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait TierRepository {
    /// All tiers ordered by position.
    async fn get_tiers(&self) -> ServiceResult<Vec<Tier>>;
    async fn get_tier(&self, name: &str) -> ServiceResult<Option<Tier>>;
    async fn create_tier(&self, tier: &Tier) -> ServiceResult<()>;
    /// Removes the member from every tier, then adds it to `tier_name`.
    async fn assign_member(&self, tier_name: &str, member: &TierMember) -> ServiceResult<()>;
    async fn remove_member(&self, tier_name: &str, user_id: &str) -> ServiceResult<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierAction {
    Add,
    Remove,
}

pub type ArcTierService = Arc<Box<dyn TierService + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait TierService {
    async fn ensure_default_tiers(&self) -> ServiceResult<()>;
    async fn get_tiers(&self) -> ServiceResult<Vec<Tier>>;
    async fn assign(&self, user_id: &str, tier_name: &str) -> ServiceResult<Vec<Tier>>;
    async fn remove(&self, user_id: &str, tier_name: &str) -> ServiceResult<Vec<Tier>>;
}

pub struct TierServiceImpl {
    tier_repository: ArcTierRepository,
    user_repository: ArcUserRepository,
}

impl TierServiceImpl {
    pub fn new(tier_repository: ArcTierRepository, user_repository: ArcUserRepository) -> Self {
        Self {
            tier_repository,
            user_repository,
        }
    }

    async fn require_tier(&self, tier_name: &str) -> ServiceResult<Tier> {
        match self.tier_repository.get_tier(tier_name).await? {
            Some(tier) => Ok(tier),
            None => ServiceError::not_found(format!("Tier {} not found", tier_name)),
        }
    }
}

#[async_trait::async_trait]
impl TierService for TierServiceImpl {
    async fn ensure_default_tiers(&self) -> ServiceResult<()> {
        for (position, (name, color)) in DEFAULT_TIERS.iter().enumerate() {
            if self.tier_repository.get_tier(name).await?.is_none() {
                self.tier_repository
                    .create_tier(&Tier::new(*name, *color, position as u32))
                    .await?;
                info!("Created tier {}", name);
            }
        }
        Ok(())
    }

    async fn get_tiers(&self) -> ServiceResult<Vec<Tier>> {
        self.tier_repository.get_tiers().await
    }

    async fn assign(&self, user_id: &str, tier_name: &str) -> ServiceResult<Vec<Tier>> {
        self.require_tier(tier_name).await?;
        let Some(user) = self.user_repository.get_user_by_id(user_id).await? else {
            return ServiceError::not_found("User not found");
        };
        let member = TierMember {
            user_id: user.id.clone(),
            nickname: user.nickname.clone(),
        };
        self.tier_repository
            .assign_member(tier_name, &member)
            .await?;
        self.user_repository.update_tier(&user.id, tier_name).await?;
        info!("Assigned {} to {}", user.nickname, tier_name);
        self.get_tiers().await
    }

    async fn remove(&self, user_id: &str, tier_name: &str) -> ServiceResult<Vec<Tier>> {
        let tier = self.require_tier(tier_name).await?;
        self.tier_repository
            .remove_member(tier_name, user_id)
            .await?;
        if tier.has_member(user_id)
            && self.user_repository.get_user_by_id(user_id).await?.is_some()
        {
            self.user_repository
                .update_tier(user_id, UNASSIGNED_TIER)
                .await?;
        }
        info!("Removed {} from {}", user_id, tier_name);
        self.get_tiers().await
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        jwt::MockJwtService,
        memory::{InMemoryTierRepository, InMemoryUserRepository},
        user::{Role, SignupForm, UserService, UserServiceImpl},
    };

    use super::*;

    async fn setup() -> (TierServiceImpl, ArcUserRepository, String) {
        let tier_repository = InMemoryTierRepository::default();
        let user_repository: ArcUserRepository = Arc::new(Box::new(
            InMemoryUserRepository::with_tiers(tier_repository.clone()),
        ));
        let tier_service =
            TierServiceImpl::new(Arc::new(Box::new(tier_repository)), user_repository.clone());
        tier_service.ensure_default_tiers().await.unwrap();

        let user_service =
            UserServiceImpl::new(user_repository.clone(), Arc::new(Box::new(MockJwtService)));
        let user = user_service
            .signup(
                SignupForm {
                    email: Some("a@example.com".to_string()),
                    nickname: Some("tiered".to_string()),
                    valorant_nickname: Some("Tiered#1".to_string()),
                    password: Some("password123".to_string()),
                    preferred_position: Some("타격대".to_string()),
                },
                Role::User,
            )
            .await
            .unwrap();
        (tier_service, user_repository, user.id)
    }

    fn tiers_of(tiers: &[Tier], user_id: &str) -> Vec<String> {
        tiers
            .iter()
            .filter(|t| t.has_member(user_id))
            .map(|t| t.name.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_default_tiers_created_once() {
        let (service, _, _) = setup().await;
        service.ensure_default_tiers().await.unwrap();
        let tiers = service.get_tiers().await.unwrap();
        let names: Vec<&str> = tiers.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["1티어", "2티어", "3티어", "4티어", "5티어"]);
        assert_eq!(tiers[0].color, "#FF9999");
    }

    #[tokio::test]
    async fn test_reassign_moves_member() {
        let (service, users, user_id) = setup().await;
        service.assign(&user_id, "1티어").await.unwrap();
        let tiers = service.assign(&user_id, "3티어").await.unwrap();
        assert_eq!(tiers_of(&tiers, &user_id), vec!["3티어"]);

        let user = users.get_user_by_id(&user_id).await.unwrap().unwrap();
        assert_eq!(user.tier, "3티어");
        let member = &tiers[2].members[0];
        assert_eq!(member.nickname, "tiered");
    }

    #[tokio::test]
    async fn test_remove_resets_user_tier() {
        let (service, users, user_id) = setup().await;
        service.assign(&user_id, "2티어").await.unwrap();
        let tiers = service.remove(&user_id, "2티어").await.unwrap();
        assert!(tiers_of(&tiers, &user_id).is_empty());
        let user = users.get_user_by_id(&user_id).await.unwrap().unwrap();
        assert_eq!(user.tier, UNASSIGNED_TIER);
    }

    #[tokio::test]
    async fn test_membership_follows_user_changes() {
        let (service, users, user_id) = setup().await;
        service.assign(&user_id, "4티어").await.unwrap();

        let mut user = users.get_user_by_id(&user_id).await.unwrap().unwrap();
        user.nickname = "renamed".to_string();
        users.update_profile(&user).await.unwrap();
        let tiers = service.get_tiers().await.unwrap();
        assert_eq!(tiers[3].members[0].nickname, "renamed");

        users.delete_user(&user_id).await.unwrap();
        let tiers = service.get_tiers().await.unwrap();
        assert!(tiers_of(&tiers, &user_id).is_empty());
    }

    #[test]
    fn test_tier_serializes_members_as_agents() {
        let mut tier = Tier::new("1티어", "#FF9999", 0);
        tier.members.push(TierMember {
            user_id: "u1".to_string(),
            nickname: "jett".to_string(),
        });
        let json = serde_json::to_value(&tier).unwrap();
        assert_eq!(json["agents"][0]["userId"], "u1");
        assert_eq!(json["color"], "#FF9999");
    }

    #[tokio::test]
    async fn test_unknown_tier_or_user() {
        let (service, _, user_id) = setup().await;
        assert!(matches!(
            service.assign(&user_id, "9티어").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.assign("missing", "1티어").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.remove(&user_id, "9티어").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
