use std::sync::{Arc, Mutex};

use chrono::Utc;
use dashmap::DashMap;
use vtf_core::AgentStat;

use crate::{
    ServiceError, ServiceResult,
    tier::{Tier, TierMember, TierRepository},
    user::{User, UserRepository},
};

/// Users kept in insertion order, which is also their creation order.
#[derive(Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<Mutex<Vec<User>>>,
    tiers: InMemoryTierRepository,
}

impl InMemoryUserRepository {
    /// Shares tier membership with `tiers` so renames and deletions reach it.
    pub fn with_tiers(tiers: InMemoryTierRepository) -> Self {
        Self {
            users: Arc::default(),
            tiers,
        }
    }

    fn find(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| predicate(u)).cloned()
    }

    fn modify(&self, id: &str, f: impl FnOnce(&mut User)) -> ServiceResult<()> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return ServiceError::not_found("User not found");
        };
        f(user);
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_user_by_id(&self, id: &str) -> ServiceResult<Option<User>> {
        Ok(self.find(|u| u.id == id))
    }

    async fn get_user_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        Ok(self.find(|u| u.email == email))
    }

    async fn get_user_by_nickname(&self, nickname: &str) -> ServiceResult<Option<User>> {
        Ok(self.find(|u| u.nickname == nickname))
    }

    async fn get_user_by_valorant_nickname(&self, name: &str) -> ServiceResult<Option<User>> {
        Ok(self.find(|u| u.valorant_nickname == name))
    }

    async fn create_user(&self, user: &User) -> ServiceResult<()> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| {
            u.id == user.id
                || u.email == user.email
                || u.nickname == user.nickname
                || u.valorant_nickname == user.valorant_nickname
        }) {
            return ServiceError::bad_request("User already exists");
        }
        users.push(user.clone());
        Ok(())
    }

    async fn get_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn update_agent_stats(
        &self,
        id: &str,
        agent_stats: &[AgentStat],
        league_point: u32,
    ) -> ServiceResult<()> {
        self.modify(id, |user| {
            user.agent_stats = agent_stats.to_vec();
            user.league_point = league_point;
        })
    }

    async fn update_tier(&self, id: &str, tier: &str) -> ServiceResult<()> {
        self.modify(id, |user| user.tier = tier.to_string())
    }

    async fn update_profile(&self, user: &User) -> ServiceResult<()> {
        {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| {
                u.id != user.id
                    && (u.nickname == user.nickname
                        || u.valorant_nickname == user.valorant_nickname)
            }) {
                return ServiceError::bad_request("User already exists");
            }
            let Some(stored) = users.iter_mut().find(|u| u.id == user.id) else {
                return ServiceError::not_found("User not found");
            };
            stored.nickname = user.nickname.clone();
            stored.valorant_nickname = user.valorant_nickname.clone();
            stored.preferred_position = user.preferred_position;
            stored.updated_at = Utc::now();
        }
        self.tiers.rename_member(&user.id, &user.nickname);
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> ServiceResult<()> {
        {
            let mut users = self.users.lock().unwrap();
            let before = users.len();
            users.retain(|u| u.id != id);
            if users.len() == before {
                return ServiceError::not_found("User not found");
            }
        }
        self.tiers.forget_member(id);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryTierRepository {
    tiers: Arc<DashMap<String, Tier>>,
}

impl InMemoryTierRepository {
    fn rename_member(&self, user_id: &str, nickname: &str) {
        for mut tier in self.tiers.iter_mut() {
            for member in tier.members.iter_mut().filter(|m| m.user_id == user_id) {
                member.nickname = nickname.to_string();
            }
        }
    }

    fn forget_member(&self, user_id: &str) {
        for mut tier in self.tiers.iter_mut() {
            tier.members.retain(|m| m.user_id != user_id);
        }
    }
}

#[async_trait::async_trait]
impl TierRepository for InMemoryTierRepository {
    async fn get_tiers(&self) -> ServiceResult<Vec<Tier>> {
        let mut tiers: Vec<Tier> = self.tiers.iter().map(|t| t.value().clone()).collect();
        tiers.sort_by_key(|t| t.position);
        Ok(tiers)
    }

    async fn get_tier(&self, name: &str) -> ServiceResult<Option<Tier>> {
        Ok(self.tiers.get(name).map(|t| t.value().clone()))
    }

    async fn create_tier(&self, tier: &Tier) -> ServiceResult<()> {
        if self.tiers.contains_key(&tier.name) {
            return ServiceError::bad_request(format!("Tier {} already exists", tier.name));
        }
        self.tiers.insert(tier.name.clone(), tier.clone());
        Ok(())
    }

    async fn assign_member(&self, tier_name: &str, member: &TierMember) -> ServiceResult<()> {
        if !self.tiers.contains_key(tier_name) {
            return ServiceError::not_found(format!("Tier {} not found", tier_name));
        }
        for mut tier in self.tiers.iter_mut() {
            tier.members.retain(|m| m.user_id != member.user_id);
        }
        if let Some(mut tier) = self.tiers.get_mut(tier_name) {
            tier.members.push(member.clone());
        }
        Ok(())
    }

    async fn remove_member(&self, tier_name: &str, user_id: &str) -> ServiceResult<()> {
        match self.tiers.get_mut(tier_name) {
            Some(mut tier) => {
                tier.members.retain(|m| m.user_id != user_id);
                Ok(())
            }
            None => ServiceError::not_found(format!("Tier {} not found", tier_name)),
        }
    }
}
