use std::{collections::HashMap, sync::Arc};

use vtf_core::{
    UNASSIGNED_TIER,
    ranking::{OverallRow, PlayerEntry, RankingType, Rankings, build, build_overall},
};

use crate::{
    ServiceResult,
    tier::{ArcTierRepository, Tier},
    user::{ArcUserRepository, User},
};

pub type ArcRankingService = Arc<Box<dyn RankingService + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait RankingService {
    async fn get_rankings(&self, ranking_type: RankingType) -> ServiceResult<Rankings>;
    /// The overall leaderboard truncated to `limit` rows.
    async fn get_top_players(&self, limit: usize) -> ServiceResult<Vec<OverallRow>>;
}

pub struct RankingServiceImpl {
    user_repository: ArcUserRepository,
    tier_repository: ArcTierRepository,
}

impl RankingServiceImpl {
    pub fn new(user_repository: ArcUserRepository, tier_repository: ArcTierRepository) -> Self {
        Self {
            user_repository,
            tier_repository,
        }
    }
}

fn membership(tiers: &[Tier]) -> HashMap<&str, &str> {
    tiers
        .iter()
        .flat_map(|tier| {
            tier.members
                .iter()
                .map(move |member| (member.user_id.as_str(), tier.name.as_str()))
        })
        .collect()
}

/// Tier membership is read from the tier store rather than the mirrored
/// field on the user.
fn entries<'a>(users: &'a [User], membership: &HashMap<&str, &'a str>) -> Vec<PlayerEntry<'a>> {
    users
        .iter()
        .map(|user| PlayerEntry {
            user_id: &user.id,
            nickname: &user.nickname,
            position: user.preferred_position,
            tier: membership
                .get(user.id.as_str())
                .copied()
                .unwrap_or(UNASSIGNED_TIER),
            agent_stats: &user.agent_stats,
        })
        .collect()
}

#[async_trait::async_trait]
impl RankingService for RankingServiceImpl {
    async fn get_rankings(&self, ranking_type: RankingType) -> ServiceResult<Rankings> {
        let users = self.user_repository.get_users().await?;
        let tiers = self.tier_repository.get_tiers().await?;

        let membership = membership(&tiers);
        let tier_order: Vec<&str> = tiers.iter().map(|t| t.name.as_str()).collect();

        Ok(build(
            ranking_type,
            &entries(&users, &membership),
            &tier_order,
        ))
    }

    async fn get_top_players(&self, limit: usize) -> ServiceResult<Vec<OverallRow>> {
        let users = self.user_repository.get_users().await?;
        let tiers = self.tier_repository.get_tiers().await?;
        let membership = membership(&tiers);

        let mut rows = build_overall(&entries(&users, &membership));
        rows.truncate(limit);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use vtf_core::Ratio;

    use crate::{
        jwt::MockJwtService,
        memory::{InMemoryTierRepository, InMemoryUserRepository},
        stats::{MatchReportRequest, StatsService, StatsServiceImpl},
        tier::{ArcTierRepository, TierService, TierServiceImpl},
        user::{Role, SignupForm, UserService, UserServiceImpl},
    };

    use super::*;

    struct Fixture {
        rankings: RankingServiceImpl,
        users: UserServiceImpl,
        stats: StatsServiceImpl,
        tiers: TierServiceImpl,
    }

    async fn fixture() -> Fixture {
        let user_repository: ArcUserRepository =
            Arc::new(Box::new(InMemoryUserRepository::default()));
        let tier_repository: ArcTierRepository =
            Arc::new(Box::new(InMemoryTierRepository::default()));
        let tiers = TierServiceImpl::new(tier_repository.clone(), user_repository.clone());
        tiers.ensure_default_tiers().await.unwrap();
        Fixture {
            rankings: RankingServiceImpl::new(user_repository.clone(), tier_repository),
            users: UserServiceImpl::new(
                user_repository.clone(),
                Arc::new(Box::new(MockJwtService)),
            ),
            stats: StatsServiceImpl::new(user_repository),
            tiers,
        }
    }

    impl Fixture {
        async fn player(&self, nickname: &str, position: &str) -> String {
            self.users
                .signup(
                    SignupForm {
                        email: Some(format!("{}@example.com", nickname)),
                        nickname: Some(nickname.to_string()),
                        valorant_nickname: Some(format!("{}#KR", nickname)),
                        password: Some("password123".to_string()),
                        preferred_position: Some(position.to_string()),
                    },
                    Role::User,
                )
                .await
                .unwrap()
                .id
        }

        async fn play(
            &self,
            user_id: &str,
            agent: &str,
            kills: i64,
            deaths: i64,
            rank: Option<i64>,
        ) {
            self.stats
                .record_match(MatchReportRequest {
                    user_id: Some(user_id.to_string()),
                    agent_name: Some(agent.to_string()),
                    kills: Some(kills),
                    deaths: Some(deaths),
                    assists: Some(0),
                    is_win: Some(true),
                    rank,
                    ..Default::default()
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_overall_ranking() {
        let f = fixture().await;
        let a = f.player("alpha", "타격대").await;
        let b = f.player("bravo", "감시자").await;
        f.player("charlie", "전략가").await;
        f.play(&a, "Jett", 10, 10, None).await;
        f.play(&b, "Sage", 5, 0, None).await;

        let Rankings::Overall(rows) = f.rankings.get_rankings(RankingType::Overall).await.unwrap()
        else {
            panic!("Expected overall rankings");
        };
        let names: Vec<&str> = rows.iter().map(|r| r.nickname.as_str()).collect();
        assert_eq!(names, vec!["bravo", "alpha", "charlie"]);
        assert_eq!(rows[0].kda, Ratio::Perfect);
        assert_eq!(rows[2].most_used_agent, "없음");
    }

    #[tokio::test]
    async fn test_tier_ranking_uses_membership() {
        let f = fixture().await;
        let a = f.player("alpha", "타격대").await;
        let b = f.player("bravo", "타격대").await;
        f.tiers.assign(&b, "2티어").await.unwrap();
        f.play(&a, "Jett", 10, 5, Some(1)).await;

        let Rankings::Tier(groups) = f.rankings.get_rankings(RankingType::Tier).await.unwrap()
        else {
            panic!("Expected tier rankings");
        };
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].tier, "2티어");
        assert_eq!(groups[0].users[0].nickname, "bravo");
        assert_eq!(groups[1].tier, UNASSIGNED_TIER);
        assert_eq!(groups[1].users[0].league_point, 10);
    }

    #[tokio::test]
    async fn test_top_players_limit() {
        let f = fixture().await;
        for (i, name) in ["one", "two", "three"].iter().enumerate() {
            let id = f.player(name, "척후대").await;
            f.play(&id, "Sova", 10, 1, Some(i as i64 + 1)).await;
        }
        let rows = f.rankings.get_top_players(2).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].nickname, "one");
        assert_eq!(rows[0].league_point, 10);
        assert_eq!(rows[0].total_games, 1);
        assert_eq!(rows[1].nickname, "two");
    }
}
