use std::sync::Arc;

use chrono::Utc;
use log::info;
use serde::Deserialize;
use vtf_core::{
    AgentCounters, AgentStat, MatchPlacement, MatchResult, correct_agent_stat, league_points,
    record_match,
};

use crate::{
    ServiceError, ServiceResult,
    user::{ArcUserRepository, UserId},
    util::MissingFields,
};

/// A single match report as submitted by an administrator.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReportRequest {
    pub user_id: Option<String>,
    pub agent_name: Option<String>,
    pub kills: Option<i64>,
    pub deaths: Option<i64>,
    pub assists: Option<i64>,
    pub is_win: Option<bool>,
    pub rank: Option<i64>,
    #[serde(rename = "isGameMVP")]
    pub is_game_mvp: Option<bool>,
    #[serde(rename = "isTeamMVP")]
    pub is_team_mvp: Option<bool>,
}

fn count(name: &str, value: i64, invalid: &mut Vec<String>) -> u32 {
    match u32::try_from(value) {
        Ok(value) => value,
        Err(_) => {
            invalid.push(name.to_string());
            0
        }
    }
}

impl MatchReportRequest {
    pub fn validate(self) -> ServiceResult<(UserId, MatchResult)> {
        let mut missing = MissingFields::new();
        missing.check_str("userId", &self.user_id);
        missing.check_str("agentName", &self.agent_name);
        missing.check("kills", &self.kills);
        missing.check("deaths", &self.deaths);
        missing.check("assists", &self.assists);
        missing.check("isWin", &self.is_win);
        missing.into_result()?;

        let (
            Some(user_id),
            Some(agent_name),
            Some(kills),
            Some(deaths),
            Some(assists),
            Some(is_win),
        ) = (
            self.user_id,
            self.agent_name,
            self.kills,
            self.deaths,
            self.assists,
            self.is_win,
        )
        else {
            return ServiceError::bad_request("Missing required fields");
        };

        let mut invalid = Vec::new();
        let kills = count("kills", kills, &mut invalid);
        let deaths = count("deaths", deaths, &mut invalid);
        let assists = count("assists", assists, &mut invalid);
        let placement = match self.rank {
            Some(rank) => {
                let placement = MatchPlacement {
                    rank: u8::try_from(rank).unwrap_or(0),
                    is_game_mvp: self.is_game_mvp.unwrap_or(false),
                    is_team_mvp: self.is_team_mvp.unwrap_or(false),
                };
                if !placement.is_valid() {
                    invalid.push("rank".to_string());
                }
                Some(placement)
            }
            None => None,
        };
        if !invalid.is_empty() {
            return ServiceError::validation("Invalid field values", invalid);
        }

        Ok((
            user_id.trim().to_string(),
            MatchResult {
                agent_name: agent_name.trim().to_string(),
                kills,
                deaths,
                assists,
                is_win,
                placement,
            },
        ))
    }
}

/// Absolute counters for one agent, replacing whatever was accumulated.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatCorrection {
    pub agent_name: Option<String>,
    pub play_count: Option<i64>,
    pub kills: Option<i64>,
    pub deaths: Option<i64>,
    pub assists: Option<i64>,
    pub wins: Option<i64>,
    pub losses: Option<i64>,
}

impl AgentStatCorrection {
    pub fn validate(self) -> ServiceResult<AgentCounters> {
        let mut missing = MissingFields::new();
        missing.check_str("agentName", &self.agent_name);
        missing.check("playCount", &self.play_count);
        missing.check("kills", &self.kills);
        missing.check("deaths", &self.deaths);
        missing.check("assists", &self.assists);
        missing.check("wins", &self.wins);
        missing.check("losses", &self.losses);
        missing.into_result()?;

        let (
            Some(agent_name),
            Some(play_count),
            Some(kills),
            Some(deaths),
            Some(assists),
            Some(wins),
            Some(losses),
        ) = (
            self.agent_name,
            self.play_count,
            self.kills,
            self.deaths,
            self.assists,
            self.wins,
            self.losses,
        )
        else {
            return ServiceError::bad_request("Missing required fields");
        };

        let mut invalid = Vec::new();
        let counters = AgentCounters {
            agent_name: agent_name.trim().to_string(),
            play_count: count("playCount", play_count, &mut invalid),
            kills: count("kills", kills, &mut invalid),
            deaths: count("deaths", deaths, &mut invalid),
            assists: count("assists", assists, &mut invalid),
            wins: count("wins", wins, &mut invalid),
            losses: count("losses", losses, &mut invalid),
        };
        if !invalid.is_empty() {
            return ServiceError::validation("Invalid field values", invalid);
        }
        Ok(counters)
    }
}

pub type ArcStatsService = Arc<Box<dyn StatsService + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait StatsService {
    /// Folds a match into the player's stats and returns the updated agent record.
    async fn record_match(&self, report: MatchReportRequest) -> ServiceResult<AgentStat>;
    async fn get_agent_stats(&self, nickname: &str) -> ServiceResult<Vec<AgentStat>>;
    /// Overwrites one agent's counters and recomputes the league points.
    async fn correct_agent_stats(
        &self,
        nickname: &str,
        correction: AgentStatCorrection,
    ) -> ServiceResult<AgentStat>;
}

pub struct StatsServiceImpl {
    user_repository: ArcUserRepository,
}

impl StatsServiceImpl {
    pub fn new(user_repository: ArcUserRepository) -> Self {
        Self { user_repository }
    }
}

#[async_trait::async_trait]
impl StatsService for StatsServiceImpl {
    async fn record_match(&self, report: MatchReportRequest) -> ServiceResult<AgentStat> {
        let (user_id, result) = report.validate()?;
        let Some(user) = self.user_repository.get_user_by_id(&user_id).await? else {
            return ServiceError::not_found("User not found");
        };

        // Read-modify-write without isolation: concurrent reports for the
        // same user may overwrite each other.
        let mut agent_stats = user.agent_stats;
        let match_id = uuid::Uuid::new_v4().to_string();
        let index = record_match(&mut agent_stats, &result, match_id, Utc::now());
        let league_point = league_points(&agent_stats);
        self.user_repository
            .update_agent_stats(&user.id, &agent_stats, league_point)
            .await?;

        info!(
            "Recorded {} match for {} ({} LP)",
            result.agent_name, user.nickname, league_point
        );
        Ok(agent_stats.swap_remove(index))
    }

    async fn get_agent_stats(&self, nickname: &str) -> ServiceResult<Vec<AgentStat>> {
        match self
            .user_repository
            .get_user_by_nickname(nickname.trim())
            .await?
        {
            Some(user) => Ok(user.agent_stats),
            None => ServiceError::not_found("User not found"),
        }
    }

    async fn correct_agent_stats(
        &self,
        nickname: &str,
        correction: AgentStatCorrection,
    ) -> ServiceResult<AgentStat> {
        let counters = correction.validate()?;
        let Some(user) = self
            .user_repository
            .get_user_by_nickname(nickname.trim())
            .await?
        else {
            return ServiceError::not_found("User not found");
        };

        let mut agent_stats = user.agent_stats;
        let index = correct_agent_stat(&mut agent_stats, &counters);
        let league_point = league_points(&agent_stats);
        self.user_repository
            .update_agent_stats(&user.id, &agent_stats, league_point)
            .await?;

        info!(
            "Corrected {} stats for {} ({} LP)",
            counters.agent_name, user.nickname, league_point
        );
        Ok(agent_stats.swap_remove(index))
    }
}

#[cfg(test)]
mod tests {
    use vtf_core::Ratio;

    use crate::{
        jwt::MockJwtService,
        memory::InMemoryUserRepository,
        user::{Role, SignupForm, UserService, UserServiceImpl},
    };

    use super::*;

    fn report(
        user_id: &str,
        agent: &str,
        kills: i64,
        deaths: i64,
        assists: i64,
        is_win: bool,
    ) -> MatchReportRequest {
        MatchReportRequest {
            user_id: Some(user_id.to_string()),
            agent_name: Some(agent.to_string()),
            kills: Some(kills),
            deaths: Some(deaths),
            assists: Some(assists),
            is_win: Some(is_win),
            ..Default::default()
        }
    }

    async fn setup() -> (StatsServiceImpl, ArcUserRepository, String) {
        let user_repository: ArcUserRepository =
            Arc::new(Box::new(InMemoryUserRepository::default()));
        let user_service =
            UserServiceImpl::new(user_repository.clone(), Arc::new(Box::new(MockJwtService)));
        let user = user_service
            .signup(
                SignupForm {
                    email: Some("p@example.com".to_string()),
                    nickname: Some("player".to_string()),
                    valorant_nickname: Some("Player#KR".to_string()),
                    password: Some("password123".to_string()),
                    preferred_position: Some("타격대".to_string()),
                },
                Role::User,
            )
            .await
            .unwrap();
        (
            StatsServiceImpl::new(user_repository.clone()),
            user_repository,
            user.id,
        )
    }

    #[test]
    fn test_validate_lists_missing_fields() {
        let request = MatchReportRequest {
            agent_name: Some("Jett".to_string()),
            kills: Some(3),
            ..Default::default()
        };
        match request.validate() {
            Err(ServiceError::Validation { fields, .. }) => {
                assert_eq!(fields, vec!["userId", "deaths", "assists", "isWin"])
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_negative_and_bad_rank() {
        let mut request = report("u", "Jett", -1, 2, 3, true);
        request.rank = Some(11);
        match request.validate() {
            Err(ServiceError::Validation { fields, .. }) => {
                assert_eq!(fields, vec!["kills", "rank"])
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_first_match_creates_record() {
        let (service, users, user_id) = setup().await;
        let stat = service
            .record_match(report(&user_id, "Jett", 20, 10, 5, true))
            .await
            .unwrap();
        assert_eq!(
            (stat.play_count, stat.kills, stat.deaths, stat.assists, stat.wins, stat.losses),
            (1, 20, 10, 5, 1, 0)
        );
        assert_eq!(stat.kda().to_string(), "2.50");
        assert!(stat.match_stats.is_empty());

        let user = users.get_user_by_id(&user_id).await.unwrap().unwrap();
        assert_eq!(user.agent_stats.len(), 1);
        assert_eq!(user.league_point, 0);
    }

    #[tokio::test]
    async fn test_ranked_match_adds_league_points() {
        let (service, users, user_id) = setup().await;
        let mut first = report(&user_id, "Jett", 10, 0, 2, true);
        first.rank = Some(1);
        first.is_game_mvp = Some(true);
        let stat = service.record_match(first).await.unwrap();
        assert_eq!(stat.match_stats.len(), 1);
        assert_eq!(stat.match_stats[0].points, 12);
        assert_eq!(stat.kda(), Ratio::Perfect);

        let mut second = report(&user_id, "Sage", 1, 5, 10, false);
        second.rank = Some(7);
        second.is_team_mvp = Some(true);
        service.record_match(second).await.unwrap();

        let user = users.get_user_by_id(&user_id).await.unwrap().unwrap();
        assert_eq!(user.league_point, 12 + 6);
        let sage = &user.agent_stats[1];
        assert_eq!((sage.play_count, sage.wins, sage.losses), (1, 0, 1));
    }

    #[tokio::test]
    async fn test_repeat_agent_accumulates() {
        let (service, _, user_id) = setup().await;
        service
            .record_match(report(&user_id, "Omen", 5, 5, 5, true))
            .await
            .unwrap();
        let stat = service
            .record_match(report(&user_id, "Omen", 7, 3, 1, false))
            .await
            .unwrap();
        assert_eq!(stat.play_count, 2);
        assert_eq!(stat.wins + stat.losses, 2);
        assert_eq!((stat.kills, stat.deaths, stat.assists), (12, 8, 6));

        let stats = service.get_agent_stats("player").await.unwrap();
        assert_eq!(stats.len(), 1);
    }

    fn correction(agent: &str, play_count: i64, wins: i64, losses: i64) -> AgentStatCorrection {
        AgentStatCorrection {
            agent_name: Some(agent.to_string()),
            play_count: Some(play_count),
            kills: Some(10),
            deaths: Some(5),
            assists: Some(3),
            wins: Some(wins),
            losses: Some(losses),
        }
    }

    #[tokio::test]
    async fn test_correction_overwrites_counters() {
        let (service, users, user_id) = setup().await;
        let mut ranked = report(&user_id, "Jett", 20, 10, 5, true);
        ranked.rank = Some(2);
        service.record_match(ranked.clone()).await.unwrap();
        service.record_match(ranked).await.unwrap();

        let stat = service
            .correct_agent_stats("player", correction("Jett", 1, 1, 0))
            .await
            .unwrap();
        assert_eq!(
            (stat.play_count, stat.kills, stat.deaths, stat.assists, stat.wins, stat.losses),
            (1, 10, 5, 3, 1, 0)
        );
        assert_eq!(stat.match_stats.len(), 2);

        let user = users.get_user_by_id(&user_id).await.unwrap().unwrap();
        assert_eq!(user.league_point, 18);
        assert_eq!(user.agent_stats[0].kills, 10);
    }

    #[tokio::test]
    async fn test_correction_creates_missing_agent() {
        let (service, users, user_id) = setup().await;
        service
            .correct_agent_stats("player", correction("Viper", 4, 3, 1))
            .await
            .unwrap();
        let user = users.get_user_by_id(&user_id).await.unwrap().unwrap();
        assert_eq!(user.agent_stats.len(), 1);
        assert_eq!(user.agent_stats[0].agent_name, "Viper");
        assert_eq!(user.league_point, 0);
    }

    #[tokio::test]
    async fn test_correction_validation() {
        let (service, _, _) = setup().await;
        let partial = AgentStatCorrection {
            agent_name: Some("Jett".to_string()),
            kills: Some(1),
            ..Default::default()
        };
        match service.correct_agent_stats("player", partial).await {
            Err(ServiceError::Validation { fields, .. }) => assert_eq!(
                fields,
                vec!["playCount", "deaths", "assists", "wins", "losses"]
            ),
            other => panic!("Expected validation error, got {:?}", other),
        }

        match service
            .correct_agent_stats("player", correction("Jett", -2, 0, -1))
            .await
        {
            Err(ServiceError::Validation { fields, .. }) => {
                assert_eq!(fields, vec!["playCount", "losses"])
            }
            other => panic!("Expected validation error, got {:?}", other),
        }

        assert!(matches!(
            service
                .correct_agent_stats("ghost", correction("Jett", 1, 1, 0))
                .await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let (service, _, _) = setup().await;
        assert!(matches!(
            service.record_match(report("ghost", "Jett", 1, 1, 1, true)).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.get_agent_stats("ghost").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
