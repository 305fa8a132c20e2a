use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use vtf_core::{
    AgentStat, NO_AGENT, Position, Ratio, StatTotals, WinRate, most_used_agent,
    ranking::OverallRow,
};
use vtf_server_domain::{
    ServiceError,
    app::AppState,
    stats::{AgentStatCorrection, MatchReportRequest},
    user::{ProfileUpdate, Role, User},
};

use crate::{
    ApiError,
    jwt::{AdminAuth, Auth},
};

const DEFAULT_TOP_LIMIT: usize = 10;

/// A user as exposed over the API, without credentials.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    id: String,
    email: String,
    nickname: String,
    valorant_nickname: String,
    preferred_position: Position,
    role: Role,
    tier: String,
    agent_stats: Vec<AgentStat>,
    league_point: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            valorant_nickname: user.valorant_nickname.clone(),
            preferred_position: user.preferred_position,
            role: user.role,
            tier: user.tier.clone(),
            agent_stats: user.agent_stats.clone(),
            league_point: user.league_point,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    user: UserResponse,
    total_games: u32,
    total_wins: u32,
    total_losses: u32,
    total_kills: u32,
    total_deaths: u32,
    total_assists: u32,
    win_rate: WinRate,
    kda: Ratio,
    most_used_agent: String,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        let totals = StatTotals::of(&user.agent_stats);
        Self {
            user: UserResponse::from(user),
            total_games: totals.games(),
            total_wins: totals.wins,
            total_losses: totals.losses,
            total_kills: totals.kills,
            total_deaths: totals.deaths,
            total_assists: totals.assists,
            win_rate: totals.win_rate(),
            kda: totals.kda(),
            most_used_agent: most_used_agent(&user.agent_stats)
                .map(|stat| stat.agent_name.clone())
                .unwrap_or_else(|| NO_AGENT.to_string()),
        }
    }
}

#[derive(Serialize)]
pub struct UsersResponse {
    users: Vec<UserResponse>,
}

pub async fn get_all(State(app): State<AppState>) -> Result<Json<UsersResponse>, ApiError> {
    let users = app.user_service.get_users().await?;
    Ok(Json(UsersResponse {
        users: users.iter().map(UserResponse::from).collect(),
    }))
}

pub async fn get_me(
    Auth(claims): Auth,
    State(app): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = app.user_service.get_user(&claims.user_id).await?;
    Ok(Json(UserResponse::from(&user)))
}

#[derive(Deserialize)]
pub struct TopQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPlayersResponse {
    top_players: Vec<OverallRow>,
}

pub async fn get_top(
    State(app): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<TopPlayersResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    Ok(Json(TopPlayersResponse {
        top_players: app.ranking_service.get_top_players(limit).await?,
    }))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    nickname: Option<String>,
}

pub async fn search(
    State(app): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Some(nickname) = query.nickname.filter(|n| !n.trim().is_empty()) else {
        return Err(ServiceError::BadRequest("Nickname is required".to_string()).into());
    };
    let user = app.user_service.get_user_by_nickname(&nickname).await?;
    Ok(Json(ProfileResponse::from(&user)))
}

pub async fn get_by_nickname(
    Path(nickname): Path<String>,
    State(app): State<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = app.user_service.get_user_by_nickname(&nickname).await?;
    Ok(Json(ProfileResponse::from(&user)))
}

pub async fn get_agent_stats(
    Path(nickname): Path<String>,
    State(app): State<AppState>,
) -> Result<Json<Vec<AgentStat>>, ApiError> {
    Ok(Json(app.stats_service.get_agent_stats(&nickname).await?))
}

pub async fn update_user(
    AdminAuth(_): AdminAuth,
    Path(nickname): Path<String>,
    State(app): State<AppState>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = app.user_service.update_profile(&nickname, update).await?;
    Ok(Json(UserResponse::from(&user)))
}

pub async fn delete_user(
    AdminAuth(_): AdminAuth,
    Path(nickname): Path<String>,
    State(app): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    app.user_service.delete_user(&nickname).await?;
    Ok(Json(json!({ "message": "User deleted" })))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatResponse {
    message: &'static str,
    agent_stat: AgentStat,
}

pub async fn record_match(
    AdminAuth(_): AdminAuth,
    State(app): State<AppState>,
    Json(report): Json<MatchReportRequest>,
) -> Result<Json<AgentStatResponse>, ApiError> {
    let agent_stat = app.stats_service.record_match(report).await?;
    Ok(Json(AgentStatResponse {
        message: "Agent stats updated",
        agent_stat,
    }))
}

pub async fn correct_agent_stats(
    AdminAuth(_): AdminAuth,
    Path(nickname): Path<String>,
    State(app): State<AppState>,
    Json(correction): Json<AgentStatCorrection>,
) -> Result<Json<AgentStatResponse>, ApiError> {
    let agent_stat = app
        .stats_service
        .correct_agent_stats(&nickname, correction)
        .await?;
    Ok(Json(AgentStatResponse {
        message: "Agent stats corrected",
        agent_stat,
    }))
}
