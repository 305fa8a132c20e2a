use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use vtf_core::ranking::{RankingType, Rankings};
use vtf_server_domain::{ServiceError, app::AppState};

use crate::ApiError;

#[derive(Deserialize)]
pub struct RankingQuery {
    #[serde(rename = "type")]
    ranking_type: Option<String>,
}

#[derive(Serialize)]
pub struct RankingsResponse {
    rankings: Rankings,
}

pub async fn get_rankings(
    State(app): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> Result<Json<RankingsResponse>, ApiError> {
    let ranking_type = query
        .ranking_type
        .as_deref()
        .unwrap_or_default()
        .parse::<RankingType>()
        .map_err(ServiceError::BadRequest)?;
    Ok(Json(RankingsResponse {
        rankings: app.ranking_service.get_rankings(ranking_type).await?,
    }))
}
