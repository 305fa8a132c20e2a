use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use vtf_server_domain::{
    ServiceError,
    app::AppState,
    tier::{Tier, TierAction},
    util::MissingFields,
};

use crate::{ApiError, jwt::AdminAuth};

#[derive(Serialize)]
pub struct TiersResponse {
    tiers: Vec<Tier>,
}

pub async fn get_all(State(app): State<AppState>) -> Result<Json<TiersResponse>, ApiError> {
    Ok(Json(TiersResponse {
        tiers: app.tier_service.get_tiers().await?,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierUpdateRequest {
    user_id: Option<String>,
    tier_name: Option<String>,
    action: Option<TierAction>,
}

pub async fn update(
    AdminAuth(_): AdminAuth,
    State(app): State<AppState>,
    Json(request): Json<TierUpdateRequest>,
) -> Result<Json<TiersResponse>, ApiError> {
    let mut missing = MissingFields::new();
    missing.check_str("userId", &request.user_id);
    missing.check_str("tierName", &request.tier_name);
    missing.check("action", &request.action);
    missing.into_result()?;

    let (Some(user_id), Some(tier_name), Some(action)) =
        (request.user_id, request.tier_name, request.action)
    else {
        return Err(ServiceError::BadRequest("Missing required fields".to_string()).into());
    };

    let tiers = match action {
        TierAction::Add => app.tier_service.assign(&user_id, &tier_name).await?,
        TierAction::Remove => app.tier_service.remove(&user_id, &tier_name).await?,
    };
    Ok(Json(TiersResponse { tiers }))
}
