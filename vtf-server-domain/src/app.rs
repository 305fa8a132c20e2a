use std::sync::Arc;

use crate::{
    ServiceResult,
    email::ArcEmailService,
    jwt::ArcJwtService,
    ranking::{ArcRankingService, RankingServiceImpl},
    stats::{ArcStatsService, StatsServiceImpl},
    tier::{ArcTierRepository, ArcTierService, TierServiceImpl},
    user::{ArcUserRepository, ArcUserService, UserServiceImpl},
    verification::{ArcCodeStore, ArcVerificationService, VerificationServiceImpl},
};

#[derive(Clone)]
pub struct AppState {
    pub user_service: ArcUserService,
    pub verification_service: ArcVerificationService,
    pub stats_service: ArcStatsService,
    pub ranking_service: ArcRankingService,
    pub tier_service: ArcTierService,
    pub jwt_service: ArcJwtService,
}

impl AppState {
    pub async fn start(&self) -> ServiceResult<()> {
        self.tier_service.ensure_default_tiers().await
    }
}

pub fn construct_app(
    user_repository: ArcUserRepository,
    tier_repository: ArcTierRepository,
    code_store: ArcCodeStore,
    jwt_service: ArcJwtService,
    email_service: ArcEmailService,
) -> AppState {
    let user_service: ArcUserService = Arc::new(Box::new(UserServiceImpl::new(
        user_repository.clone(),
        jwt_service.clone(),
    )));

    let verification_service: ArcVerificationService =
        Arc::new(Box::new(VerificationServiceImpl::new(email_service, code_store)));

    let stats_service: ArcStatsService =
        Arc::new(Box::new(StatsServiceImpl::new(user_repository.clone())));

    let ranking_service: ArcRankingService = Arc::new(Box::new(RankingServiceImpl::new(
        user_repository.clone(),
        tier_repository.clone(),
    )));

    let tier_service: ArcTierService = Arc::new(Box::new(TierServiceImpl::new(
        tier_repository,
        user_repository,
    )));

    AppState {
        user_service,
        verification_service,
        stats_service,
        ranking_service,
        tier_service,
        jwt_service,
    }
}
