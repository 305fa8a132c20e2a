use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    ServiceError, ServiceResult,
    user::{Role, UserId},
};

/// Identity carried inside an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthClaims {
    pub user_id: UserId,
    pub email: String,
    pub nickname: String,
    pub role: Role,
}

impl AuthClaims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub type ArcJwtService = Arc<Box<dyn JwtService + Send + Sync>>;

pub trait JwtService {
    fn generate_jwt(&self, claims: &AuthClaims) -> ServiceResult<String>;
    fn validate_jwt(&self, token: &str) -> ServiceResult<AuthClaims>;
}

/// Encodes the claims as a pipe-separated string, unsigned.
#[derive(Default, Clone)]
pub struct MockJwtService;

impl JwtService for MockJwtService {
    fn generate_jwt(&self, claims: &AuthClaims) -> ServiceResult<String> {
        Ok(format!(
            "{}|{}|{}|{}",
            claims.user_id,
            claims.email,
            claims.nickname,
            claims.role.as_str()
        ))
    }

    fn validate_jwt(&self, token: &str) -> ServiceResult<AuthClaims> {
        let parts: Vec<&str> = token.split('|').collect();
        let [user_id, email, nickname, role] = parts.as_slice() else {
            return ServiceError::unauthorized("Invalid token");
        };
        let role = role
            .parse::<Role>()
            .map_err(|_| ServiceError::Unauthorized("Invalid token".into()))?;
        Ok(AuthClaims {
            user_id: user_id.to_string(),
            email: email.to_string(),
            nickname: nickname.to_string(),
            role,
        })
    }
}
