use std::sync::LazyLock;

use axum::{RequestPartsExt, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vtf_server_domain::{
    ServiceError, ServiceResult,
    app::AppState,
    jwt::{AuthClaims, JwtService},
    user::Role,
};

use crate::ApiError;

const TOKEN_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    user_id: String,
    email: String,
    nickname: String,
    role: Role,
    exp: usize,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

static KEYS: LazyLock<Keys> = LazyLock::new(|| {
    let secret = read_or_generate_secret();
    Keys::new(&secret)
});

fn read_or_generate_secret() -> Vec<u8> {
    if let Ok(secret) = std::env::var("VTF_JWT_SECRET") {
        secret.as_bytes().to_vec()
    } else {
        info!("JWT secret not found, generating a random one...");
        Uuid::new_v4().as_bytes().to_vec()
    }
}

/// HS256 tokens signed with `VTF_JWT_SECRET`.
pub struct JwtServiceImpl;

impl JwtService for JwtServiceImpl {
    fn generate_jwt(&self, claims: &AuthClaims) -> ServiceResult<String> {
        let claims = Claims {
            user_id: claims.user_id.clone(),
            email: claims.email.clone(),
            nickname: claims.nickname.clone(),
            role: claims.role,
            exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_LIFETIME_DAYS)).timestamp()
                as usize,
        };
        encode(&Header::default(), &claims, &KEYS.encoding)
            .map_err(|e| ServiceError::Internal(format!("Failed to encode token: {}", e)))
    }

    fn validate_jwt(&self, token: &str) -> ServiceResult<AuthClaims> {
        match decode::<Claims>(token, &KEYS.decoding, &Validation::default()) {
            Ok(data) => Ok(AuthClaims {
                user_id: data.claims.user_id,
                email: data.claims.email,
                nickname: data.claims.nickname,
                role: data.claims.role,
            }),
            Err(_) => ServiceError::unauthorized("Invalid token"),
        }
    }
}

/// Any holder of a valid bearer token.
pub struct Auth(pub AuthClaims);

impl FromRequestParts<AppState> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        app: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ServiceError::Unauthorized("Missing token".to_string()))?;
        let claims = app.jwt_service.validate_jwt(bearer.token())?;
        Ok(Auth(claims))
    }
}

/// A bearer token whose role is ADMIN.
pub struct AdminAuth(pub AuthClaims);

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        app: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Auth(claims) = Auth::from_request_parts(parts, app).await?;
        if !claims.is_admin() {
            return Err(ServiceError::Forbidden("Admin role required".to_string()).into());
        }
        Ok(AdminAuth(claims))
    }
}
