use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use vtf_server_domain::{
    ServiceError,
    app::AppState,
    user::{Role, SignupForm},
    util::MissingFields,
};

use crate::{ApiError, http::users::UserResponse, jwt::AdminAuth};

#[derive(Deserialize)]
pub struct SendVerificationRequest {
    email: Option<String>,
}

pub async fn send_verification(
    State(app): State<AppState>,
    Json(request): Json<SendVerificationRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut missing = MissingFields::new();
    missing.check_str("email", &request.email);
    missing.into_result()?;

    let email = request.email.unwrap_or_default();
    app.verification_service
        .send_verification_code(&email)
        .await?;
    Ok(Json(json!({ "message": "Verification code sent" })))
}

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    email: Option<String>,
    code: Option<String>,
}

pub async fn verify_code(
    State(app): State<AppState>,
    Json(request): Json<VerifyCodeRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut missing = MissingFields::new();
    missing.check_str("email", &request.email);
    missing.check_str("code", &request.code);
    missing.into_result()?;

    let email = request.email.unwrap_or_default();
    let code = request.code.unwrap_or_default();
    if !app.verification_service.verify_code(&email, &code).await? {
        return Err(ServiceError::BadRequest("Invalid or expired code".to_string()).into());
    }
    Ok(Json(json!({ "verified": true })))
}

#[derive(Serialize)]
pub struct SignupResponse {
    message: &'static str,
    user: UserResponse,
}

pub async fn signup(
    State(app): State<AppState>,
    Json(form): Json<SignupForm>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let user = app.user_service.signup(form, Role::User).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Signup successful",
            user: UserResponse::from(&user),
        }),
    ))
}

pub async fn create_admin(
    AdminAuth(claims): AdminAuth,
    State(app): State<AppState>,
    Json(form): Json<SignupForm>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let user = app.user_service.signup(form, Role::Admin).await?;
    log::info!("Admin {} created by {}", user.nickname, claims.nickname);
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Admin account created",
            user: UserResponse::from(&user),
        }),
    ))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    user: UserResponse,
    token: String,
}

pub async fn login(
    State(app): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut missing = MissingFields::new();
    missing.check_str("email", &request.email);
    missing.check_str("password", &request.password);
    missing.into_result()?;

    let email = request.email.unwrap_or_default();
    let password = request.password.unwrap_or_default();
    let (user, token) = app.user_service.login(&email, &password).await?;
    Ok(Json(LoginResponse {
        user: UserResponse::from(&user),
        token,
    }))
}
