use std::{fmt, str::FromStr, sync::Arc};

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use vtf_core::{AgentStat, Position, UNASSIGNED_TIER};

use crate::{
    ServiceError, ServiceResult,
    jwt::{ArcJwtService, AuthClaims},
    util::{MissingFields, validate_email, validate_nickname, validate_password},
};

pub type UserId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub nickname: String,
    pub valorant_nickname: String,
    pub password_hash: String,
    pub preferred_position: Position,
    pub role: Role,
    pub tier: String,
    pub agent_stats: Vec<AgentStat>,
    pub league_point: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn claims(&self) -> AuthClaims {
        AuthClaims {
            user_id: self.id.clone(),
            email: self.email.clone(),
            nickname: self.nickname.clone(),
            role: self.role,
        }
    }
}

/// Registration payload as received from clients.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub valorant_nickname: Option<String>,
    pub password: Option<String>,
    pub preferred_position: Option<String>,
}

struct ValidSignup {
    email: String,
    nickname: String,
    valorant_nickname: String,
    password: String,
    preferred_position: Position,
}

impl SignupForm {
    fn validate(self) -> ServiceResult<ValidSignup> {
        let mut missing = MissingFields::new();
        missing.check_str("email", &self.email);
        missing.check_str("nickname", &self.nickname);
        missing.check_str("valorantNickname", &self.valorant_nickname);
        missing.check_str("password", &self.password);
        missing.check_str("preferredPosition", &self.preferred_position);
        missing.into_result()?;

        let (
            Some(email),
            Some(nickname),
            Some(valorant_nickname),
            Some(password),
            Some(position),
        ) = (
            self.email,
            self.nickname,
            self.valorant_nickname,
            self.password,
            self.preferred_position,
        )
        else {
            return ServiceError::bad_request("Missing required fields");
        };

        let preferred_position = position
            .parse::<Position>()
            .map_err(|_| ServiceError::Validation {
                message: format!("Unknown position: {}", position),
                fields: vec!["preferredPosition".to_string()],
            })?;
        validate_password(&password)?;

        Ok(ValidSignup {
            email: validate_email(&email)?,
            nickname: validate_nickname(&nickname)?,
            valorant_nickname: valorant_nickname.trim().to_string(),
            password,
            preferred_position,
        })
    }
}

/// Admin edit of a player's public profile. Absent fields stay unchanged.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub nickname: Option<String>,
    pub valorant_nickname: Option<String>,
    pub preferred_position: Option<String>,
}

pub type ArcUserRepository = Arc<Box<dyn UserRepository + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait UserRepository {
    async fn get_user_by_id(&self, id: &str) -> ServiceResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> ServiceResult<Option<User>>;
    async fn get_user_by_nickname(&self, nickname: &str) -> ServiceResult<Option<User>>;
    async fn get_user_by_valorant_nickname(&self, name: &str) -> ServiceResult<Option<User>>;
    async fn create_user(&self, user: &User) -> ServiceResult<()>;
    /// All users in creation order.
    async fn get_users(&self) -> ServiceResult<Vec<User>>;
    /// Replaces the whole agent stat list of a user in a single write.
    async fn update_agent_stats(
        &self,
        id: &str,
        agent_stats: &[AgentStat],
        league_point: u32,
    ) -> ServiceResult<()>;
    async fn update_tier(&self, id: &str, tier: &str) -> ServiceResult<()>;
    /// Writes the nickname, valorant nickname and preferred position of `user`.
    /// The nickname stored with its tier membership follows.
    async fn update_profile(&self, user: &User) -> ServiceResult<()>;
    /// Deletes the user together with its tier membership.
    async fn delete_user(&self, id: &str) -> ServiceResult<()>;
}

pub type ArcUserService = Arc<Box<dyn UserService + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait UserService {
    async fn signup(&self, form: SignupForm, role: Role) -> ServiceResult<User>;
    async fn login(&self, email: &str, password: &str) -> ServiceResult<(User, String)>;
    async fn get_user(&self, id: &str) -> ServiceResult<User>;
    async fn get_user_by_nickname(&self, nickname: &str) -> ServiceResult<User>;
    async fn get_users(&self) -> ServiceResult<Vec<User>>;
    async fn update_profile(&self, nickname: &str, update: ProfileUpdate) -> ServiceResult<User>;
    async fn delete_user(&self, nickname: &str) -> ServiceResult<()>;
}

pub struct UserServiceImpl {
    user_repository: ArcUserRepository,
    jwt_service: ArcJwtService,
}

impl UserServiceImpl {
    pub fn new(user_repository: ArcUserRepository, jwt_service: ArcJwtService) -> Self {
        Self {
            user_repository,
            jwt_service,
        }
    }

    async fn ensure_unique(&self, signup: &ValidSignup) -> ServiceResult<()> {
        if self
            .user_repository
            .get_user_by_email(&signup.email)
            .await?
            .is_some()
        {
            return ServiceError::bad_request("Email already in use");
        }
        if self
            .user_repository
            .get_user_by_nickname(&signup.nickname)
            .await?
            .is_some()
        {
            return ServiceError::bad_request("Nickname already in use");
        }
        if self
            .user_repository
            .get_user_by_valorant_nickname(&signup.valorant_nickname)
            .await?
            .is_some()
        {
            return ServiceError::bad_request("Valorant nickname already in use");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserService for UserServiceImpl {
    async fn signup(&self, form: SignupForm, role: Role) -> ServiceResult<User> {
        let signup = form.validate()?;
        self.ensure_unique(&signup).await?;

        let password_hash = bcrypt::hash(&signup.password, bcrypt::DEFAULT_COST)
            .map_err(|e| ServiceError::Internal(format!("Failed to hash password: {}", e)))?;
        let now = Utc::now();
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: signup.email,
            nickname: signup.nickname,
            valorant_nickname: signup.valorant_nickname,
            password_hash,
            preferred_position: signup.preferred_position,
            role,
            tier: UNASSIGNED_TIER.to_string(),
            agent_stats: Vec::new(),
            league_point: 0,
            created_at: now,
            updated_at: now,
        };
        self.user_repository.create_user(&user).await?;
        info!(
            "Registered {} {} ({})",
            user.role, user.nickname, user.email
        );
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> ServiceResult<(User, String)> {
        const LOGIN_FAILED: &str = "Invalid email or password";
        let Some(user) = self.user_repository.get_user_by_email(email.trim()).await? else {
            warn!("Login attempt for unknown email {}", email);
            return ServiceError::unauthorized(LOGIN_FAILED);
        };
        let valid = bcrypt::verify(password, &user.password_hash)
            .map_err(|e| ServiceError::Internal(format!("Failed to verify password: {}", e)))?;
        if !valid {
            warn!("Failed login for user {}", user.nickname);
            return ServiceError::unauthorized(LOGIN_FAILED);
        }
        let token = self.jwt_service.generate_jwt(&user.claims())?;
        info!("User {} logged in", user.nickname);
        Ok((user, token))
    }

    async fn get_user(&self, id: &str) -> ServiceResult<User> {
        match self.user_repository.get_user_by_id(id).await? {
            Some(user) => Ok(user),
            None => ServiceError::not_found("User not found"),
        }
    }

    async fn get_user_by_nickname(&self, nickname: &str) -> ServiceResult<User> {
        match self
            .user_repository
            .get_user_by_nickname(nickname.trim())
            .await?
        {
            Some(user) => Ok(user),
            None => ServiceError::not_found("User not found"),
        }
    }

    async fn get_users(&self) -> ServiceResult<Vec<User>> {
        self.user_repository.get_users().await
    }

    async fn update_profile(&self, nickname: &str, update: ProfileUpdate) -> ServiceResult<User> {
        if update.nickname.is_none()
            && update.valorant_nickname.is_none()
            && update.preferred_position.is_none()
        {
            return ServiceError::bad_request("No fields to update");
        }
        let mut user = self.get_user_by_nickname(nickname).await?;
        let previous = user.nickname.clone();

        if let Some(nickname) = update.nickname {
            let nickname = validate_nickname(&nickname)?;
            if nickname != user.nickname
                && self
                    .user_repository
                    .get_user_by_nickname(&nickname)
                    .await?
                    .is_some()
            {
                return ServiceError::bad_request("Nickname already in use");
            }
            user.nickname = nickname;
        }
        if let Some(valorant_nickname) = update.valorant_nickname {
            let valorant_nickname = valorant_nickname.trim().to_string();
            if valorant_nickname.is_empty() {
                return ServiceError::validation(
                    "Invalid field values",
                    vec!["valorantNickname".to_string()],
                );
            }
            if valorant_nickname != user.valorant_nickname
                && self
                    .user_repository
                    .get_user_by_valorant_nickname(&valorant_nickname)
                    .await?
                    .is_some()
            {
                return ServiceError::bad_request("Valorant nickname already in use");
            }
            user.valorant_nickname = valorant_nickname;
        }
        if let Some(position) = update.preferred_position {
            user.preferred_position = position.parse::<Position>().map_err(|_| {
                ServiceError::Validation {
                    message: format!("Unknown position: {}", position),
                    fields: vec!["preferredPosition".to_string()],
                }
            })?;
        }

        self.user_repository.update_profile(&user).await?;
        info!("Updated profile of {} (now {})", previous, user.nickname);
        self.get_user(&user.id).await
    }

    async fn delete_user(&self, nickname: &str) -> ServiceResult<()> {
        let user = self.get_user_by_nickname(nickname).await?;
        self.user_repository.delete_user(&user.id).await?;
        info!("Deleted user {} ({})", user.nickname, user.id);
        Ok(())
    }
}
