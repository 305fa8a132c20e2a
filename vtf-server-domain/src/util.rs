use rustrict::CensorStr;
use validator::Validate;

use crate::{ServiceError, ServiceResult};

#[derive(Validate)]
struct EmailValidator {
    #[validate(email)]
    email: String,
}

pub fn validate_email(email: &str) -> ServiceResult<String> {
    let validator = EmailValidator {
        email: email.trim().to_string(),
    };
    if let Err(e) = validator.validate() {
        return ServiceError::bad_request(format!("Invalid email: {}", e));
    }
    Ok(validator.email)
}

pub fn validate_nickname(nickname: &str) -> ServiceResult<String> {
    let nickname = nickname.trim();
    let len = nickname.chars().count();
    if !(2..=16).contains(&len) {
        return ServiceError::bad_request("Nickname must be between 2 and 16 characters");
    }
    if nickname.chars().any(char::is_whitespace) {
        return ServiceError::bad_request("Nickname must not contain spaces");
    }
    if nickname.is_inappropriate() {
        return ServiceError::bad_request("Nickname contains inappropriate content");
    }
    Ok(nickname.to_string())
}

pub fn validate_password(password: &str) -> ServiceResult<()> {
    if password.chars().count() < 8 {
        return ServiceError::bad_request("Password must be at least 8 characters");
    }
    Ok(())
}

/// Collects the names of required fields that are absent or blank.
#[derive(Default)]
pub struct MissingFields(Vec<String>);

impl MissingFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check<T>(&mut self, name: &str, value: &Option<T>) {
        if value.is_none() {
            self.0.push(name.to_string());
        }
    }

    pub fn check_str(&mut self, name: &str, value: &Option<String>) {
        if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
            self.0.push(name.to_string());
        }
    }

    pub fn into_result(self) -> ServiceResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            ServiceError::validation("Missing required fields", self.0)
        }
    }
}
