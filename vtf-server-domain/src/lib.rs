use thiserror::Error;

pub mod app;
pub mod email;
pub mod jwt;
pub mod memory;
pub mod ranking;
pub mod stats;
pub mod tier;
pub mod user;
pub mod util;
pub mod verification;

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("validation failed: {message} ({})", fields.join(", "))]
    Validation {
        message: String,
        fields: Vec<String>,
    },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn bad_request<T, R>(msg: T) -> ServiceResult<R>
    where
        T: Into<String>,
    {
        Err(ServiceError::BadRequest(msg.into()))
    }

    pub fn unauthorized<T, R>(msg: T) -> ServiceResult<R>
    where
        T: Into<String>,
    {
        Err(ServiceError::Unauthorized(msg.into()))
    }

    pub fn not_found<T, R>(msg: T) -> ServiceResult<R>
    where
        T: Into<String>,
    {
        Err(ServiceError::NotFound(msg.into()))
    }

    pub fn validation<T, R>(msg: T, fields: Vec<String>) -> ServiceResult<R>
    where
        T: Into<String>,
    {
        Err(ServiceError::Validation {
            message: msg.into(),
            fields,
        })
    }

    pub fn internal<T, R>(msg: T) -> ServiceResult<R>
    where
        T: Into<String>,
    {
        Err(ServiceError::Internal(msg.into()))
    }

    pub fn forbidden<T, R>(msg: T) -> ServiceResult<R>
    where
        T: Into<String>,
    {
        Err(ServiceError::Forbidden(msg.into()))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
