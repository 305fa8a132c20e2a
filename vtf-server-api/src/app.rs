use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use serde_json::json;
use vtf_server_domain::ServiceError;

pub struct ApiError(ServiceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ServiceError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, json!({ "error": msg }))
            }
            ServiceError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ServiceError::Validation { message, fields } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "missingFields": fields }),
            ),
            ServiceError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            ServiceError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        ApiError(value)
    }
}
