// HTTP API Error Types
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::staff::StaffError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidOtp(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 429 Too Many Requests
    TooManyRequests(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (SMS provider)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidOtp(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidOtp(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::TooManyRequests(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        });

        if let ApiError::ValidationError {
            field_errors: Some(field_errors),
            ..
        } = self
        {
            response["field_errors"] = json!(field_errors);
        }

        response
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidOtp(_) => "INVALID_OTP",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::TooManyRequests(_) => "TOO_MANY_REQUESTS",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    /// Validation failure on one named field.
    pub fn field_error(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), message.clone());
        ApiError::validation_error(message, Some(field_errors))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        ApiError::TooManyRequests(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<StaffError> for ApiError {
    fn from(err: StaffError) -> Self {
        match err {
            StaffError::Validation(msg) => ApiError::validation_error(msg, None),
            StaffError::NotFound(msg) => ApiError::NotFound(msg),
            StaffError::InvalidCode => ApiError::InvalidOtp(StaffError::InvalidCode.to_string()),
            StaffError::Delivery(e) => {
                tracing::error!("SMS delivery error: {}", e);
                ApiError::BadGateway("Failed to send OTP".to_string())
            }
            StaffError::Forbidden(msg) => ApiError::Forbidden(msg),
            StaffError::BadRequest(msg) => ApiError::BadRequest(msg),
            StaffError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            StaffError::Conflict(msg) => ApiError::Conflict(msg),
            StaffError::Persistence(msg) => {
                // Don't expose storage errors to clients
                tracing::error!("Storage error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            StaffError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation_error(format!("Invalid request body: {}", rejection.body_text()), None)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation_error(format!("Invalid path parameter: {}", rejection.body_text()), None)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sms::SmsError;

    #[test]
    fn staff_errors_map_to_documented_statuses() {
        let cases = [
            (StaffError::Validation("x".into()), 400, "VALIDATION_ERROR"),
            (StaffError::InvalidCode, 400, "INVALID_OTP"),
            (StaffError::BadRequest("x".into()), 400, "BAD_REQUEST"),
            (StaffError::Unauthorized("x".into()), 401, "UNAUTHORIZED"),
            (StaffError::Forbidden("x".into()), 403, "FORBIDDEN"),
            (StaffError::NotFound("x".into()), 404, "NOT_FOUND"),
            (StaffError::Conflict("x".into()), 409, "CONFLICT"),
            (StaffError::Persistence("x".into()), 500, "INTERNAL_SERVER_ERROR"),
            (StaffError::Internal("x".into()), 500, "INTERNAL_SERVER_ERROR"),
            (
                StaffError::Delivery(SmsError::Unavailable("down".into())),
                502,
                "BAD_GATEWAY",
            ),
        ];

        for (err, status, code) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status_code().as_u16(), status);
            assert_eq!(api.error_code(), code);
        }
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let api: ApiError = StaffError::Persistence("duplicate key value violates constraint".into()).into();
        assert!(!api.message().contains("duplicate"));

        let body = api.to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INTERNAL_SERVER_ERROR");
    }

    #[test]
    fn field_errors_are_included() {
        let body = ApiError::field_error("phone", "Phone number must be 7 to 15 digits").to_json();
        assert_eq!(body["field_errors"]["phone"], "Phone number must be 7 to 15 digits");
    }
}
