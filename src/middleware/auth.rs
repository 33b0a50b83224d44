use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{Claims, Role};
use crate::error::ApiError;

/// Authenticated caller extracted from the bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    /// Staff id, or the admin email.
    pub subject: String,
    pub record_id: Option<Uuid>,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            record_id: claims.rid,
            role: claims.role,
        }
    }
}

impl AuthUser {
    /// Record id carried by staff tokens.
    pub fn record_id(&self) -> Result<Uuid, ApiError> {
        self.record_id
            .ok_or_else(|| ApiError::unauthorized("Token does not identify a staff record"))
    }
}

/// Bearer auth for staff self-service routes
pub async fn staff_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(&state, &headers, request, next, Role::Teacher).await
}

/// Bearer auth for admin directory routes
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(&state, &headers, request, next, Role::Admin).await
}

async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    mut request: Request,
    next: Next,
    required: Role,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(headers).map_err(ApiError::unauthorized)?;

    let claims = state.tokens.validate(&token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::unauthorized("Invalid or expired token")
    })?;

    if claims.role != required {
        return Err(ApiError::forbidden("Insufficient role for this resource"));
    }

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
