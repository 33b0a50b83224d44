use axum::http::HeaderValue;
use axum::{middleware::from_fn_with_state, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::admin::AdminCredentials;
use crate::auth::TokenIssuer;
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::handlers;
use crate::middleware::{admin_auth_middleware, staff_auth_middleware, OtpRateLimiter};
use crate::sms::{LogGateway, SmsGateway, TwilioGateway};
use crate::staff::{ServiceSettings, StaffService, StaffStore};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub staff: Arc<StaffService>,
    pub tokens: TokenIssuer,
    pub admin: Arc<AdminCredentials>,
    pub otp_limiter: Option<Arc<OtpRateLimiter>>,
}

impl AppState {
    /// Wire the service from explicit collaborators.
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn StaffStore>,
        sms: Arc<dyn SmsGateway>,
    ) -> anyhow::Result<Self> {
        let tokens = TokenIssuer::new(&config.security.jwt_secret, config.security.jwt_expiry_hours)?;
        let service = StaffService::new(store, sms, tokens.clone(), ServiceSettings::from_config(config));

        Ok(Self {
            staff: Arc::new(service),
            tokens,
            admin: Arc::new(AdminCredentials::from_config(&config.admin)),
            otp_limiter: OtpRateLimiter::from_config(&config.api).map(Arc::new),
        })
    }

    /// Open storage and the SMS gateway named by the config.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let store = DatabaseManager::open_store(&config.database).await?;

        let sms: Arc<dyn SmsGateway> = match TwilioGateway::from_config(&config.sms)? {
            Some(gateway) => {
                tracing::info!("SMS delivery via Twilio");
                Arc::new(gateway)
            }
            None => {
                tracing::warn!("SMS credentials not configured; OTPs will only be logged");
                Arc::new(LogGateway)
            }
        };

        Self::new(config, store, sms)
    }
}

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(staff_public_routes())
        .merge(staff_routes(state.clone()))
        .merge(admin_routes(state.clone()))
        // Global middleware
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn staff_public_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::public::staff;

    Router::new()
        .route("/staff/draft", post(staff::draft_save))
        .route("/staff/draft/:draft_id", get(staff::draft_get))
        .route("/staff/send-otp", post(staff::otp_send))
        .route("/staff/verify", post(staff::otp_verify))
        .route("/staff/login", post(staff::login))
        .route("/admin/login", post(handlers::public::admin::login))
}

fn staff_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::staff;

    Router::new()
        .route("/staff/me", get(staff::me))
        .route("/staff/courses", get(staff::courses))
        .route_layer(from_fn_with_state(state, staff_auth_middleware))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    use handlers::elevated::staff;

    Router::new()
        .route("/admin/staff", get(staff::staff_list))
        .route(
            "/admin/staff/:id",
            axum::routing::put(staff::staff_update).delete(staff::staff_delete),
        )
        .route_layer(from_fn_with_state(state, admin_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(origins)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Classcify API",
            "version": version,
            "description": "Staff onboarding: registration drafts, phone verification and first login",
            "endpoints": {
                "draft": "/staff/draft[/:draft_id] (public)",
                "verification": "/staff/send-otp, /staff/verify (public)",
                "login": "/staff/login, /admin/login (public - token acquisition)",
                "staff": "/staff/me, /staff/courses (staff token)",
                "admin": "/admin/staff[/:id] (admin token)",
            }
        }
    }))
}

async fn health(axum::extract::State(state): axum::extract::State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match state.staff.storage_health().await {
        Ok(()) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "storage": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                axum::response::Json(json!({
                    "success": false,
                    "error": "storage unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "storage": "unavailable"
                    }
                })),
            )
        }
    }
}
