#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::ServiceExt;

use classcify_api::app::{router, AppState};
use classcify_api::config::AppConfig;
use classcify_api::database::MemoryStaffStore;
use classcify_api::sms::{SmsError, SmsGateway};

/// Captures outgoing SMS instead of sending them.
#[derive(Default)]
pub struct RecordingGateway {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl SmsGateway for RecordingGateway {
    async fn send(&self, to: &str, body: &str) -> Result<(), SmsError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SmsError::Unavailable("test gateway set to fail".to_string()));
        }
        self.sent.lock().await.push((to.to_string(), body.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub sms: Arc<RecordingGateway>,
    pub config: AppConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig::development();
        adjust(&mut config);

        let sms = Arc::new(RecordingGateway::default());
        Self::with_gateway(config, sms.clone(), sms)
    }

    /// Use `gateway` for delivery; `sms` is still exposed for tests that don't need it.
    pub fn with_gateway(config: AppConfig, gateway: Arc<dyn SmsGateway>, sms: Arc<RecordingGateway>) -> Self {
        let store = Arc::new(MemoryStaffStore::new());
        let state = AppState::new(&config, store, gateway).expect("failed to build app state");
        let router = router(state, &config.security.cors_origins);
        Self { router, sms, config }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body: {:?}", bytes))?
        };
        Ok((status, body))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, uri, None, token).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, uri, Some(body), None).await
    }

    /// The 6-digit code in the most recent SMS.
    pub async fn last_code(&self) -> Result<String> {
        let sent = self.sms.sent.lock().await;
        let (_, body) = sent.last().context("no SMS was sent")?;
        body.split_whitespace()
            .find(|word| word.len() == 6 && word.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string)
            .context("no code in SMS body")
    }

    pub async fn create_draft(&self, data: Value) -> Result<String> {
        let (status, body) = self.post("/staff/draft", json!({ "data": data })).await?;
        anyhow::ensure!(status == StatusCode::OK, "draft save failed: {} {}", status, body);
        body["draftId"]
            .as_str()
            .map(str::to_string)
            .context("response has no draftId")
    }

    /// Run draft -> send-otp -> verify and return `(draft_id, staff_id)`.
    pub async fn register_staff(&self, data: Value) -> Result<(String, String)> {
        let draft_id = self.create_draft(data).await?;

        let (status, body) = self
            .post("/staff/send-otp", json!({ "draftId": draft_id, "phone": "9999999999" }))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "send-otp failed: {} {}", status, body);

        let code = self.last_code().await?;
        let (status, body) = self
            .post("/staff/verify", json!({ "draftId": draft_id, "otp": code }))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "verify failed: {} {}", status, body);

        let staff_id = body["staff"]["staffId"]
            .as_str()
            .map(str::to_string)
            .context("verified record has no staffId")?;
        Ok((draft_id, staff_id))
    }

    /// Register and log in; returns `(staff_id, token)`.
    pub async fn staff_token(&self, data: Value, password: &str) -> Result<(String, String)> {
        let (_, staff_id) = self.register_staff(data).await?;
        let (status, body) = self
            .post("/staff/login", json!({ "staffId": staff_id, "password": password }))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
        let token = body["token"].as_str().context("login returned no token")?.to_string();
        Ok((staff_id, token))
    }
}

pub fn is_staff_id(value: &str, domain: &str) -> bool {
    match value.split_once('@') {
        Some((local, d)) => local.len() == 10 && local.chars().all(|c| c.is_ascii_digit()) && d == domain,
        None => false,
    }
}
