//! Twilio gateway against a mocked Messages API.

mod common;

use std::sync::Arc;

use anyhow::Result;
use assert_matches::assert_matches;
use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{basic_auth, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use classcify_api::config::AppConfig;
use classcify_api::config::SmsConfig;
use classcify_api::sms::{SmsError, SmsGateway, TwilioGateway};

const SID: &str = "AC0123456789";
const TOKEN: &str = "twilio-auth-token";
const FROM: &str = "+15005550006";

fn messages_path() -> String {
    format!("/2010-04-01/Accounts/{}/Messages.json", SID)
}

fn gateway(server: &MockServer) -> TwilioGateway {
    TwilioGateway::new(server.uri(), SID, TOKEN, FROM).expect("build gateway")
}

#[tokio::test]
async fn posts_form_encoded_message_with_basic_auth() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(messages_path()))
        .and(basic_auth(SID, TOKEN))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("To=%2B919876543210"))
        .and(body_string_contains("From=%2B15005550006"))
        .and(body_string_contains("Body=Your+Classcify+OTP%3A+123456"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sid": "SM123", "status": "queued" })))
        .expect(1)
        .mount(&server)
        .await;

    gateway(&server)
        .send("+919876543210", "Your Classcify OTP: 123456 - Valid for 10 minutes")
        .await?;
    Ok(())
}

#[tokio::test]
async fn provider_error_is_reported_with_status() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(messages_path()))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 21211,
            "message": "The 'To' number is not a valid phone number."
        })))
        .mount(&server)
        .await;

    let result = gateway(&server).send("+91123", "hello").await;

    assert_matches!(result, Err(SmsError::Provider { status: 400, ref body }) if body.contains("21211"));
    Ok(())
}

#[test]
fn missing_credentials_yield_no_gateway() {
    let mut config = AppConfig::development().sms;
    assert!(TwilioGateway::from_config(&config).unwrap().is_none());

    config = SmsConfig {
        account_sid: Some(SID.to_string()),
        auth_token: Some(TOKEN.to_string()),
        from_number: Some(FROM.to_string()),
        ..config
    };
    assert!(TwilioGateway::from_config(&config).unwrap().is_some());
}

#[tokio::test]
async fn send_otp_end_to_end_through_twilio() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(messages_path()))
        .and(body_string_contains("To=%2B919876543210"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sid": "SM456" })))
        .expect(1)
        .mount(&server)
        .await;

    let app = common::TestApp::with_gateway(
        AppConfig::development(),
        Arc::new(gateway(&server)),
        Arc::new(common::RecordingGateway::default()),
    );
    let draft_id = app.create_draft(json!({})).await?;

    let (status, body) = app
        .post("/staff/send-otp", json!({ "draftId": draft_id, "phone": "9876543210" }))
        .await?;

    assert_eq!(status, StatusCode::OK, "{}", body);
    Ok(())
}

#[tokio::test]
async fn provider_outage_maps_to_bad_gateway() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(messages_path()))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let app = common::TestApp::with_gateway(
        AppConfig::development(),
        Arc::new(gateway(&server)),
        Arc::new(common::RecordingGateway::default()),
    );
    let draft_id = app.create_draft(json!({})).await?;

    let (status, body) = app
        .post("/staff/send-otp", json!({ "draftId": draft_id, "phone": "9876543210" }))
        .await?;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "BAD_GATEWAY");
    assert!(!body["error"].as_str().unwrap_or_default().contains("503"));
    Ok(())
}
