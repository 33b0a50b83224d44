use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{SmsError, SmsGateway};
use crate::config::SmsConfig;

/// HTTP timeout for one send attempt. There is no retry; the caller reports
/// the failure and the user asks for a new code.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct TwilioGateway {
    client: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

#[derive(Debug, Deserialize)]
struct MessageCreated {
    sid: String,
}

impl TwilioGateway {
    pub fn new(
        base_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Result<Self, SmsError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
        })
    }

    /// Build from config; `None` when any credential is missing.
    pub fn from_config(config: &SmsConfig) -> Result<Option<Self>, SmsError> {
        match (&config.account_sid, &config.auth_token, &config.from_number) {
            (Some(sid), Some(token), Some(from)) => {
                Self::new(config.base_url.clone(), sid.clone(), token.clone(), from.clone()).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/2010-04-01/Accounts/{}/Messages.json", self.base_url, self.account_sid)
    }
}

#[async_trait]
impl SmsGateway for TwilioGateway {
    async fn send(&self, to: &str, body: &str) -> Result<(), SmsError> {
        tracing::debug!(to, "Sending SMS via Twilio");

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from_number.as_str()), ("Body", body)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %body, "Twilio rejected message");
            return Err(SmsError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let created: MessageCreated = response.json().await?;
        tracing::info!(message_sid = %created.sid, "SMS accepted by Twilio");
        Ok(())
    }
}
