//! Outbound SMS delivery.
//!
//! [`TwilioGateway`] talks to the Twilio Messages API; [`LogGateway`] only
//! writes the message to the log and is what development runs use when no
//! credentials are configured.

use async_trait::async_trait;

pub mod twilio;

pub use twilio::TwilioGateway;

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("SMS request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("SMS provider returned HTTP {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("SMS gateway unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Send `body` to an E.164 number. Returns only once the provider has
    /// accepted the message.
    async fn send(&self, to: &str, body: &str) -> Result<(), SmsError>;
}

#[derive(Debug, Default)]
pub struct LogGateway;

#[async_trait]
impl SmsGateway for LogGateway {
    async fn send(&self, to: &str, body: &str) -> Result<(), SmsError> {
        tracing::warn!(to, body, "SMS gateway not configured, message logged instead of sent");
        Ok(())
    }
}
