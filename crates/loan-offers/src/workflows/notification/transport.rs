use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::json;

pub const SENDGRID_MAIL_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const SENDGRID_KEY_PREFIX: &str = "SG.";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fully rendered message handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub plain_text: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub status_code: u16,
    pub message_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{0}")]
    Credentials(String),
    #[error("provider rejected credentials (status {status}): {body}")]
    Unauthorized { status: u16, body: String },
    #[error("provider rejected message (status {status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("provider unreachable: {0}")]
    Network(String),
}

/// Outbound transactional-email provider.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, TransportError>;
}

/// SendGrid v3 mail-send client.
pub struct SendGridTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl SendGridTransport {
    /// The key is checked lazily so a missing credential only affects actual sends.
    pub fn new(
        api_key: Option<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| TransportError::Network(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    fn credential(&self) -> Result<&str, TransportError> {
        match self.api_key.as_deref() {
            Some(key) if key.starts_with(SENDGRID_KEY_PREFIX) => Ok(key),
            Some(_) => Err(TransportError::Credentials(format!(
                "SENDGRID_API_KEY is invalid: expected a key starting with '{SENDGRID_KEY_PREFIX}'"
            ))),
            None => Err(TransportError::Credentials(
                "SENDGRID_API_KEY is missing; create a key with Mail Send scope".to_string(),
            )),
        }
    }

    pub(crate) fn payload(email: &OutboundEmail) -> serde_json::Value {
        json!({
            "personalizations": [{
                "to": [{ "email": email.to, "name": email.to_name }],
            }],
            "from": { "email": email.from },
            "subject": email.subject,
            "content": [
                { "type": mime::TEXT_PLAIN.essence_str(), "value": email.plain_text },
                { "type": mime::TEXT_HTML.essence_str(), "value": email.html },
            ],
        })
    }
}

impl fmt::Debug for SendGridTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendGridTransport")
            .field("endpoint", &self.endpoint)
            .field("has_credentials", &self.has_credentials())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MailTransport for SendGridTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, TransportError> {
        let api_key = self.credential()?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&Self::payload(email))
            .send()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;

        let status = response.status();
        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        if status.is_success() {
            return Ok(DeliveryReceipt {
                status_code: status.as_u16(),
                message_id,
            });
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(TransportError::Unauthorized {
                status: status.as_u16(),
                body,
            }),
            _ => Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            }),
        }
    }
}
