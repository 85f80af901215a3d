use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::email::is_valid_email;
use super::templates::{render, TemplateCatalog};
use super::transport::{MailTransport, OutboundEmail, SendGridTransport, TransportError};
use crate::config::NotificationConfig;

pub const PLAIN_TEXT_FALLBACK: &str = "Please view this email in HTML.";

/// Result of a dispatch attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Skipped,
    Sent {
        status_code: u16,
        message_id: Option<String>,
        sent_at: DateTime<Utc>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification is not configured: {0}")]
    Configuration(String),
    #[error("invalid email address '{0}'")]
    InvalidEmail(String),
    #[error("unknown tier '{tier}', expected one of {expected:?}")]
    UnknownTier {
        tier: String,
        expected: Vec<&'static str>,
    },
    #[error("template file not found: {}", path.display())]
    TemplateNotFound { path: PathBuf },
    #[error("failed to read template {}: {source}", path.display())]
    TemplateUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("email provider rejected the credential (status {status}): {detail}")]
    Auth { status: u16, detail: String },
    #[error("email send failed: {0}")]
    Provider(String),
}

impl From<TransportError> for NotificationError {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::Credentials(detail) => Self::Configuration(detail),
            TransportError::Unauthorized { status, body } => Self::Auth {
                status,
                detail: body,
            },
            other @ (TransportError::Rejected { .. } | TransportError::Network(_)) => {
                Self::Provider(other.to_string())
            }
        }
    }
}

/// Renders the tier template and hands it to the mail transport. Consent is collected by
/// the caller and passed in.
pub struct NotificationDispatcher<T> {
    catalog: TemplateCatalog,
    transport: Arc<T>,
    sender: Option<String>,
    subject: String,
}

impl NotificationDispatcher<SendGridTransport> {
    pub fn from_config(config: &NotificationConfig) -> Result<Self, NotificationError> {
        let transport = SendGridTransport::new(config.api_key.clone(), config.api_url.clone())?;
        Ok(Self::new(
            TemplateCatalog::new(config.template_dir.clone()),
            Arc::new(transport),
            config.from_email.clone(),
            config.subject.clone(),
        ))
    }
}

impl<T> NotificationDispatcher<T>
where
    T: MailTransport + 'static,
{
    pub fn new(
        catalog: TemplateCatalog,
        transport: Arc<T>,
        sender: Option<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            transport,
            sender: sender
                .map(|address| address.trim().to_string())
                .filter(|address| !address.is_empty()),
            subject: subject.into(),
        }
    }

    /// Sends the offer for `tier` to the recipient when `consent` is given.
    ///
    /// Email shape, tier mapping, template, and sender are all checked before the transport
    /// is called.
    pub async fn dispatch(
        &self,
        tier: &str,
        consent: bool,
        recipient_email: &str,
        recipient_name: &str,
    ) -> Result<DispatchOutcome, NotificationError> {
        if !consent {
            info!(tier, "notification skipped without consent");
            return Ok(DispatchOutcome::Skipped);
        }

        let result = self.send(tier, recipient_email, recipient_name).await;
        match &result {
            Ok(DispatchOutcome::Sent { status_code, .. }) => {
                info!(tier, status_code, "offer email sent");
            }
            Ok(DispatchOutcome::Skipped) => {}
            Err(err) => warn!(tier, error = %err, "offer email not sent"),
        }
        result
    }

    async fn send(
        &self,
        tier: &str,
        recipient_email: &str,
        recipient_name: &str,
    ) -> Result<DispatchOutcome, NotificationError> {
        let recipient_email = recipient_email.trim();
        if !is_valid_email(recipient_email) {
            return Err(NotificationError::InvalidEmail(recipient_email.to_string()));
        }

        let template = self.catalog.load(tier)?;
        let sender = self.sender.clone().ok_or_else(|| {
            NotificationError::Configuration(
                "SENDGRID_FROM_EMAIL is missing; use a verified sender address".to_string(),
            )
        })?;

        let email = OutboundEmail {
            from: sender,
            to: recipient_email.to_string(),
            to_name: recipient_name.trim().to_string(),
            subject: self.subject.clone(),
            plain_text: PLAIN_TEXT_FALLBACK.to_string(),
            html: render(&template, recipient_name),
        };

        let receipt = self.transport.send(&email).await?;
        Ok(DispatchOutcome::Sent {
            status_code: receipt.status_code,
            message_id: receipt.message_id,
            sent_at: Utc::now(),
        })
    }
}
