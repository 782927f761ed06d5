use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use thiserror::Error;
use tintquote_core::config::SmtpConfig;
use tracing::info;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("invalid email address `{address}`: {message}")]
    InvalidAddress { address: String, message: String },
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("smtp relay could not be configured: {0}")]
    Relay(String),
    #[error("smtp delivery failed: {0}")]
    Smtp(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Sends mail through an SMTP relay, upgrading the connection with STARTTLS.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(smtp: &SmtpConfig, from_address: &str) -> Result<Self, MailError> {
        let from = parse_mailbox(from_address)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .map_err(|error| MailError::Relay(error.to_string()))?
            .port(smtp.port)
            .credentials(Credentials::new(
                smtp.username.clone(),
                smtp.api_key.expose_secret().to_string(),
            ))
            .timeout(Some(Duration::from_secs(smtp.timeout_secs)))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let message = build_message(self.from.clone(), email)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|error| MailError::Smtp(error.to_string()))?;

        info!(
            event_name = "email.smtp.accepted",
            smtp_code = %response.code(),
            "smtp relay accepted message"
        );
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.trim().parse::<Mailbox>().map_err(|error| MailError::InvalidAddress {
        address: address.to_string(),
        message: error.to_string(),
    })
}

fn build_message(from: Mailbox, email: &OutgoingEmail) -> Result<Message, MailError> {
    Message::builder()
        .from(from)
        .to(parse_mailbox(&email.to)?)
        .subject(email.subject.clone())
        .header(ContentType::TEXT_HTML)
        .body(email.html_body.clone())
        .map_err(|error| MailError::Build(error.to_string()))
}
