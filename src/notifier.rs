//! Outbound message delivery.
//!
//! Flows that need to reach an account holder out-of-band (password reset
//! links) depend on the `Notifier` trait. Production wires an SMTP transport;
//! without SMTP configuration the application falls back to logging the
//! message, which is enough for local development.

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

use crate::error::AppError;

/// A message handed to the notifier for out-of-band delivery.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers the message, or fails with `AppError::DeliveryFailure`.
    async fn send(&self, message: EmailMessage) -> Result<(), AppError>;
}

/// SMTP-backed notifier.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpNotifier {
    pub fn from_env() -> Self {
        let host = std::env::var("SMTP_HOST").expect("SMTP_HOST must be set");
        let port: u16 = std::env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse()
            .expect("SMTP_PORT must be a number");
        let username = std::env::var("SMTP_USERNAME").expect("SMTP_USERNAME must be set");
        let password = std::env::var("SMTP_PASSWORD").expect("SMTP_PASSWORD must be set");
        let from = std::env::var("EMAIL_FROM")
            .unwrap_or_else(|_| "TaskVault <noreply@taskvault.local>".to_string());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&host)
            .port(port)
            .credentials(Credentials::new(username, password))
            .build();

        Self { transport, from }
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), AppError> {
        let email = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| AppError::Internal(format!("Invalid sender address: {}", e)))?,
            )
            .to(message
                .to
                .parse()
                .map_err(|e| AppError::Internal(format!("Invalid recipient address: {}", e)))?)
            .subject(message.subject)
            .body(message.body)
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.transport.send(email).await.map_err(|e| {
            log::error!("smtp delivery failed: {}", e);
            AppError::DeliveryFailure
        })?;

        Ok(())
    }
}

/// Development notifier: writes the message to the log instead of sending it.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), AppError> {
        log::info!(
            "email to {}: {}\n{}",
            message.to,
            message.subject,
            message.body
        );
        Ok(())
    }
}

/// Picks the notifier for this deployment: SMTP when configured, the logging
/// notifier otherwise.
pub fn from_env() -> Arc<dyn Notifier> {
    if std::env::var("SMTP_HOST").is_ok() {
        Arc::new(SmtpNotifier::from_env())
    } else {
        log::warn!("SMTP_HOST not set; emails will be logged, not delivered");
        Arc::new(LogNotifier)
    }
}
