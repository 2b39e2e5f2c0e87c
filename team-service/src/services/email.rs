use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;

use crate::config::SmtpConfig;

/// Outbound mail. Callers decide whether a failed send aborts their flow.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(
            config.user.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = SmtpTransport::relay(&config.host)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        let from: Mailbox = config.from.parse()?;

        tracing::info!(host = %config.host, port = config.port, "SMTP mailer initialized");

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(to_email.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        // SmtpTransport blocks; keep it off the async workers.
        let transport = self.transport.clone();
        let result = tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to_email, subject = %subject, "Email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %to_email, "Failed to send email");
                Err(AppError::EmailError(e.to_string()))
            }
        }
    }
}

/// A message captured by [`MockMailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Records messages instead of sending them. Addresses registered with
/// [`MockMailer::fail_for`] (or every address after [`MockMailer::fail_all`])
/// get an `EmailError`.
#[derive(Default)]
pub struct MockMailer {
    sent: Mutex<Vec<SentMail>>,
    failing: Mutex<HashSet<String>>,
    fail_all: Mutex<bool>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, to_email: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(to_email.to_string());
        }
    }

    pub fn fail_all(&self) {
        if let Ok(mut fail_all) = self.fail_all.lock() {
            *fail_all = true;
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn sent_to(&self, to_email: &str) -> Vec<SentMail> {
        self.sent()
            .into_iter()
            .filter(|mail| mail.to == to_email)
            .collect()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let fail_all = *self
            .fail_all
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Mock mailer mutex poisoned: {}", e)))?;
        let fail_this = self
            .failing
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Mock mailer mutex poisoned: {}", e)))?
            .contains(to_email);

        if fail_all || fail_this {
            return Err(AppError::EmailError(format!("mock refused mail to {}", to_email)));
        }

        self.sent
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Mock mailer mutex poisoned: {}", e)))?
            .push(SentMail {
                to: to_email.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
        Ok(())
    }
}
