//! Outgoing mail over SMTP via lettre.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::MailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Sender or recipient missing from configuration.
    #[error("Mail not configured: {0}")]
    NotConfigured(&'static str),
}

/// A plain-text message ready to hand to a [`Mailer`].
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: Mailbox,
    pub reply_to: Option<Mailbox>,
    pub subject: String,
    pub body: String,
}

/// Something that delivers email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError>;
}

/// Parse an address such as `Name <user@host>` or `user@host`.
///
/// # Errors
///
/// Returns `EmailError::InvalidAddress` if the input is not a mailbox.
pub fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .trim()
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_string()))
}

/// SMTP relay mailer.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Option<Mailbox>,
}

impl SmtpMailer {
    /// Create a new mailer from configuration.
    ///
    /// `MAIL_USE_SSL` selects implicit TLS, `MAIL_USE_TLS` STARTTLS, neither a
    /// plaintext connection (local relays only).
    ///
    /// # Errors
    ///
    /// Returns error if the relay host is invalid or the sender cannot be parsed.
    pub fn new(config: &MailConfig) -> Result<Self, EmailError> {
        let builder = if config.use_ssl {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server)?
        } else if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server)
        };

        let mut builder = builder.port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_string(),
            ));
        }

        let from = config
            .default_sender
            .as_deref()
            .map(parse_mailbox)
            .transpose()?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        let from = self
            .from
            .clone()
            .ok_or(EmailError::NotConfigured("MAIL_DEFAULT_SENDER"))?;

        let mut builder = Message::builder()
            .from(from)
            .to(email.to.clone())
            .subject(&email.subject)
            .header(ContentType::TEXT_PLAIN);
        if let Some(reply_to) = email.reply_to {
            builder = builder.reply_to(reply_to);
        }
        let message = builder.body(email.body)?;

        self.transport.send(message).await?;

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mailbox_with_name() {
        let mailbox = parse_mailbox("FS Eletromcz <contato@fseletromcz.com.br>").unwrap();
        assert_eq!(mailbox.email.to_string(), "contato@fseletromcz.com.br");
        assert_eq!(mailbox.name.as_deref(), Some("FS Eletromcz"));
    }

    #[test]
    fn test_parse_mailbox_rejects_garbage() {
        assert!(matches!(
            parse_mailbox("not an address"),
            Err(EmailError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_smtp_mailer_plaintext_relay() {
        let config = crate::config::SiteConfig::local(
            secrecy::SecretString::from("k".repeat(40)),
            std::env::temp_dir(),
        );
        assert!(SmtpMailer::new(&config.mail).unwrap().from.is_some());
    }

    #[tokio::test]
    async fn test_smtp_mailer_invalid_sender() {
        let mut config = crate::config::SiteConfig::local(
            secrecy::SecretString::from("k".repeat(40)),
            std::env::temp_dir(),
        )
        .mail;
        config.default_sender = Some("@@".to_string());
        assert!(SmtpMailer::new(&config).is_err());
    }
}
