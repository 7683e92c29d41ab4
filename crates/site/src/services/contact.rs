//! Contact form relay.

use askama::Template;
use serde::Deserialize;
use thiserror::Error;

use crate::services::email::{EmailError, Mailer, OutgoingEmail, parse_mailbox};

/// Errors from relaying a contact message.
#[derive(Debug, Error)]
pub enum ContactError {
    /// A required field was left blank.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// No destination configured.
    #[error("contact recipient not configured")]
    NoRecipient,

    #[error(transparent)]
    Email(#[from] EmailError),
}

/// Fields posted by the home page form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service: String,
    pub message: String,
}

#[derive(Template)]
#[template(path = "email/contact.txt", escape = "none")]
struct ContactEmailText<'a> {
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    service: &'a str,
    message: &'a str,
}

impl ContactForm {
    /// Subject line of the relayed message.
    #[must_use]
    pub fn subject(&self) -> String {
        format!("Novo contato do site - {}", self.service.trim())
    }

    /// Build the message for `recipient`.
    ///
    /// The visitor's address becomes `Reply-To` only when it parses.
    ///
    /// # Errors
    ///
    /// Returns `ContactError::MissingField` for a blank name or message, and
    /// an email error if the recipient is invalid or the body fails to render.
    pub fn compose(&self, recipient: &str) -> Result<OutgoingEmail, ContactError> {
        if self.name.trim().is_empty() {
            return Err(ContactError::MissingField("name"));
        }
        if self.message.trim().is_empty() {
            return Err(ContactError::MissingField("message"));
        }

        let body = ContactEmailText {
            name: self.name.trim(),
            email: self.email.trim(),
            phone: self.phone.trim(),
            service: self.service.trim(),
            message: self.message.trim(),
        }
        .render()
        .map_err(EmailError::from)?;

        let reply_to = parse_mailbox(&self.email).ok();
        if reply_to.is_none() && !self.email.trim().is_empty() {
            tracing::debug!(email = %self.email, "Visitor address not usable as Reply-To");
        }

        Ok(OutgoingEmail {
            to: parse_mailbox(recipient)?,
            reply_to,
            subject: self.subject(),
            body,
        })
    }
}

/// Compose and send a contact message.
///
/// # Errors
///
/// Returns an error if the form is incomplete, no recipient is configured,
/// or the mailer fails.
pub async fn relay(
    mailer: &dyn Mailer,
    recipient: Option<&str>,
    form: &ContactForm,
) -> Result<(), ContactError> {
    let recipient = recipient.ok_or(ContactError::NoRecipient)?;
    let email = form.compose(recipient)?;
    mailer.send(email).await?;
    tracing::info!(service = %form.service, "Relayed contact message");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    fn form() -> ContactForm {
        ContactForm {
            name: "Maria".to_string(),
            email: "maria@example.com".to_string(),
            phone: "(11) 99999-0000".to_string(),
            service: "Instalação elétrica".to_string(),
            message: "Preciso de um orçamento.".to_string(),
        }
    }

    #[derive(Default)]
    struct Recording(Mutex<Vec<OutgoingEmail>>);

    #[async_trait]
    impl Mailer for Recording {
        async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
            self.0.lock().unwrap().push(email);
            Ok(())
        }
    }

    #[test]
    fn test_compose() {
        let email = form().compose("contato@fseletromcz.com.br").unwrap();
        assert_eq!(email.subject, "Novo contato do site - Instalação elétrica");
        assert_eq!(
            email.reply_to.unwrap().email.to_string(),
            "maria@example.com"
        );
        assert!(email.body.contains("Nome: Maria"));
        assert!(email.body.contains("Telefone: (11) 99999-0000"));
        assert!(email.body.contains("Preciso de um orçamento."));
    }

    #[test]
    fn test_compose_without_valid_reply_to() {
        let mut f = form();
        f.email = "maria arroba example".to_string();
        let email = f.compose("contato@fseletromcz.com.br").unwrap();
        assert!(email.reply_to.is_none());
    }

    #[test]
    fn test_compose_requires_name_and_message() {
        let mut f = form();
        f.message = "   ".to_string();
        assert!(matches!(
            f.compose("contato@fseletromcz.com.br"),
            Err(ContactError::MissingField("message"))
        ));
        f.name = String::new();
        assert!(matches!(
            f.compose("contato@fseletromcz.com.br"),
            Err(ContactError::MissingField("name"))
        ));
    }

    #[tokio::test]
    async fn test_relay() {
        let mailer = Recording::default();
        relay(&mailer, Some("contato@fseletromcz.com.br"), &form())
            .await
            .unwrap();
        assert_eq!(mailer.0.lock().unwrap().len(), 1);

        assert!(matches!(
            relay(&mailer, None, &form()).await,
            Err(ContactError::NoRecipient)
        ));
    }
}
