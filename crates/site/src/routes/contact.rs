//! Contact form route handler.

use axum::{Form, extract::State, response::Redirect};
use tower_sessions::Session;
use tracing::instrument;

use crate::middleware::flash;
use crate::models::FlashLevel;
use crate::services::contact::{self, ContactError, ContactForm};
use crate::state::AppState;

const SENT_MESSAGE: &str = "Mensagem enviada com sucesso! Em breve entraremos em contato.";
const FAILED_MESSAGE: &str = "Erro ao enviar mensagem. Por favor, tente novamente.";

/// Relay the home page contact form by email.
///
/// POST /enviar_contato
///
/// Always redirects home; the outcome is reported as a flash message and
/// failure details only go to the log.
#[instrument(skip_all, fields(service = %form.service))]
pub async fn enviar_contato(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ContactForm>,
) -> Redirect {
    let recipient = state.config().mail.contact_recipient.as_deref();

    match contact::relay(state.mailer(), recipient, &form).await {
        Ok(()) => flash::push(&session, FlashLevel::Success, SENT_MESSAGE).await,
        Err(e @ ContactError::MissingField(_)) => {
            tracing::warn!(error = %e, "Rejected incomplete contact form");
            flash::push(&session, FlashLevel::Error, FAILED_MESSAGE).await;
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to relay contact message");
            flash::push(&session, FlashLevel::Error, FAILED_MESSAGE).await;
        }
    }

    Redirect::to("/")
}
