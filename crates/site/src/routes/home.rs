//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::flash;
use crate::models::FlashMessage;

/// A service card on the home page.
pub struct ServiceCard {
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

/// Services offered, in display order. The titles double as the options of
/// the contact form's service select.
pub const SERVICES: &[ServiceCard] = &[
    ServiceCard {
        title: "Instalações Elétricas",
        description: "Projetos e instalações residenciais, comerciais e industriais \
                      dentro das normas técnicas.",
        icon: "plug",
    },
    ServiceCard {
        title: "Manutenção Preventiva",
        description: "Inspeção periódica de circuitos, tomadas e quadros para evitar \
                      falhas e desperdício de energia.",
        icon: "wrench",
    },
    ServiceCard {
        title: "Quadros de Distribuição",
        description: "Montagem, substituição e organização de quadros com disjuntores \
                      e DR dimensionados corretamente.",
        icon: "grid",
    },
    ServiceCard {
        title: "Padrão de Entrada",
        description: "Instalação e adequação do padrão de entrada conforme as exigências \
                      da concessionária.",
        icon: "bolt",
    },
    ServiceCard {
        title: "Iluminação",
        description: "Projetos de iluminação interna e externa com foco em conforto \
                      e eficiência energética.",
        icon: "bulb",
    },
    ServiceCard {
        title: "Automação Residencial",
        description: "Interruptores inteligentes, sensores de presença e controle \
                      remoto da sua casa.",
        icon: "home",
    },
];

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub flashes: Vec<FlashMessage>,
    pub services: &'static [ServiceCard],
}

/// Display the home page.
///
/// Reviews are loaded by the browser from `/get_google_reviews`.
#[instrument(skip(session))]
pub async fn home(session: Session) -> impl IntoResponse {
    HomeTemplate {
        flashes: flash::take(&session).await,
        services: SERVICES,
    }
}
