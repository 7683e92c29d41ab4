//! Admin product management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use eletromcz_core::ProductId;

use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAdmin, flash};
use crate::models::{CurrentUser, FlashLevel, FlashMessage, Product};
use crate::routes::admin::upload::UploadForm;
use crate::services::catalog::{CatalogError, ProductForm};
use crate::services::validation::FieldErrors;
use crate::state::AppState;

const LIST_PATH: &str = "/admin/products";
const NOT_FOUND_MESSAGE: &str = "Produto não encontrado.";
const SAVE_FAILED_MESSAGE: &str = "Erro ao salvar o produto. Tente novamente.";

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/list.html")]
pub struct ProductListTemplate {
    pub flashes: Vec<FlashMessage>,
    pub admin: CurrentUser,
    pub products: Vec<Product>,
}

/// Create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/form.html")]
pub struct ProductFormTemplate {
    pub flashes: Vec<FlashMessage>,
    pub admin: CurrentUser,
    pub heading: &'static str,
    pub action: String,
    pub form: ProductForm,
    pub errors: FieldErrors,
    /// Stored image of the product being edited.
    pub current_image: Option<String>,
}

impl ProductFormTemplate {
    fn create(admin: CurrentUser, form: ProductForm) -> Self {
        Self {
            flashes: Vec::new(),
            admin,
            heading: "Novo produto",
            action: format!("{LIST_PATH}/new"),
            form,
            errors: FieldErrors::new(),
            current_image: None,
        }
    }

    fn edit(admin: CurrentUser, product: &Product, form: ProductForm) -> Self {
        Self {
            flashes: Vec::new(),
            admin,
            heading: "Editar produto",
            action: format!("{LIST_PATH}/edit/{}", product.id),
            form,
            errors: FieldErrors::new(),
            current_image: product.image.clone(),
        }
    }

    fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = errors;
        self
    }

    fn with_error_flash(mut self, text: &str) -> Self {
        self.flashes.push(FlashMessage {
            level: FlashLevel::Error,
            text: text.to_string(),
        });
        self
    }
}

fn product_form(upload: &UploadForm) -> ProductForm {
    ProductForm {
        name: upload.text("name"),
        description: upload.text("description"),
        price: upload.text("price"),
        old_price: upload.text("old_price"),
        active: upload.checked("active"),
        image_name: upload.image_name(),
    }
}

async fn not_found(session: &Session) -> Response {
    flash::push(session, FlashLevel::Error, NOT_FOUND_MESSAGE).await;
    Redirect::to(LIST_PATH).into_response()
}

/// GET /admin/products
#[instrument(skip_all, fields(user_id = %admin.id))]
pub async fn list(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let products = state.catalog().list_all().await?;
    Ok(ProductListTemplate {
        flashes: flash::take(&session).await,
        admin,
        products,
    })
}

/// GET /admin/products/new
#[instrument(skip_all, fields(user_id = %admin.id))]
pub async fn new_page(RequireAdmin(admin): RequireAdmin, session: Session) -> impl IntoResponse {
    let mut page = ProductFormTemplate::create(admin, ProductForm::new_product());
    page.flashes = flash::take(&session).await;
    page
}

/// POST /admin/products/new
#[instrument(skip_all, fields(user_id = %admin.id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    let upload = UploadForm::read(multipart).await?;
    let form = product_form(&upload);

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(ProductFormTemplate::create(admin, form)
                .with_errors(errors)
                .into_response());
        }
    };

    match state.catalog().create(input, upload.image.as_ref()).await {
        Ok(_) => {
            flash::push(&session, FlashLevel::Success, "Produto criado com sucesso!").await;
            Ok(Redirect::to(LIST_PATH).into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create product");
            Ok(ProductFormTemplate::create(admin, form)
                .with_error_flash(SAVE_FAILED_MESSAGE)
                .into_response())
        }
    }
}

/// GET /admin/products/edit/{id}
#[instrument(skip_all, fields(user_id = %admin.id, product_id = %id))]
pub async fn edit_page(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    match state.catalog().find(id).await {
        Ok(product) => {
            let mut page = ProductFormTemplate::edit(admin, &product, ProductForm::from(&product));
            page.flashes = flash::take(&session).await;
            Ok(page.into_response())
        }
        Err(CatalogError::NotFound) => Ok(not_found(&session).await),
        Err(e) => Err(e.into()),
    }
}

/// POST /admin/products/edit/{id}
#[instrument(skip_all, fields(user_id = %admin.id, product_id = %id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response> {
    let existing = match state.catalog().find(id).await {
        Ok(product) => product,
        Err(CatalogError::NotFound) => return Ok(not_found(&session).await),
        Err(e) => return Err(e.into()),
    };

    let upload = UploadForm::read(multipart).await?;
    let form = product_form(&upload);

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(ProductFormTemplate::edit(admin, &existing, form)
                .with_errors(errors)
                .into_response());
        }
    };

    match state.catalog().update(id, input, upload.image.as_ref()).await {
        Ok(_) => {
            flash::push(&session, FlashLevel::Success, "Produto atualizado com sucesso!").await;
            Ok(Redirect::to(LIST_PATH).into_response())
        }
        Err(CatalogError::NotFound) => Ok(not_found(&session).await),
        Err(e) => {
            tracing::error!(error = %e, "Failed to update product");
            Ok(ProductFormTemplate::edit(admin, &existing, form)
                .with_error_flash(SAVE_FAILED_MESSAGE)
                .into_response())
        }
    }
}

/// GET or POST /admin/products/delete/{id}
#[instrument(skip_all, fields(user_id = %admin.id, product_id = %id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    match state.catalog().delete(id).await {
        Ok(_) => {
            flash::push(&session, FlashLevel::Success, "Produto excluído com sucesso!").await;
            Ok(Redirect::to(LIST_PATH).into_response())
        }
        Err(CatalogError::NotFound) => Ok(not_found(&session).await),
        Err(e) => Err(e.into()),
    }
}
