//! Admin blog management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use eletromcz_core::BlogPostId;

use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAdmin, flash};
use crate::models::{BlogPost, CurrentUser, FlashLevel, FlashMessage};
use crate::routes::admin::upload::UploadForm;
use crate::services::blog::{BlogError, BlogPostForm};
use crate::services::validation::FieldErrors;
use crate::state::AppState;

const LIST_PATH: &str = "/admin/blog";
const NOT_FOUND_MESSAGE: &str = "Post não encontrado.";
const SAVE_FAILED_MESSAGE: &str = "Erro ao salvar o post. Tente novamente.";
const SLUG_TAKEN_MESSAGE: &str = "Já existe um post com este slug. Escolha outro.";

/// Post list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/blog/list.html")]
pub struct PostListTemplate {
    pub flashes: Vec<FlashMessage>,
    pub admin: CurrentUser,
    pub posts: Vec<BlogPost>,
}

/// Create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/blog/form.html")]
pub struct PostFormTemplate {
    pub flashes: Vec<FlashMessage>,
    pub admin: CurrentUser,
    pub heading: &'static str,
    pub action: String,
    pub form: BlogPostForm,
    pub errors: FieldErrors,
    /// Stored image of the post being edited.
    pub current_image: Option<String>,
}

impl PostFormTemplate {
    fn create(admin: CurrentUser, form: BlogPostForm) -> Self {
        Self {
            flashes: Vec::new(),
            admin,
            heading: "Novo post",
            action: format!("{LIST_PATH}/new"),
            form,
            errors: FieldErrors::new(),
            current_image: None,
        }
    }

    fn edit(admin: CurrentUser, post: &BlogPost, form: BlogPostForm) -> Self {
        Self {
            flashes: Vec::new(),
            admin,
            heading: "Editar post",
            action: format!("{LIST_PATH}/edit/{}", post.id),
            form,
            errors: FieldErrors::new(),
            current_image: post.image.clone(),
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

    /// Turn a failed save into the re-rendered form.
    fn failed(self, err: &BlogError) -> Self {
        match err {
            BlogError::SlugTaken(_) => {
                let mut errors = FieldErrors::new();
                errors.add("slug", SLUG_TAKEN_MESSAGE);
                self.with_errors(errors).with_error_flash(SLUG_TAKEN_MESSAGE)
            }
            _ => self.with_error_flash(SAVE_FAILED_MESSAGE),
        }
    }
}

fn post_form(upload: &UploadForm) -> BlogPostForm {
    BlogPostForm {
        title: upload.text("title"),
        slug: upload.text("slug"),
        content: upload.text("content"),
        summary: upload.text("summary"),
        published: upload.checked("published"),
        image_name: upload.image_name(),
    }
}

fn log_save_failure(err: &BlogError, action: &str) {
    match err {
        BlogError::SlugTaken(slug) => {
            tracing::info!(slug = %slug, action, "Rejected duplicate slug");
        }
        e => tracing::error!(error = %e, action, "Failed to save blog post"),
    }
}

async fn not_found(session: &Session) -> Response {
    flash::push(session, FlashLevel::Error, NOT_FOUND_MESSAGE).await;
    Redirect::to(LIST_PATH).into_response()
}

/// GET /admin/blog
#[instrument(skip_all, fields(user_id = %admin.id))]
pub async fn list(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let posts = state.blog().list_all().await?;
    Ok(PostListTemplate {
        flashes: flash::take(&session).await,
        admin,
        posts,
    })
}

/// GET /admin/blog/new
#[instrument(skip_all, fields(user_id = %admin.id))]
pub async fn new_page(RequireAdmin(admin): RequireAdmin, session: Session) -> impl IntoResponse {
    let mut page = PostFormTemplate::create(admin, BlogPostForm::new_post());
    page.flashes = flash::take(&session).await;
    page
}

/// POST /admin/blog/new
#[instrument(skip_all, fields(user_id = %admin.id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    let upload = UploadForm::read(multipart).await?;
    let form = post_form(&upload);

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(PostFormTemplate::create(admin, form)
                .with_errors(errors)
                .into_response());
        }
    };

    match state
        .blog()
        .create(input, Some(admin.id), upload.image.as_ref())
        .await
    {
        Ok(_) => {
            flash::push(&session, FlashLevel::Success, "Post criado com sucesso!").await;
            Ok(Redirect::to(LIST_PATH).into_response())
        }
        Err(e) => {
            log_save_failure(&e, "create");
            Ok(PostFormTemplate::create(admin, form)
                .failed(&e)
                .into_response())
        }
    }
}

/// GET /admin/blog/edit/{id}
#[instrument(skip_all, fields(user_id = %admin.id, post_id = %id))]
pub async fn edit_page(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<BlogPostId>,
) -> Result<Response> {
    match state.blog().find(id).await {
        Ok(post) => {
            let mut page = PostFormTemplate::edit(admin, &post, BlogPostForm::from(&post));
            page.flashes = flash::take(&session).await;
            Ok(page.into_response())
        }
        Err(BlogError::NotFound) => Ok(not_found(&session).await),
        Err(e) => Err(e.into()),
    }
}

/// POST /admin/blog/edit/{id}
#[instrument(skip_all, fields(user_id = %admin.id, post_id = %id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<BlogPostId>,
    multipart: Multipart,
) -> Result<Response> {
    let existing = match state.blog().find(id).await {
        Ok(post) => post,
        Err(BlogError::NotFound) => return Ok(not_found(&session).await),
        Err(e) => return Err(e.into()),
    };

    let upload = UploadForm::read(multipart).await?;
    let form = post_form(&upload);

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(PostFormTemplate::edit(admin, &existing, form)
                .with_errors(errors)
                .into_response());
        }
    };

    match state.blog().update(id, input, upload.image.as_ref()).await {
        Ok(_) => {
            flash::push(&session, FlashLevel::Success, "Post atualizado com sucesso!").await;
            Ok(Redirect::to(LIST_PATH).into_response())
        }
        Err(BlogError::NotFound) => Ok(not_found(&session).await),
        Err(e) => {
            log_save_failure(&e, "update");
            Ok(PostFormTemplate::edit(admin, &existing, form)
                .failed(&e)
                .into_response())
        }
    }
}

/// GET or POST /admin/blog/delete/{id}
#[instrument(skip_all, fields(user_id = %admin.id, post_id = %id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<BlogPostId>,
) -> Result<Response> {
    match state.blog().delete(id).await {
        Ok(_) => {
            flash::push(&session, FlashLevel::Success, "Post excluído com sucesso!").await;
            Ok(Redirect::to(LIST_PATH).into_response())
        }
        Err(BlogError::NotFound) => Ok(not_found(&session).await),
        Err(e) => Err(e.into()),
    }
}
