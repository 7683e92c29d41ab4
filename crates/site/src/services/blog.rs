//! Blog post management and public listing.

use thiserror::Error;

use eletromcz_core::{BlogPostId, Slug, UserId};

use crate::db::{BlogPostRepository, RepositoryError, UserRepository};
use crate::models::{BlogPost, BlogPostFields};
use crate::services::uploads::{ImageError, ImageStore, ImageUpload};
use crate::services::validation::{FieldErrors, char_len, check_image};

/// Posts per page on `/blog`.
pub const PER_PAGE: i64 = 6;

/// Other recent posts shown under an article.
pub const RECENT_POSTS: i64 = 3;

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 200;
const SUMMARY_MAX: usize = 300;

/// Errors from blog operations.
#[derive(Debug, Error)]
pub enum BlogError {
    #[error("slug already in use: {0}")]
    SlugTaken(Slug),

    #[error("post not found")]
    NotFound,

    #[error("image error: {0}")]
    Image(#[from] ImageError),

    #[error("repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for BlogError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// Blog post form as submitted, kept verbatim for re-rendering.
#[derive(Debug, Clone, Default)]
pub struct BlogPostForm {
    pub title: String,
    /// Optional explicit slug; derived from the title when blank.
    pub slug: String,
    pub content: String,
    pub summary: String,
    pub published: bool,
    /// Original file name of the uploaded image, if one was sent.
    pub image_name: Option<String>,
}

/// Validated post fields, without the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogPostInput {
    pub title: String,
    pub slug: Slug,
    pub content: String,
    pub summary: Option<String>,
    pub published: bool,
}

impl BlogPostForm {
    /// A blank form for a new post.
    #[must_use]
    pub fn new_post() -> Self {
        Self {
            published: true,
            ..Self::default()
        }
    }

    /// Check every field and derive the slug.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages if any field is invalid.
    pub fn validate(&self) -> Result<BlogPostInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = self.title.trim();
        if !(TITLE_MIN..=TITLE_MAX).contains(&char_len(title)) {
            errors.add(
                "title",
                format!("O título deve ter entre {TITLE_MIN} e {TITLE_MAX} caracteres."),
            );
        }

        let content = self.content.trim();
        if content.is_empty() {
            errors.add("content", "O conteúdo é obrigatório.");
        }

        let summary = self.summary.trim();
        if char_len(summary) > SUMMARY_MAX {
            errors.add(
                "summary",
                format!("O resumo deve ter no máximo {SUMMARY_MAX} caracteres."),
            );
        }

        let source = if self.slug.trim().is_empty() {
            title
        } else {
            self.slug.trim()
        };
        let slug = Slug::from_text(source)
            .inspect_err(|_| {
                errors.add(
                    "slug",
                    "Não foi possível gerar um slug válido. Use letras ou números.",
                );
            })
            .ok();

        check_image(&mut errors, self.image_name.as_deref());

        match slug {
            Some(slug) => errors.into_result(BlogPostInput {
                title: title.to_string(),
                slug,
                content: content.to_string(),
                summary: (!summary.is_empty()).then(|| summary.to_string()),
                published: self.published,
            }),
            None => Err(errors),
        }
    }
}

impl From<&BlogPost> for BlogPostForm {
    fn from(post: &BlogPost) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.to_string(),
            content: post.content.clone(),
            summary: post.summary.clone().unwrap_or_default(),
            published: post.published,
            image_name: None,
        }
    }
}

impl BlogPostInput {
    fn into_fields(self, image: Option<String>) -> BlogPostFields {
        BlogPostFields {
            title: self.title,
            slug: self.slug,
            content: self.content,
            summary: self.summary,
            image,
            published: self.published,
        }
    }
}

/// Parse the `?page=` query value. Anything invalid or below 1 is page 1.
#[must_use]
pub fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

/// One page of a listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub page: i64,
    /// At least 1, even when there are no items.
    pub total_pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    /// Number of pages needed for `total` items.
    #[must_use]
    pub const fn page_count(total: i64, per_page: i64) -> i64 {
        if total <= 0 {
            1
        } else {
            (total + per_page - 1) / per_page
        }
    }

    #[must_use]
    pub const fn prev_page(&self) -> i64 {
        self.page - 1
    }

    #[must_use]
    pub const fn next_page(&self) -> i64 {
        self.page + 1
    }
}

/// A published article with what its page shows around it.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: BlogPost,
    /// Username of the author, when the account still exists.
    pub author: Option<String>,
    pub recent: Vec<BlogPost>,
}

/// Blog CRUD with slug uniqueness and image lifecycle.
pub struct BlogService<'a> {
    posts: &'a dyn BlogPostRepository,
    users: &'a dyn UserRepository,
    images: &'a ImageStore,
}

impl<'a> BlogService<'a> {
    #[must_use]
    pub const fn new(
        posts: &'a dyn BlogPostRepository,
        users: &'a dyn UserRepository,
        images: &'a ImageStore,
    ) -> Self {
        Self {
            posts,
            users,
            images,
        }
    }

    /// Published posts for `requested` page, clamped to the last page.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn list_published(&self, requested: i64) -> Result<Page<BlogPost>, BlogError> {
        let total = self.posts.count_published().await?;
        let total_pages = Page::<BlogPost>::page_count(total, PER_PAGE);
        let page = requested.clamp(1, total_pages);

        let items = self
            .posts
            .list_published(PER_PAGE, (page - 1) * PER_PAGE)
            .await?;

        Ok(Page {
            items,
            page,
            total_pages,
            has_prev: page > 1,
            has_next: page < total_pages,
        })
    }

    /// Every post, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn list_all(&self) -> Result<Vec<BlogPost>, BlogError> {
        Ok(self.posts.list_all().await?)
    }

    /// # Errors
    ///
    /// Returns `BlogError::NotFound` for an unknown ID.
    pub async fn find(&self, id: BlogPostId) -> Result<BlogPost, BlogError> {
        self.posts.find(id).await?.ok_or(BlogError::NotFound)
    }

    /// A published post by slug, with its author and other recent posts.
    ///
    /// # Errors
    ///
    /// Returns `BlogError::NotFound` when the slug is unknown or the post is
    /// not published.
    pub async fn published_detail(&self, slug: &str) -> Result<PostDetail, BlogError> {
        let slug = Slug::parse(slug).map_err(|_| BlogError::NotFound)?;
        let post = self
            .posts
            .find_by_slug(&slug)
            .await?
            .filter(|post| post.published)
            .ok_or(BlogError::NotFound)?;

        let author = match post.author_id {
            Some(id) => self.users.find(id).await?.map(|user| user.username),
            None => None,
        };
        let recent = self
            .posts
            .list_recent_published(post.id, RECENT_POSTS)
            .await?;

        Ok(PostDetail {
            post,
            author,
            recent,
        })
    }

    /// Store the image (if any), then insert the row.
    ///
    /// # Errors
    ///
    /// Returns `BlogError::SlugTaken` if another post uses the slug; no image
    /// is stored in that case.
    pub async fn create(
        &self,
        input: BlogPostInput,
        author_id: Option<UserId>,
        image: Option<&ImageUpload>,
    ) -> Result<BlogPost, BlogError> {
        if self.posts.slug_exists(&input.slug, None).await? {
            return Err(BlogError::SlugTaken(input.slug));
        }

        let stored = match image {
            Some(upload) => Some(self.images.save(upload).await?),
            None => None,
        };

        let slug = input.slug.clone();
        match self
            .posts
            .create(&input.into_fields(stored.clone()), author_id)
            .await
        {
            Ok(post) => {
                tracing::info!(post_id = %post.id, slug = %post.slug, "Created blog post");
                Ok(post)
            }
            Err(e) => {
                if let Some(file) = stored {
                    self.images.remove_quietly(&file).await;
                }
                Err(conflict_to_slug_taken(e, slug))
            }
        }
    }

    /// Replace the editable fields, and the image when a new one is given.
    ///
    /// # Errors
    ///
    /// Returns `BlogError::NotFound` for an unknown ID and
    /// `BlogError::SlugTaken` if the new slug belongs to another post.
    pub async fn update(
        &self,
        id: BlogPostId,
        input: BlogPostInput,
        image: Option<&ImageUpload>,
    ) -> Result<BlogPost, BlogError> {
        let existing = self.find(id).await?;

        if input.slug != existing.slug && self.posts.slug_exists(&input.slug, Some(id)).await? {
            return Err(BlogError::SlugTaken(input.slug));
        }

        let stored = match image {
            Some(upload) => Some(self.images.save(upload).await?),
            None => None,
        };
        let image_column = stored.clone().or_else(|| existing.image.clone());

        let slug = input.slug.clone();
        match self
            .posts
            .update(id, &input.into_fields(image_column))
            .await
        {
            Ok(post) => {
                if stored.is_some()
                    && let Some(old) = &existing.image
                {
                    self.images.remove_quietly(old).await;
                }
                tracing::info!(post_id = %post.id, slug = %post.slug, "Updated blog post");
                Ok(post)
            }
            Err(e) => {
                if let Some(file) = stored {
                    self.images.remove_quietly(&file).await;
                }
                Err(conflict_to_slug_taken(e, slug))
            }
        }
    }

    /// Delete the row, then its image. A missing image file is only logged.
    ///
    /// # Errors
    ///
    /// Returns `BlogError::NotFound` for an unknown ID.
    pub async fn delete(&self, id: BlogPostId) -> Result<BlogPost, BlogError> {
        let post = self.posts.delete(id).await?;
        if let Some(file) = &post.image {
            self.images.remove_quietly(file).await;
        }
        tracing::info!(post_id = %post.id, "Deleted blog post");
        Ok(post)
    }
}

fn conflict_to_slug_taken(err: RepositoryError, slug: Slug) -> BlogError {
    match err {
        RepositoryError::Conflict(_) => BlogError::SlugTaken(slug),
        other => other.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::memory::{MemoryBlogPostRepository, MemoryUserRepository};
    use crate::models::NewUser;

    fn form(title: &str) -> BlogPostForm {
        BlogPostForm {
            title: title.to_string(),
            content: "Conteúdo do artigo".to_string(),
            published: true,
            ..BlogPostForm::default()
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        images: ImageStore,
        posts: MemoryBlogPostRepository,
        users: MemoryUserRepository,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let images = ImageStore::new(dir.path());
            Self {
                _dir: dir,
                images,
                posts: MemoryBlogPostRepository::default(),
                users: MemoryUserRepository::default(),
            }
        }

        fn service(&self) -> BlogService<'_> {
            BlogService::new(&self.posts, &self.users, &self.images)
        }
    }

    #[test]
    fn test_validate_derives_slug_from_title() {
        let input = form("Olá, Mundo! 123").validate().unwrap();
        assert_eq!(input.slug.as_str(), "ola-mundo-123");
        assert_eq!(input.summary, None);
    }

    #[test]
    fn test_validate_normalizes_explicit_slug() {
        let mut f = form("Título qualquer");
        f.slug = "  Meu Slug Ção ".to_string();
        assert_eq!(f.validate().unwrap().slug.as_str(), "meu-slug-cao");
    }

    #[test]
    fn test_validate_errors() {
        let errors = BlogPostForm {
            title: "ab".to_string(),
            slug: "???".to_string(),
            content: String::new(),
            summary: "x".repeat(301),
            published: false,
            image_name: Some("a.bmp".to_string()),
        }
        .validate()
        .unwrap_err();

        for field in ["title", "slug", "content", "summary", "image"] {
            assert!(errors.has(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("3")), 3);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("-2")), 1);
        assert_eq!(parse_page(Some("abc")), 1);
    }

    #[test]
    fn test_page_count() {
        assert_eq!(Page::<()>::page_count(0, 6), 1);
        assert_eq!(Page::<()>::page_count(6, 6), 1);
        assert_eq!(Page::<()>::page_count(7, 6), 2);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let fx = Fixture::new();
        let blog = fx.service();

        blog.create(form("Olá Mundo").validate().unwrap(), None, None)
            .await
            .unwrap();
        let result = blog
            .create(form("Ola, mundo!").validate().unwrap(), None, None)
            .await;

        assert!(matches!(result, Err(BlogError::SlugTaken(_))));
        assert_eq!(fx.posts.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_slug_collision_excludes_self() {
        let fx = Fixture::new();
        let blog = fx.service();

        let first = blog
            .create(form("Primeiro post").validate().unwrap(), None, None)
            .await
            .unwrap();
        blog.create(form("Segundo post").validate().unwrap(), None, None)
            .await
            .unwrap();

        // Keeping its own slug is fine.
        let mut same = form("Primeiro post");
        same.content = "Editado".to_string();
        blog.update(first.id, same.validate().unwrap(), None)
            .await
            .unwrap();

        let result = blog
            .update(first.id, form("Segundo post").validate().unwrap(), None)
            .await;
        assert!(matches!(result, Err(BlogError::SlugTaken(_))));
    }

    #[tokio::test]
    async fn test_pagination_clamps_to_last_page() {
        let fx = Fixture::new();
        let blog = fx.service();
        for i in 0..8 {
            blog.create(form(&format!("Post número {i}")).validate().unwrap(), None, None)
                .await
                .unwrap();
        }
        let mut draft = form("Rascunho");
        draft.published = false;
        blog.create(draft.validate().unwrap(), None, None)
            .await
            .unwrap();

        let first = blog.list_published(1).await.unwrap();
        assert_eq!(first.items.len(), 6);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next && !first.has_prev);

        let clamped = blog.list_published(50).await.unwrap();
        assert_eq!(clamped.page, 2);
        assert_eq!(clamped.items.len(), 2);
        assert!(clamped.items.iter().all(|post| post.published));
    }

    #[tokio::test]
    async fn test_empty_listing_has_one_page() {
        let fx = Fixture::new();
        let page = fx.service().list_published(3).await.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_published_detail() {
        let fx = Fixture::new();
        let author = fx
            .users
            .create(NewUser {
                username: "fabio".to_string(),
                password_hash: "x".to_string(),
                is_admin: true,
            })
            .await
            .unwrap();
        let blog = fx.service();

        let post = blog
            .create(form("Aterramento").validate().unwrap(), Some(author.id), None)
            .await
            .unwrap();
        for title in ["Tomadas", "Disjuntores", "Quadros", "Fiação"] {
            blog.create(form(title).validate().unwrap(), None, None)
                .await
                .unwrap();
        }

        let detail = blog.published_detail(post.slug.as_str()).await.unwrap();
        assert_eq!(detail.author.as_deref(), Some("fabio"));
        assert_eq!(detail.recent.len(), 3);
        assert!(detail.recent.iter().all(|p| p.id != post.id));

        assert!(matches!(
            blog.published_detail("nao-existe").await,
            Err(BlogError::NotFound)
        ));
        assert!(matches!(
            blog.published_detail("Not A Slug").await,
            Err(BlogError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_unpublished_detail_is_not_found() {
        let fx = Fixture::new();
        let blog = fx.service();
        let mut draft = form("Rascunho secreto");
        draft.published = false;
        let post = blog.create(draft.validate().unwrap(), None, None).await.unwrap();

        assert!(matches!(
            blog.published_detail(post.slug.as_str()).await,
            Err(BlogError::NotFound)
        ));
    }
}
