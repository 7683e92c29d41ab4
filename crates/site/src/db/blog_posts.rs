//! `PostgreSQL` blog post repository.

use async_trait::async_trait;
use sqlx::PgPool;

use eletromcz_core::{BlogPostId, Slug, UserId};

use super::{BlogPostRepository, RepositoryError};
use crate::models::{BlogPost, BlogPostFields};

const POST_COLUMNS: &str = "id, title, slug, content, summary, image, published, author_id, \
                            created_at, updated_at";

const SLUG_CONFLICT: &str = "slug already exists";

/// Posts stored in the `blog_posts` table.
#[derive(Clone)]
pub struct PgBlogPostRepository {
    pool: PgPool,
}

impl PgBlogPostRepository {
    /// Create a new blog post repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlogPostRepository for PgBlogPostRepository {
    async fn list_published(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BlogPost>, RepositoryError> {
        let posts = sqlx::query_as::<_, BlogPost>(&format!(
            r"
            SELECT {POST_COLUMNS} FROM blog_posts
            WHERE published
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn list_recent_published(
        &self,
        exclude: BlogPostId,
        limit: i64,
    ) -> Result<Vec<BlogPost>, RepositoryError> {
        let posts = sqlx::query_as::<_, BlogPost>(&format!(
            r"
            SELECT {POST_COLUMNS} FROM blog_posts
            WHERE published AND id <> $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "
        ))
        .bind(exclude.as_i32())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn list_all(&self) -> Result<Vec<BlogPost>, RepositoryError> {
        let posts = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn find(&self, id: BlogPostId) -> Result<Option<BlogPost>, RepositoryError> {
        let post = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<BlogPost>, RepositoryError> {
        let post = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts WHERE slug = $1"
        ))
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn slug_exists(
        &self,
        slug: &Slug,
        exclude: Option<BlogPostId>,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(
                SELECT 1 FROM blog_posts
                WHERE slug = $1 AND ($2::INTEGER IS NULL OR id <> $2)
            )
            ",
        )
        .bind(slug.as_str())
        .bind(exclude.map(|id| id.as_i32()))
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create(
        &self,
        fields: &BlogPostFields,
        author_id: Option<UserId>,
    ) -> Result<BlogPost, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let post = sqlx::query_as::<_, BlogPost>(&format!(
            r"
            INSERT INTO blog_posts (title, slug, content, summary, image, published, author_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(&fields.title)
        .bind(fields.slug.as_str())
        .bind(&fields.content)
        .bind(fields.summary.as_deref())
        .bind(fields.image.as_deref())
        .bind(fields.published)
        .bind(author_id.map(|id| id.as_i32()))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, SLUG_CONFLICT))?;

        tx.commit().await?;
        Ok(post)
    }

    async fn update(
        &self,
        id: BlogPostId,
        fields: &BlogPostFields,
    ) -> Result<BlogPost, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let post = sqlx::query_as::<_, BlogPost>(&format!(
            r"
            UPDATE blog_posts
            SET title = $2, slug = $3, content = $4, summary = $5, image = $6,
                published = $7, updated_at = now()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(id.as_i32())
        .bind(&fields.title)
        .bind(fields.slug.as_str())
        .bind(&fields.content)
        .bind(fields.summary.as_deref())
        .bind(fields.image.as_deref())
        .bind(fields.published)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, SLUG_CONFLICT))?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(post)
    }

    async fn delete(&self, id: BlogPostId) -> Result<BlogPost, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let post = sqlx::query_as::<_, BlogPost>(&format!(
            "DELETE FROM blog_posts WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id.as_i32())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(post)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM blog_posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_published(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM blog_posts WHERE published")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
