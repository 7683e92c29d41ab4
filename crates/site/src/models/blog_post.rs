//! Blog post.

use chrono::{DateTime, Utc};

use eletromcz_core::{BlogPostId, Slug, UserId};

/// A blog article.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BlogPost {
    pub id: BlogPostId,
    pub title: String,
    /// Unique across all posts.
    pub slug: Slug,
    pub content: String,
    pub summary: Option<String>,
    /// File name under the upload directory.
    pub image: Option<String>,
    /// Unpublished posts are only visible in the admin panel.
    pub published: bool,
    /// `None` once the author account is gone.
    pub author_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    /// The editable columns of this post.
    #[must_use]
    pub fn fields(&self) -> BlogPostFields {
        BlogPostFields {
            title: self.title.clone(),
            slug: self.slug.clone(),
            content: self.content.clone(),
            summary: self.summary.clone(),
            image: self.image.clone(),
            published: self.published,
        }
    }
}

/// Columns written on insert and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogPostFields {
    pub title: String,
    pub slug: Slug,
    pub content: String,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub published: bool,
}
