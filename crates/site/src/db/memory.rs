//! In-memory repositories.
//!
//! Rows live in `Vec`s guarded by `tokio::sync::RwLock`. Nothing is durable:
//! all state is lost on restart. Unique constraints (`users.username`,
//! `blog_posts.slug`) are enforced under the write lock, so they hold for
//! concurrent writers within one process.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use eletromcz_core::{BlogPostId, ProductId, Slug, UserId};

use super::{BlogPostRepository, ProductRepository, RepositoryError, UserRepository};
use crate::models::{BlogPost, BlogPostFields, NewUser, Product, ProductFields, User};

/// Rows plus the next `SERIAL` value.
#[derive(Debug)]
struct Table<T> {
    next_id: i32,
    rows: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn count_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn to_usize(value: i64) -> usize {
    usize::try_from(value.max(0)).unwrap_or(usize::MAX)
}

// =============================================================================
// Users
// =============================================================================

/// Users kept in process memory.
#[derive(Default)]
pub struct MemoryUserRepository {
    table: RwLock<Table<User>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|u| u.username == username).cloned())
    }

    async fn find(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut table = self.table.write().await;
        if table.rows.iter().any(|u| u.username == user.username) {
            return Err(RepositoryError::Conflict(
                "username already exists".to_owned(),
            ));
        }

        let created = User {
            id: UserId::new(table.allocate_id()),
            username: user.username,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
            created_at: Utc::now(),
        };
        table.rows.push(created.clone());
        Ok(created)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(count_i64(self.table.read().await.rows.len()))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

// =============================================================================
// Products
// =============================================================================

/// Products kept in process memory.
#[derive(Default)]
pub struct MemoryProductRepository {
    table: RwLock<Table<Product>>,
}

fn newest_products_first(rows: &mut [Product]) {
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let table = self.table.read().await;
        let mut products: Vec<Product> = table.rows.iter().filter(|p| p.active).cloned().collect();
        newest_products_first(&mut products);
        Ok(products)
    }

    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let mut products = self.table.read().await.rows.clone();
        newest_products_first(&mut products);
        Ok(products)
    }

    async fn find(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, fields: &ProductFields) -> Result<Product, RepositoryError> {
        let mut table = self.table.write().await;
        let product = Product {
            id: ProductId::new(table.allocate_id()),
            name: fields.name.clone(),
            description: fields.description.clone(),
            price: fields.price,
            old_price: fields.old_price,
            image: fields.image.clone(),
            active: fields.active,
            created_at: Utc::now(),
        };
        table.rows.push(product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        id: ProductId,
        fields: &ProductFields,
    ) -> Result<Product, RepositoryError> {
        let mut table = self.table.write().await;
        let product = table
            .rows
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;

        product.name.clone_from(&fields.name);
        product.description.clone_from(&fields.description);
        product.price = fields.price;
        product.old_price = fields.old_price;
        product.image.clone_from(&fields.image);
        product.active = fields.active;
        Ok(product.clone())
    }

    async fn delete(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let mut table = self.table.write().await;
        let index = table
            .rows
            .iter()
            .position(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        Ok(table.rows.remove(index))
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(count_i64(self.table.read().await.rows.len()))
    }

    async fn count_active(&self) -> Result<i64, RepositoryError> {
        let table = self.table.read().await;
        Ok(count_i64(table.rows.iter().filter(|p| p.active).count()))
    }
}

// =============================================================================
// Blog posts
// =============================================================================

/// Blog posts kept in process memory.
#[derive(Default)]
pub struct MemoryBlogPostRepository {
    table: RwLock<Table<BlogPost>>,
}

fn newest_posts_first(rows: &mut [BlogPost]) {
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn slug_taken(rows: &[BlogPost], slug: &Slug, exclude: Option<BlogPostId>) -> bool {
    rows.iter()
        .any(|p| &p.slug == slug && Some(p.id) != exclude)
}

#[async_trait]
impl BlogPostRepository for MemoryBlogPostRepository {
    async fn list_published(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BlogPost>, RepositoryError> {
        let mut posts: Vec<BlogPost> = self
            .table
            .read()
            .await
            .rows
            .iter()
            .filter(|p| p.published)
            .cloned()
            .collect();
        newest_posts_first(&mut posts);
        Ok(posts
            .into_iter()
            .skip(to_usize(offset))
            .take(to_usize(limit))
            .collect())
    }

    async fn list_recent_published(
        &self,
        exclude: BlogPostId,
        limit: i64,
    ) -> Result<Vec<BlogPost>, RepositoryError> {
        let mut posts: Vec<BlogPost> = self
            .table
            .read()
            .await
            .rows
            .iter()
            .filter(|p| p.published && p.id != exclude)
            .cloned()
            .collect();
        newest_posts_first(&mut posts);
        posts.truncate(to_usize(limit));
        Ok(posts)
    }

    async fn list_all(&self) -> Result<Vec<BlogPost>, RepositoryError> {
        let mut posts = self.table.read().await.rows.clone();
        newest_posts_first(&mut posts);
        Ok(posts)
    }

    async fn find(&self, id: BlogPostId) -> Result<Option<BlogPost>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<BlogPost>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|p| &p.slug == slug).cloned())
    }

    async fn slug_exists(
        &self,
        slug: &Slug,
        exclude: Option<BlogPostId>,
    ) -> Result<bool, RepositoryError> {
        Ok(slug_taken(&self.table.read().await.rows, slug, exclude))
    }

    async fn create(
        &self,
        fields: &BlogPostFields,
        author_id: Option<UserId>,
    ) -> Result<BlogPost, RepositoryError> {
        let mut table = self.table.write().await;
        if slug_taken(&table.rows, &fields.slug, None) {
            return Err(RepositoryError::Conflict("slug already exists".to_owned()));
        }

        let now = Utc::now();
        let post = BlogPost {
            id: BlogPostId::new(table.allocate_id()),
            title: fields.title.clone(),
            slug: fields.slug.clone(),
            content: fields.content.clone(),
            summary: fields.summary.clone(),
            image: fields.image.clone(),
            published: fields.published,
            author_id,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(post.clone());
        Ok(post)
    }

    async fn update(
        &self,
        id: BlogPostId,
        fields: &BlogPostFields,
    ) -> Result<BlogPost, RepositoryError> {
        let mut table = self.table.write().await;
        if slug_taken(&table.rows, &fields.slug, Some(id)) {
            return Err(RepositoryError::Conflict("slug already exists".to_owned()));
        }

        let post = table
            .rows
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;

        post.title.clone_from(&fields.title);
        post.slug = fields.slug.clone();
        post.content.clone_from(&fields.content);
        post.summary.clone_from(&fields.summary);
        post.image.clone_from(&fields.image);
        post.published = fields.published;
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn delete(&self, id: BlogPostId) -> Result<BlogPost, RepositoryError> {
        let mut table = self.table.write().await;
        let index = table
            .rows
            .iter()
            .position(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        Ok(table.rows.remove(index))
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(count_i64(self.table.read().await.rows.len()))
    }

    async fn count_published(&self) -> Result<i64, RepositoryError> {
        let table = self.table.read().await;
        Ok(count_i64(table.rows.iter().filter(|p| p.published).count()))
    }
}
