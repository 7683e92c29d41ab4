//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::SiteConfig;
use crate::db::{BlogPostRepository, ProductRepository, Repositories, UserRepository};
use crate::services::blog::BlogService;
use crate::services::catalog::CatalogService;
use crate::services::email::Mailer;
use crate::services::reviews::ReviewCache;
use crate::services::uploads::ImageStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Every external dependency
/// (repositories, mailer, review provider) is injected, so tests build it
/// from in-memory parts.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    repos: Repositories,
    images: ImageStore,
    reviews: ReviewCache,
    mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: SiteConfig,
        repos: Repositories,
        mailer: Arc<dyn Mailer>,
        reviews: ReviewCache,
    ) -> Self {
        let images = ImageStore::new(config.uploads.dir.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                repos,
                images,
                reviews,
                mailer,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserRepository {
        self.inner.repos.users.as_ref()
    }

    #[must_use]
    pub fn products(&self) -> &dyn ProductRepository {
        self.inner.repos.products.as_ref()
    }

    #[must_use]
    pub fn blog_posts(&self) -> &dyn BlogPostRepository {
        self.inner.repos.blog_posts.as_ref()
    }

    /// Get a reference to the uploaded image store.
    #[must_use]
    pub fn images(&self) -> &ImageStore {
        &self.inner.images
    }

    /// Get a reference to the review cache.
    #[must_use]
    pub fn reviews(&self) -> &ReviewCache {
        &self.inner.reviews
    }

    #[must_use]
    pub fn mailer(&self) -> &dyn Mailer {
        self.inner.mailer.as_ref()
    }

    /// Product operations bound to this state.
    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self.products(), self.images())
    }

    /// Blog operations bound to this state.
    #[must_use]
    pub fn blog(&self) -> BlogService<'_> {
        BlogService::new(self.blog_posts(), self.users(), self.images())
    }
}
