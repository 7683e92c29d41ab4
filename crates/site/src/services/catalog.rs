//! Product catalog management.
//!
//! Writes go row-first or file-first depending on which side is easier to
//! undo: a new image is written before the row and removed again if the row
//! write fails; an old image is removed only after the row no longer
//! references it.

use rust_decimal::Decimal;
use thiserror::Error;

use eletromcz_core::{Price, ProductId};

use crate::db::{ProductRepository, RepositoryError};
use crate::models::{Product, ProductFields};
use crate::services::uploads::{ImageError, ImageStore, ImageUpload};
use crate::services::validation::{FieldErrors, char_len, check_image};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 100;

const PRICE_MESSAGE: &str = "Informe um preço válido (ex.: 199,90).";
const PRICE_TOO_HIGH: &str = "O preço deve ser menor que R$ 100.000.000,00.";

/// Largest amount the `NUMERIC(10, 2)` price columns hold.
fn max_price() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Parse a price field, recording a message on `field` when it is invalid.
fn parse_price(errors: &mut FieldErrors, field: &'static str, raw: &str) -> Option<Price> {
    match Price::parse(raw) {
        Ok(price) if price.amount() > max_price() => {
            errors.add(field, PRICE_TOO_HIGH);
            None
        }
        Ok(price) => Some(price),
        Err(_) => {
            errors.add(field, PRICE_MESSAGE);
            None
        }
    }
}

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("product not found")]
    NotFound,

    #[error("image error: {0}")]
    Image(#[from] ImageError),

    #[error("repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CatalogError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// Product form as submitted, kept verbatim for re-rendering.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub old_price: String,
    pub active: bool,
    /// Original file name of the uploaded image, if one was sent.
    pub image_name: Option<String>,
}

/// Validated product fields, without the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub old_price: Option<Price>,
    pub active: bool,
}

impl ProductForm {
    /// A blank form for a new product.
    #[must_use]
    pub fn new_product() -> Self {
        Self {
            active: true,
            ..Self::default()
        }
    }

    /// Check every field and collect all problems.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages if any field is invalid.
    pub fn validate(&self) -> Result<ProductInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if !(NAME_MIN..=NAME_MAX).contains(&char_len(name)) {
            errors.add(
                "name",
                format!("O nome deve ter entre {NAME_MIN} e {NAME_MAX} caracteres."),
            );
        }

        let description = self.description.trim();
        if description.is_empty() {
            errors.add("description", "A descrição é obrigatória.");
        }

        let price = parse_price(&mut errors, "price", &self.price);

        let old_price = if self.old_price.trim().is_empty() {
            None
        } else {
            parse_price(&mut errors, "old_price", &self.old_price)
        };

        check_image(&mut errors, self.image_name.as_deref());

        match price {
            Some(price) => errors.into_result(ProductInput {
                name: name.to_string(),
                description: description.to_string(),
                price,
                old_price,
                active: self.active,
            }),
            None => Err(errors),
        }
    }
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_form_value(),
            old_price: product
                .old_price
                .map(|p| p.to_form_value())
                .unwrap_or_default(),
            active: product.active,
            image_name: None,
        }
    }
}

impl ProductInput {
    fn into_fields(self, image: Option<String>) -> ProductFields {
        ProductFields {
            name: self.name,
            description: self.description,
            price: self.price,
            old_price: self.old_price,
            image,
            active: self.active,
        }
    }
}

/// Product CRUD with image lifecycle.
pub struct CatalogService<'a> {
    products: &'a dyn ProductRepository,
    images: &'a ImageStore,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(products: &'a dyn ProductRepository, images: &'a ImageStore) -> Self {
        Self { products, images }
    }

    /// Products visible in the shop, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn list_active(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list_active().await?)
    }

    /// Every product, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list_all().await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown ID.
    pub async fn find(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.products.find(id).await?.ok_or(CatalogError::NotFound)
    }

    /// Store the image (if any), then insert the row.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be stored or the insert fails; in
    /// the latter case the stored image is removed again.
    pub async fn create(
        &self,
        input: ProductInput,
        image: Option<&ImageUpload>,
    ) -> Result<Product, CatalogError> {
        let stored = match image {
            Some(upload) => Some(self.images.save(upload).await?),
            None => None,
        };

        match self
            .products
            .create(&input.into_fields(stored.clone()))
            .await
        {
            Ok(product) => {
                tracing::info!(product_id = %product.id, name = %product.name, "Created product");
                Ok(product)
            }
            Err(e) => {
                if let Some(file) = stored {
                    self.images.remove_quietly(&file).await;
                }
                Err(e.into())
            }
        }
    }

    /// Replace the editable fields, and the image when a new one is given.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown ID, or an error if the
    /// image cannot be stored or the update fails.
    pub async fn update(
        &self,
        id: ProductId,
        input: ProductInput,
        image: Option<&ImageUpload>,
    ) -> Result<Product, CatalogError> {
        let existing = self.find(id).await?;

        let stored = match image {
            Some(upload) => Some(self.images.save(upload).await?),
            None => None,
        };
        let image_column = stored.clone().or_else(|| existing.image.clone());

        match self
            .products
            .update(id, &input.into_fields(image_column))
            .await
        {
            Ok(product) => {
                if stored.is_some()
                    && let Some(old) = &existing.image
                {
                    self.images.remove_quietly(old).await;
                }
                tracing::info!(product_id = %product.id, "Updated product");
                Ok(product)
            }
            Err(e) => {
                if let Some(file) = stored {
                    self.images.remove_quietly(&file).await;
                }
                Err(e.into())
            }
        }
    }

    /// Delete the row, then its image. A missing image file is only logged.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown ID.
    pub async fn delete(&self, id: ProductId) -> Result<Product, CatalogError> {
        let product = self.products.delete(id).await?;
        if let Some(file) = &product.image {
            self.images.remove_quietly(file).await;
        }
        tracing::info!(product_id = %product.id, "Deleted product");
        Ok(product)
    }
}
