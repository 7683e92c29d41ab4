//! Catalog product.

use chrono::{DateTime, Utc};

use eletromcz_core::{Price, ProductId};

/// A product listed in the shop.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Previous price, shown struck through when higher than `price`.
    pub old_price: Option<Price>,
    /// File name under the upload directory.
    pub image: Option<String>,
    /// Hidden from `/loja` when false.
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// The old price, only when it is actually a discount.
    #[must_use]
    pub fn discounted_from(&self) -> Option<Price> {
        self.old_price.filter(|old| *old > self.price)
    }

    /// The editable columns of this product.
    #[must_use]
    pub fn fields(&self) -> ProductFields {
        ProductFields {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            old_price: self.old_price,
            image: self.image.clone(),
            active: self.active,
        }
    }
}

/// Columns written on insert and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub old_price: Option<Price>,
    pub image: Option<String>,
    pub active: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(price: &str, old_price: Option<&str>) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Disjuntor 32A".to_string(),
            description: "Disjuntor bipolar".to_string(),
            price: Price::parse(price).unwrap(),
            old_price: old_price.map(|p| Price::parse(p).unwrap()),
            image: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_discounted_from_only_when_higher() {
        assert!(product("50", Some("60")).discounted_from().is_some());
        assert!(product("50", Some("50")).discounted_from().is_none());
        assert!(product("50", Some("40")).discounted_from().is_none());
        assert!(product("50", None).discounted_from().is_none());
    }
}
